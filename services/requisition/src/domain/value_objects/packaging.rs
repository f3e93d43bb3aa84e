//! 包装规则

use serde::{Deserialize, Serialize};

/// 包装规则，用于把订货数量换算为包数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingRules {
    /// 每包数量
    pub net_content: i64,
    /// 余数超过该值时多发一包
    pub pack_rounding_threshold: i64,
    /// 不足一包时是否取 0
    pub round_to_zero: bool,
}

impl PackagingRules {
    pub fn new(net_content: i64, pack_rounding_threshold: i64, round_to_zero: bool) -> Self {
        Self {
            net_content,
            pack_rounding_threshold,
            round_to_zero,
        }
    }

    /// 订货数量换算包数
    pub fn packs_to_order(&self, order_quantity: i64) -> i64 {
        if order_quantity <= 0 || self.net_content <= 0 {
            return 0;
        }

        let mut packs = order_quantity / self.net_content;
        let remainder = order_quantity % self.net_content;
        if remainder > 0 && remainder > self.pack_rounding_threshold {
            packs += 1;
        }
        if packs == 0 && !self.round_to_zero {
            packs = 1;
        }
        packs
    }
}

impl Default for PackagingRules {
    fn default() -> Self {
        Self::new(1, 0, false)
    }
}
