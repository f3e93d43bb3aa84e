//! 校验器

use std::fmt;

use lmis_errors::{AppResult, FieldErrors};

use super::context::ValidationContext;
use super::rules;

/// 申请单校验规则
///
/// 规则无状态，只看未跳过的行，错误按字段键归集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequisitionValidator {
    RequiredFields,
    NonNegativeInputs,
    TotalReceivedQuantity,
    ConsumptionCounterpart,
    StockBalance,
    StockoutDays,
    RequestedQuantity,
    NonFullSupply,
    ApprovedQuantity,
    SupplyingFacility,
    SkipEligibility,
}

impl RequisitionValidator {
    /// 返回业务错误；`Err` 只表示程序故障
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
        match self {
            Self::RequiredFields => rules::required_fields::validate(ctx),
            Self::NonNegativeInputs => rules::non_negative::validate(ctx),
            Self::TotalReceivedQuantity => rules::total_received::validate(ctx),
            Self::ConsumptionCounterpart => rules::consumption::validate(ctx),
            Self::StockBalance => rules::stock_balance::validate(ctx),
            Self::StockoutDays => rules::stockout_days::validate(ctx),
            Self::RequestedQuantity => rules::requested_quantity::validate(ctx),
            Self::NonFullSupply => rules::non_full_supply::validate(ctx),
            Self::ApprovedQuantity => rules::approved_quantity::validate(ctx),
            Self::SupplyingFacility => rules::supplying_facility::validate(ctx),
            Self::SkipEligibility => rules::skip::validate(ctx),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RequiredFields => "required_fields",
            Self::NonNegativeInputs => "non_negative_inputs",
            Self::TotalReceivedQuantity => "total_received_quantity",
            Self::ConsumptionCounterpart => "consumption_counterpart",
            Self::StockBalance => "stock_balance",
            Self::StockoutDays => "stockout_days",
            Self::RequestedQuantity => "requested_quantity",
            Self::NonFullSupply => "non_full_supply",
            Self::ApprovedQuantity => "approved_quantity",
            Self::SupplyingFacility => "supplying_facility",
            Self::SkipEligibility => "skip_eligibility",
        }
    }
}

impl fmt::Display for RequisitionValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
