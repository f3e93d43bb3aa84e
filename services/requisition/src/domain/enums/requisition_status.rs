//! 申请单状态

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown requisition status: {0}")]
pub struct ParseStatusError(pub String);

/// 申请单状态
///
/// 声明顺序即工作流顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequisitionStatus {
    /// 已发起
    Initiated,
    /// 已驳回
    Rejected,
    /// 已提交
    Submitted,
    /// 已授权
    Authorized,
    /// 审批中（多级审批）
    InApproval,
    /// 已批准
    Approved,
    /// 已转订单
    Released,
    /// 已跳过
    Skipped,
}

impl RequisitionStatus {
    pub const ALL: [RequisitionStatus; 8] = [
        Self::Initiated,
        Self::Rejected,
        Self::Submitted,
        Self::Authorized,
        Self::InApproval,
        Self::Approved,
        Self::Released,
        Self::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::Rejected => "REJECTED",
            Self::Submitted => "SUBMITTED",
            Self::Authorized => "AUTHORIZED",
            Self::InApproval => "IN_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Released => "RELEASED",
            Self::Skipped => "SKIPPED",
        }
    }

    /// 允许的目标状态
    pub fn allowed_targets(&self) -> &'static [RequisitionStatus] {
        match self {
            Self::Initiated | Self::Rejected => &[Self::Submitted, Self::Skipped],
            Self::Submitted => &[Self::Authorized, Self::Rejected],
            Self::Authorized => &[Self::InApproval, Self::Approved, Self::Rejected],
            Self::InApproval => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Released],
            Self::Released | Self::Skipped => &[],
        }
    }

    /// 是否可以转换到目标状态（同状态不可转换）
    pub fn can_transition_to(&self, target: RequisitionStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// 录入阶段（授权之前）
    pub fn is_pre_authorize(&self) -> bool {
        matches!(self, Self::Initiated | Self::Rejected | Self::Submitted)
    }

    /// 是否可提交
    pub fn is_submittable(&self) -> bool {
        matches!(self, Self::Initiated | Self::Rejected)
    }

    /// 审批阶段
    pub fn is_approvable(&self) -> bool {
        matches!(self, Self::Authorized | Self::InApproval)
    }

    /// 订货数量取批准数量
    pub fn uses_approved_quantity(&self) -> bool {
        matches!(
            self,
            Self::Authorized | Self::InApproval | Self::Approved | Self::Released
        )
    }

    /// 行数据是否还能修改
    pub fn is_editable(&self) -> bool {
        self.is_pre_authorize() || self.is_approvable()
    }

    /// 终态，行数据不可变
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Released | Self::Skipped)
    }
}

impl fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequisitionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
