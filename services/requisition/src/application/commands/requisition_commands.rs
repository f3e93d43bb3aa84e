//! 申请单命令

use chrono::NaiveDate;
use lmis_common::UserId;
use lmis_errors::{AppError, AppResult};

use crate::domain::entities::LineItemUpdate;
use crate::domain::enums::RequisitionStatus;
use crate::domain::value_objects::{
    FacilityId, OrderableId, ProcessingPeriodId, ProgramId, RequisitionId, SupervisoryNodeId,
};

/// 驳回原因最大长度
pub const MAX_REASON_LENGTH: usize = 255;

/// 发起申请单命令
#[derive(Debug, Clone)]
pub struct InitiateRequisitionCommand {
    pub facility_id: FacilityId,
    pub program_id: ProgramId,
    pub processing_period_id: ProcessingPeriodId,
    pub supervisory_node_id: Option<SupervisoryNodeId>,
    pub emergency: bool,
    pub user_id: UserId,
}

/// 更新申请单命令
#[derive(Debug, Clone)]
pub struct UpdateRequisitionCommand {
    pub requisition_id: RequisitionId,
    /// 调用方读到的版本
    pub version: i64,
    pub user_id: UserId,
    pub line_items: Vec<LineItemUpdate>,
    /// 新增的非全供应产品
    pub add_non_full_supply_products: Vec<OrderableId>,
    pub draft_status_message: Option<String>,
    pub date_physical_stock_count_completed: Option<NaiveDate>,
}

impl UpdateRequisitionCommand {
    pub fn validate(&self) -> AppResult<()> {
        validate_version(self.version)
    }
}

/// 状态转换命令
#[derive(Debug, Clone)]
pub struct TransitionRequisitionCommand {
    pub requisition_id: RequisitionId,
    pub target: RequisitionStatus,
    pub version: i64,
    pub user_id: UserId,
    /// 仅驳回时可填
    pub reason: Option<String>,
}

impl TransitionRequisitionCommand {
    pub fn validate(&self) -> AppResult<()> {
        validate_version(self.version)?;

        if let Some(reason) = &self.reason {
            if self.target != RequisitionStatus::Rejected {
                return Err(AppError::validation(
                    "A reason can only be given when rejecting a requisition",
                ));
            }
            if reason.chars().count() > MAX_REASON_LENGTH {
                return Err(AppError::validation(format!(
                    "Reason must not exceed {} characters",
                    MAX_REASON_LENGTH
                )));
            }
        }

        Ok(())
    }
}

/// 转订单命令
#[derive(Debug, Clone)]
pub struct ConvertToOrderCommand {
    pub requisition_id: RequisitionId,
    pub supplying_facility_id: FacilityId,
    pub version: i64,
    pub user_id: UserId,
}

impl ConvertToOrderCommand {
    pub fn validate(&self) -> AppResult<()> {
        validate_version(self.version)
    }
}

fn validate_version(version: i64) -> AppResult<()> {
    if version < 1 {
        return Err(AppError::validation("Version must be a positive number"));
    }
    Ok(())
}
