//! 请求与响应体

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use lmis_common::UserId;
use lmis_domain_core::{AggregateRoot, Entity, Versioned};
use lmis_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::{
    ConvertToOrderCommand, InitiateRequisitionCommand, SaveRejectionReasonCategoryCommand,
    SaveTemplateCommand, TransitionRequisitionCommand, UpdateRequisitionCommand,
};
use crate::domain::entities::{
    FieldValue, LineItemUpdate, RejectionReasonCategory, Requisition, TemplateColumn,
};
use crate::domain::enums::RequisitionStatus;
use crate::domain::value_objects::{
    ColumnKind, FacilityId, OrderableId, ProcessingPeriodId, ProgramId,
    RejectionReasonCategoryId, RequisitionId, SupervisoryNodeId, TemplateId, column_definition,
};

// ============================================================================
// 申请单
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub facility: FacilityId,
    pub program: ProgramId,
    pub processing_period: ProcessingPeriodId,
    #[serde(default)]
    pub supervisory_node: Option<SupervisoryNodeId>,
    #[serde(default)]
    pub emergency: bool,
}

impl InitiateRequest {
    pub fn into_command(self, user_id: UserId) -> InitiateRequisitionCommand {
        InitiateRequisitionCommand {
            facility_id: self.facility,
            program_id: self.program,
            processing_period_id: self.processing_period,
            supervisory_node_id: self.supervisory_node,
            emergency: self.emergency,
            user_id,
        }
    }
}

/// 单行更新，除 `orderableId` 外的键均为列键
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub orderable_id: OrderableId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl LineItemRequest {
    fn into_update(self) -> AppResult<LineItemUpdate> {
        let mut update = LineItemUpdate::new(self.orderable_id.clone());
        for (key, value) in self.fields {
            let field = field_value(&key, value).ok_or_else(|| {
                AppError::validation(format!(
                    "Invalid value for {} of product {}",
                    key, self.orderable_id
                ))
            })?;
            update.fields.insert(key, field);
        }
        Ok(update)
    }
}

/// 已知列按列类型解析，未知列按 JSON 类型推断，交由模板校验
fn field_value(key: &str, value: Value) -> Option<FieldValue> {
    let kind = column_definition(key).map(|d| d.kind);
    match (kind, value) {
        (Some(ColumnKind::Quantity) | None, Value::Null) => Some(FieldValue::Quantity(None)),
        (Some(ColumnKind::Quantity) | None, Value::Number(n)) => {
            n.as_i64().map(|v| FieldValue::Quantity(Some(v)))
        }
        (Some(ColumnKind::Text), Value::Null) => Some(FieldValue::Text(None)),
        (Some(ColumnKind::Text) | None, Value::String(s)) => Some(FieldValue::Text(Some(s))),
        (Some(ColumnKind::Flag) | None, Value::Bool(b)) => Some(FieldValue::Flag(b)),
        // 只读列保留原值类型，由模板校验拒绝
        (Some(ColumnKind::Money | ColumnKind::Reference), Value::Null) => {
            Some(FieldValue::Quantity(None))
        }
        (Some(ColumnKind::Money | ColumnKind::Reference), Value::Number(n)) => {
            n.as_i64().map(|v| FieldValue::Quantity(Some(v)))
        }
        (Some(ColumnKind::Money | ColumnKind::Reference), Value::String(s)) => {
            Some(FieldValue::Text(Some(s)))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub version: i64,
    #[serde(default)]
    pub requisition_line_items: Vec<LineItemRequest>,
    #[serde(default)]
    pub add_non_full_supply_products: Vec<OrderableId>,
    #[serde(default)]
    pub draft_status_message: Option<String>,
    #[serde(default)]
    pub date_physical_stock_count_completed: Option<NaiveDate>,
}

impl UpdateRequest {
    pub fn into_command(
        self,
        requisition_id: RequisitionId,
        user_id: UserId,
    ) -> AppResult<UpdateRequisitionCommand> {
        Ok(UpdateRequisitionCommand {
            requisition_id,
            version: self.version,
            user_id,
            line_items: self
                .requisition_line_items
                .into_iter()
                .map(LineItemRequest::into_update)
                .collect::<AppResult<_>>()?,
            add_non_full_supply_products: self.add_non_full_supply_products,
            draft_status_message: self.draft_status_message,
            date_physical_stock_count_completed: self.date_physical_stock_count_completed,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub status: RequisitionStatus,
    pub version: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransitionRequest {
    pub fn into_command(
        self,
        requisition_id: RequisitionId,
        user_id: UserId,
    ) -> TransitionRequisitionCommand {
        TransitionRequisitionCommand {
            requisition_id,
            target: self.status,
            version: self.version,
            user_id,
            reason: self.reason,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToOrderRequest {
    pub supplying_facility_id: FacilityId,
    pub version: i64,
}

impl ConvertToOrderRequest {
    pub fn into_command(self, requisition_id: RequisitionId, user_id: UserId) -> ConvertToOrderCommand {
        ConvertToOrderCommand {
            requisition_id,
            supplying_facility_id: self.supplying_facility_id,
            version: self.version,
            user_id,
        }
    }
}

/// 搜索结果摘要
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionSummary {
    pub id: RequisitionId,
    pub facility_id: FacilityId,
    pub program_id: ProgramId,
    pub processing_period_id: ProcessingPeriodId,
    pub status: RequisitionStatus,
    pub emergency: bool,
    pub version: i64,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

impl From<&Requisition> for RequisitionSummary {
    fn from(requisition: &Requisition) -> Self {
        Self {
            id: requisition.id().clone(),
            facility_id: requisition.facility_id().clone(),
            program_id: requisition.program_id().clone(),
            processing_period_id: requisition.processing_period_id().clone(),
            status: requisition.status(),
            emergency: requisition.is_emergency(),
            version: requisition.version(),
            created_date: requisition.audit_info().created_at,
            modified_date: requisition.audit_info().updated_at,
        }
    }
}

// ============================================================================
// 列模板
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub program_id: ProgramId,
    #[serde(default)]
    pub facility_type_code: Option<String>,
    pub number_of_periods_to_average: u32,
    pub columns: Vec<TemplateColumn>,
}

impl TemplateRequest {
    pub fn into_command(self, template_id: TemplateId, user_id: UserId) -> SaveTemplateCommand {
        SaveTemplateCommand {
            template_id,
            program_id: self.program_id,
            facility_type_code: self.facility_type_code,
            number_of_periods_to_average: self.number_of_periods_to_average,
            columns: self.columns,
            user_id,
        }
    }
}

// ============================================================================
// 驳回原因分类
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionReasonCategoryRequest {
    pub name: String,
    pub code: String,
}

impl RejectionReasonCategoryRequest {
    pub fn into_command(
        self,
        category_id: RejectionReasonCategoryId,
        user_id: UserId,
    ) -> SaveRejectionReasonCategoryCommand {
        SaveRejectionReasonCategoryCommand {
            category_id,
            name: self.name,
            code: self.code,
            user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionReasonCategoryDto {
    pub id: RejectionReasonCategoryId,
    pub name: String,
    pub code: String,
}

impl From<&RejectionReasonCategory> for RejectionReasonCategoryDto {
    fn from(category: &RejectionReasonCategory) -> Self {
        Self {
            id: category.id().clone(),
            name: category.name().to_string(),
            code: category.code().to_string(),
        }
    }
}
