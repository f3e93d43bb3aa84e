//! 数据库行与领域对象的转换

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use lmis_common::{AuditInfo, UserId};
use lmis_domain_core::Money;
use lmis_errors::{AppError, AppResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::entities::{
    LineItemParts, RejectionReasonCategory, Requisition, RequisitionLineItem, RequisitionParts, RequisitionTemplate,
    TemplateColumn,
};
use crate::domain::enums::RequisitionStatus;
use crate::domain::value_objects::{
    FacilityId, LineItemId, OrderableId, PackagingRules, ProcessingPeriodId, ProgramId,
    RejectionReasonCategoryId, RequisitionId, StatusChange, SupervisoryNodeId, TemplateId,
};

use super::rows::{
    LineItemRow, RejectionReasonCategoryRow, RequisitionRow, StatusChangeRow, TemplateRow,
};

pub fn build_audit_info(
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
) -> AuditInfo {
    AuditInfo {
        created_at,
        created_by: created_by.map(UserId::from_uuid),
        updated_at,
        updated_by: updated_by.map(UserId::from_uuid),
    }
}

pub fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::internal(format!("JSON 序列化失败: {}", e)))
}

fn from_json<T: DeserializeOwned>(column: &str, value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::database(format!("Invalid JSON in column {}: {}", column, e)))
}

fn parse_status(value: &str) -> AppResult<RequisitionStatus> {
    value
        .parse()
        .map_err(|e| AppError::database(format!("Invalid status in database: {}", e)))
}

/// 将 TemplateRow 转换为 RequisitionTemplate
pub fn template_from_row(row: TemplateRow) -> AppResult<RequisitionTemplate> {
    let columns: Vec<TemplateColumn> = from_json("columns", row.columns)?;
    let periods = u32::try_from(row.number_of_periods_to_average).map_err(|_| {
        AppError::database(format!(
            "Invalid number_of_periods_to_average: {}",
            row.number_of_periods_to_average
        ))
    })?;

    RequisitionTemplate::restore(
        TemplateId::from_uuid(row.id),
        ProgramId::from_uuid(row.program_id),
        row.facility_type_code,
        periods,
        columns,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    )
    .map_err(|e| AppError::database(format!("Stored template {} is invalid: {}", row.id, e)))
}

pub fn rejection_reason_category_from_row(row: RejectionReasonCategoryRow) -> RejectionReasonCategory {
    RejectionReasonCategory::restore(
        RejectionReasonCategoryId::from_uuid(row.id),
        row.name,
        row.code,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    )
}

/// 将 LineItemRow 转换为 RequisitionLineItem
pub fn line_item_from_row(row: LineItemRow) -> AppResult<RequisitionLineItem> {
    let values: BTreeMap<String, i64> = from_json("quantities", row.quantities)?;
    let previous_adjusted_consumptions: Vec<i64> =
        from_json("previous_adjusted_consumptions", row.previous_adjusted_consumptions)?;

    Ok(RequisitionLineItem::restore(LineItemParts {
        id: LineItemId::from_uuid(row.id),
        orderable_id: OrderableId::from_uuid(row.orderable_id),
        values,
        remarks: row.remarks,
        requested_quantity_explanation: row.requested_quantity_explanation,
        price_per_pack: Money::new(row.price_per_pack),
        total_cost: row.total_cost.map(Money::new),
        non_full_supply: row.non_full_supply,
        skipped: row.skipped,
        packaging: PackagingRules::new(
            row.net_content,
            row.pack_rounding_threshold,
            row.round_to_zero,
        ),
        max_periods_of_stock: row.max_periods_of_stock,
        previous_adjusted_consumptions,
    }))
}

pub fn status_change_from_row(row: StatusChangeRow) -> AppResult<StatusChange> {
    Ok(StatusChange::new(
        row.previous_status.as_deref().map(parse_status).transpose()?,
        parse_status(&row.status)?,
        row.author_id.map(UserId::from_uuid),
        row.changed_at,
    ))
}

/// 由主表行、行明细和状态变更组装申请单
pub fn requisition_from_rows(
    row: RequisitionRow,
    line_items: Vec<LineItemRow>,
    status_changes: Vec<StatusChangeRow>,
) -> AppResult<Requisition> {
    let available: BTreeSet<OrderableId> = from_json(
        "available_non_full_supply_products",
        row.available_non_full_supply_products,
    )?;
    let months = u32::try_from(row.number_of_months_in_period).map_err(|_| {
        AppError::database(format!(
            "Invalid number_of_months_in_period: {}",
            row.number_of_months_in_period
        ))
    })?;

    Ok(Requisition::restore(RequisitionParts {
        id: RequisitionId::from_uuid(row.id),
        facility_id: FacilityId::from_uuid(row.facility_id),
        program_id: ProgramId::from_uuid(row.program_id),
        processing_period_id: ProcessingPeriodId::from_uuid(row.processing_period_id),
        supervisory_node_id: row.supervisory_node_id.map(SupervisoryNodeId::from_uuid),
        supplying_facility_id: row.supplying_facility_id.map(FacilityId::from_uuid),
        template_id: TemplateId::from_uuid(row.template_id),
        status: parse_status(&row.status)?,
        emergency: row.emergency,
        number_of_months_in_period: months,
        draft_status_message: row.draft_status_message,
        date_physical_stock_count_completed: row.date_physical_stock_count_completed,
        line_items: line_items
            .into_iter()
            .map(line_item_from_row)
            .collect::<AppResult<_>>()?,
        available_non_full_supply_products: available,
        status_changes: status_changes
            .into_iter()
            .map(status_change_from_row)
            .collect::<AppResult<_>>()?,
        version: row.version,
        audit_info: build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    }))
}
