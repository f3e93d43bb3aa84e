//! 由已批准申请单生成的订单

use chrono::{DateTime, Utc};
use lmis_common::{UserId, truncate_to_millis};
use lmis_domain_core::{AggregateRoot, Entity, Money};
use serde::{Deserialize, Serialize};

use crate::domain::calculation::order_quantity;
use crate::domain::entities::{Requisition, RequisitionLineItem};
use crate::domain::enums::RequisitionStatus;
use crate::domain::value_objects::{
    FacilityId, OrderId, OrderableId, ProcessingPeriodId, ProgramId, RequisitionId,
};

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItemDto {
    pub orderable_id: OrderableId,
    pub ordered_quantity: i64,
    pub packs_to_ship: i64,
    pub total_cost: Money,
}

/// 随订单带给供货方的申请单备注
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusMessage {
    pub author_id: Option<UserId>,
    /// 写下备注时申请单所处的状态
    pub status: RequisitionStatus,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: OrderId,
    /// 来源申请单
    pub external_id: RequisitionId,
    pub emergency: bool,
    pub facility_id: FacilityId,
    pub processing_period_id: ProcessingPeriodId,
    pub created_date: DateTime<Utc>,
    pub created_by: UserId,
    pub program_id: ProgramId,
    pub requesting_facility_id: FacilityId,
    pub receiving_facility_id: FacilityId,
    pub supplying_facility_id: FacilityId,
    pub order_code: String,
    pub status: OrderStatus,
    pub quoted_cost: Money,
    pub order_line_items: Vec<OrderLineItemDto>,
    pub status_messages: Vec<OrderStatusMessage>,
}

/// 订单号
pub fn order_code(requisition_id: &RequisitionId) -> String {
    format!("ORDER-{}R", requisition_id)
}

/// 订单行：包数按包装规则由批准数量换算，不依赖模板是否显示这些列
fn order_line_item(item: &RequisitionLineItem) -> OrderLineItemDto {
    let ordered_quantity = order_quantity(item, true).unwrap_or(0);
    let packs_to_ship = item.packaging().packs_to_order(ordered_quantity);
    OrderLineItemDto {
        orderable_id: item.orderable_id().clone(),
        ordered_quantity,
        packs_to_ship,
        total_cost: item.price_per_pack().times(packs_to_ship),
    }
}

/// 草稿备注或驳回理由
///
/// 有驳回记录时归于最近一次驳回，否则归于发布前最后一次状态变更
fn status_messages(requisition: &Requisition) -> Vec<OrderStatusMessage> {
    let Some(body) = requisition.draft_status_message() else {
        return Vec::new();
    };

    let changes = requisition.status_changes();
    let source = changes
        .iter()
        .rev()
        .find(|c| c.status == RequisitionStatus::Rejected)
        .or_else(|| {
            changes
                .iter()
                .rev()
                .find(|c| c.status != RequisitionStatus::Released)
        });

    let (author_id, status) = match source {
        Some(change) => (change.author_id.clone(), change.status),
        None => (
            requisition.audit_info().updated_by.clone(),
            requisition.status(),
        ),
    };
    vec![OrderStatusMessage {
        author_id,
        status,
        body: body.to_string(),
    }]
}

/// 从已指定供货机构的申请单生成订单，跳过的行不下单
pub fn to_order(
    requisition: &Requisition,
    supplying_facility_id: FacilityId,
    created_by: UserId,
    created_date: DateTime<Utc>,
) -> OrderDto {
    let order_line_items: Vec<OrderLineItemDto> = requisition
        .non_skipped_line_items()
        .map(order_line_item)
        .collect();
    let quoted_cost = order_line_items.iter().map(|line| line.total_cost).sum();

    OrderDto {
        id: OrderId::new(),
        external_id: requisition.id().clone(),
        emergency: requisition.is_emergency(),
        facility_id: requisition.facility_id().clone(),
        processing_period_id: requisition.processing_period_id().clone(),
        created_date: truncate_to_millis(created_date),
        created_by,
        program_id: requisition.program_id().clone(),
        requesting_facility_id: requisition.facility_id().clone(),
        receiving_facility_id: requisition.facility_id().clone(),
        supplying_facility_id,
        order_code: order_code(requisition.id()),
        status: OrderStatus::Ordered,
        quoted_cost,
        order_line_items,
        status_messages: status_messages(requisition),
    }
}
