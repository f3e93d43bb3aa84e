//! 转订单：包数与金额、备注

mod common;

use chrono::Utc;
use common::*;
use lmis_common::{AuditInfo, UserId};
use lmis_domain_core::{Entity, Money};
use requisition::application::order::{OrderStatusMessage, to_order};
use requisition::domain::entities::{Requisition, RequisitionParts, RequisitionTemplate};
use requisition::domain::enums::RequisitionStatus;
use requisition::domain::value_objects::columns::*;
use requisition::domain::value_objects::{
    FacilityId, ProcessingPeriodId, RequisitionId, StatusChange,
};
use std::collections::BTreeSet;

/// 已发布的申请单，模板不含包数和金额列
fn released(template: &RequisitionTemplate, approved_quantity: i64) -> (Requisition, FacilityId) {
    let depot = FacilityId::new();
    let mut requisition = requisition_in(
        RequisitionStatus::Approved,
        template,
        vec![line_item(&[(APPROVED_QUANTITY, Some(approved_quantity))])],
    );
    requisition.assign_supplying_facility(depot.clone()).unwrap();
    let released = engine()
        .attempt_transition(&requisition, template, RequisitionStatus::Released, &UserId::new())
        .unwrap();
    (released, depot)
}

#[test]
fn test_order_computes_packs_without_template_columns() {
    let template = calculated_receipts_template();
    assert!(!template.is_column_displayed(PACKS_TO_SHIP));
    assert!(!template.is_column_displayed(TOTAL_COST));

    let (requisition, depot) = released(&template, 25);
    // 列未启用时不保存包数
    assert_eq!(requisition.line_items()[0].packs_to_ship(), None);

    let order = to_order(&requisition, depot, UserId::new(), Utc::now());
    assert_eq!(order.order_line_items.len(), 1);
    assert_eq!(order.order_line_items[0].ordered_quantity, 25);
    assert_eq!(order.order_line_items[0].packs_to_ship, 3);
    assert_eq!(order.order_line_items[0].total_cost, Money::from_minor_units(1350));
    assert_eq!(order.quoted_cost, Money::from_minor_units(1350));
}

#[test]
fn test_quoted_cost_sums_all_lines() {
    let template = calculated_receipts_template();
    let mut requisition = requisition_in(
        RequisitionStatus::Approved,
        &template,
        vec![
            line_item(&[(APPROVED_QUANTITY, Some(25))]),
            // 10 个正好一包
            line_item(&[(APPROVED_QUANTITY, Some(10))]),
            // 不足阈值且不允许取零，仍发一包
            line_item(&[(APPROVED_QUANTITY, Some(2))]),
        ],
    );
    requisition.assign_supplying_facility(FacilityId::new()).unwrap();

    let order = to_order(&requisition, FacilityId::new(), UserId::new(), Utc::now());
    let packs: Vec<i64> = order.order_line_items.iter().map(|l| l.packs_to_ship).collect();
    assert_eq!(packs, vec![3, 1, 1]);
    assert_eq!(order.quoted_cost, Money::from_minor_units(450 * 5));
}

fn with_history(
    template: &RequisitionTemplate,
    message: Option<&str>,
    changes: Vec<StatusChange>,
) -> Requisition {
    Requisition::restore(RequisitionParts {
        id: RequisitionId::new(),
        facility_id: FacilityId::new(),
        program_id: template.program_id().clone(),
        processing_period_id: ProcessingPeriodId::new(),
        supervisory_node_id: None,
        supplying_facility_id: Some(FacilityId::new()),
        template_id: template.id().clone(),
        status: RequisitionStatus::Released,
        emergency: false,
        number_of_months_in_period: 1,
        draft_status_message: message.map(String::from),
        date_physical_stock_count_completed: None,
        line_items: vec![line_item(&[(APPROVED_QUANTITY, Some(10))])],
        available_non_full_supply_products: BTreeSet::new(),
        status_changes: changes,
        version: 1,
        audit_info: AuditInfo::new(Some(UserId::new())),
    })
}

fn change(
    from: Option<RequisitionStatus>,
    to: RequisitionStatus,
    author: &UserId,
) -> StatusChange {
    StatusChange::new(from, to, Some(author.clone()), Utc::now())
}

#[test]
fn test_rejection_reason_travels_with_order() {
    use RequisitionStatus::*;

    let template = calculated_receipts_template();
    let clerk = UserId::new();
    let reviewer = UserId::new();
    let requisition = with_history(
        &template,
        Some("Consumption looks too low"),
        vec![
            change(None, Initiated, &clerk),
            change(Some(Initiated), Submitted, &clerk),
            change(Some(Submitted), Rejected, &reviewer),
            change(Some(Rejected), Submitted, &clerk),
            change(Some(Submitted), Authorized, &clerk),
            change(Some(Authorized), Approved, &reviewer),
            change(Some(Approved), Released, &reviewer),
        ],
    );

    let order = to_order(&requisition, FacilityId::new(), reviewer.clone(), Utc::now());
    assert_eq!(
        order.status_messages,
        vec![OrderStatusMessage {
            author_id: Some(reviewer),
            status: Rejected,
            body: "Consumption looks too low".into(),
        }]
    );

    let json = serde_json::to_value(&order).unwrap();
    assert_eq!(json["statusMessages"][0]["status"], "REJECTED");
    assert_eq!(json["statusMessages"][0]["body"], "Consumption looks too low");
}

#[test]
fn test_draft_note_is_attributed_to_last_stage_before_release() {
    use RequisitionStatus::*;

    let template = calculated_receipts_template();
    let clerk = UserId::new();
    let approver = UserId::new();
    let requisition = with_history(
        &template,
        Some("Deliver before the rains"),
        vec![
            change(None, Initiated, &clerk),
            change(Some(Initiated), Submitted, &clerk),
            change(Some(Submitted), Authorized, &clerk),
            change(Some(Authorized), Approved, &approver),
            change(Some(Approved), Released, &UserId::new()),
        ],
    );

    let order = to_order(&requisition, FacilityId::new(), UserId::new(), Utc::now());
    assert_eq!(order.status_messages.len(), 1);
    assert_eq!(order.status_messages[0].author_id, Some(approver));
    assert_eq!(order.status_messages[0].status, Approved);
}

#[test]
fn test_no_note_means_no_status_messages() {
    let template = calculated_receipts_template();
    let requisition = with_history(&template, None, Vec::new());

    let order = to_order(&requisition, FacilityId::new(), UserId::new(), Utc::now());
    assert!(order.status_messages.is_empty());
    assert_eq!(order.external_id, *requisition.id());
}
