//! 申请单完整生命周期：发起、填报、审批、转订单

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use lmis_common::{AuditInfo, Pagination, UserId};
use lmis_domain_core::{AggregateRoot, Entity, Money, Versioned};
use lmis_errors::{AppError, AppResult};
use mockall::mock;
use requisition::application::order::OrderStatus;
use requisition::application::{
    ConvertToOrderCommand, GetRejectionReasonCategoryQuery, GetRequisitionQuery,
    GetSupplyingDepotsQuery, InitiateRequisitionCommand, RequisitionsForConvertQuery,
    SaveRejectionReasonCategoryCommand, SearchRequisitionsQuery, ServiceHandler,
    TransitionRequisitionCommand, UpdateRequisitionCommand,
};
use requisition::domain::entities::{
    LineItemUpdate, Requisition, RequisitionLineItem, RequisitionParts, RequisitionTemplate,
    TemplateColumn,
};
use requisition::domain::enums::RequisitionStatus;
use requisition::domain::messages::*;
use requisition::domain::repositories::{RequisitionFilter, RequisitionRepository};
use requisition::domain::services::{
    ApprovedProductRecord, FacilityRecord, OrderableRecord, PeriodRecord, ProgramRecord,
    ReferenceDataLookup, SupplyLineRecord,
};
use requisition::domain::value_objects::columns::*;
use requisition::domain::value_objects::{
    FacilityId, OrderableId, ProcessingPeriodId, ProgramId, RejectionReasonCategoryId,
    RequisitionId, SupervisoryNodeId,
};
use requisition::infrastructure::persistence::{
    InMemoryRejectionReasonCategoryRepository, InMemoryRequisitionRepository,
    InMemoryTemplateRepository,
};
use rust_decimal::Decimal;

fn initiate_command(world: &World, user: &UserId) -> InitiateRequisitionCommand {
    InitiateRequisitionCommand {
        facility_id: world.clinic.clone(),
        program_id: world.program.clone(),
        processing_period_id: world.period.clone(),
        supervisory_node_id: Some(world.supervisory_node.clone()),
        emergency: false,
        user_id: user.clone(),
    }
}

fn update_command(requisition: &Requisition, user: &UserId, lines: Vec<LineItemUpdate>) -> UpdateRequisitionCommand {
    UpdateRequisitionCommand {
        requisition_id: requisition.id().clone(),
        version: requisition.version(),
        user_id: user.clone(),
        line_items: lines,
        add_non_full_supply_products: Vec::new(),
        draft_status_message: None,
        date_physical_stock_count_completed: None,
    }
}

fn transition_command(
    requisition: &Requisition,
    user: &UserId,
    target: RequisitionStatus,
) -> TransitionRequisitionCommand {
    TransitionRequisitionCommand {
        requisition_id: requisition.id().clone(),
        target,
        version: requisition.version(),
        user_id: user.clone(),
        reason: None,
    }
}

fn stock_counts(orderable_id: &OrderableId) -> LineItemUpdate {
    default_values()
        .into_iter()
        .fold(LineItemUpdate::new(orderable_id.clone()), |update, (key, value)| {
            update.quantity(key, value)
        })
}

/// 发起并填好库存数据
async fn filled_requisition(handler: &ServiceHandler, world: &World, user: &UserId) -> Requisition {
    let initiated = handler.initiate(initiate_command(world, user)).await.unwrap();
    handler
        .update_requisition(update_command(
            &initiated,
            user,
            vec![stock_counts(&world.full_supply)],
        ))
        .await
        .unwrap()
}

/// 走完提交、授权、审批，批准数量 25
async fn approved_requisition(handler: &ServiceHandler, world: &World, user: &UserId) -> Requisition {
    let filled = filled_requisition(handler, world, user).await;
    let submitted = handler
        .transition(transition_command(&filled, user, RequisitionStatus::Submitted))
        .await
        .unwrap();
    let authorized = handler
        .transition(transition_command(&submitted, user, RequisitionStatus::Authorized))
        .await
        .unwrap();
    let with_quantity = handler
        .update_requisition(update_command(
            &authorized,
            user,
            vec![LineItemUpdate::new(world.full_supply.clone()).quantity(APPROVED_QUANTITY, Some(25))],
        ))
        .await
        .unwrap();
    handler
        .transition(transition_command(&with_quantity, user, RequisitionStatus::Approved))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_lifecycle_to_order() {
    let world = World::new();
    let (handler, _template) = world.handler().await;
    let user = UserId::new();

    let initiated = handler.initiate(initiate_command(&world, &user)).await.unwrap();
    assert_eq!(initiated.status(), RequisitionStatus::Initiated);
    assert_eq!(initiated.version(), 1);
    // 只带全供应产品
    assert_eq!(initiated.line_items().len(), 1);
    assert!(initiated
        .available_non_full_supply_products()
        .contains(&world.non_full_supply));

    let filled = handler
        .update_requisition(update_command(
            &initiated,
            &user,
            vec![stock_counts(&world.full_supply)],
        ))
        .await
        .unwrap();
    assert_eq!(filled.version(), 2);
    let line = &filled.line_items()[0];
    assert_eq!(line.stock_on_hand(), Some(120));
    assert_eq!(line.value(ADJUSTED_CONSUMPTION), Some(30));
    assert_eq!(line.average_consumption(), Some(30));
    assert_eq!(line.maximum_stock_quantity(), Some(90));
    assert_eq!(line.value(CALCULATED_ORDER_QUANTITY), Some(0));

    let submitted = handler
        .transition(transition_command(&filled, &user, RequisitionStatus::Submitted))
        .await
        .unwrap();
    assert_eq!(submitted.version(), 3);

    let authorized = handler
        .transition(transition_command(&submitted, &user, RequisitionStatus::Authorized))
        .await
        .unwrap();
    assert_eq!(authorized.version(), 4);

    let approved_quantity = handler
        .update_requisition(update_command(
            &authorized,
            &user,
            vec![LineItemUpdate::new(world.full_supply.clone()).quantity(APPROVED_QUANTITY, Some(25))],
        ))
        .await
        .unwrap();
    assert_eq!(approved_quantity.version(), 5);
    assert_eq!(approved_quantity.line_items()[0].packs_to_ship(), Some(3));
    assert_eq!(
        approved_quantity.line_items()[0].total_cost(),
        Some(Money::from_minor_units(1350))
    );

    let approved = handler
        .transition(transition_command(&approved_quantity, &user, RequisitionStatus::Approved))
        .await
        .unwrap();
    assert_eq!(approved.version(), 6);

    let order = handler
        .convert_to_order(ConvertToOrderCommand {
            requisition_id: approved.id().clone(),
            supplying_facility_id: world.warehouse.clone(),
            version: approved.version(),
            user_id: user.clone(),
        })
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Ordered);
    assert_eq!(order.order_code, format!("ORDER-{}R", approved.id()));
    assert_eq!(order.supplying_facility_id, world.warehouse);
    assert_eq!(order.quoted_cost, Money::from_minor_units(1350));
    assert_eq!(order.order_line_items.len(), 1);
    assert_eq!(order.order_line_items[0].ordered_quantity, 25);
    assert_eq!(order.order_line_items[0].packs_to_ship, 3);

    let released = handler
        .get_requisition(GetRequisitionQuery {
            requisition_id: approved.id().clone(),
        })
        .await
        .unwrap();
    assert_eq!(released.status(), RequisitionStatus::Released);
    assert_eq!(released.version(), 7);
    assert_eq!(released.supplying_facility_id(), Some(&world.warehouse));

    let history: Vec<_> = released.status_changes().iter().map(|c| c.status).collect();
    assert_eq!(
        history,
        vec![
            RequisitionStatus::Initiated,
            RequisitionStatus::Submitted,
            RequisitionStatus::Authorized,
            RequisitionStatus::Approved,
            RequisitionStatus::Released,
        ]
    );
}

#[tokio::test]
async fn test_stale_version_is_conflict() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let initiated = handler.initiate(initiate_command(&world, &user)).await.unwrap();
    let filled = handler
        .update_requisition(update_command(
            &initiated,
            &user,
            vec![stock_counts(&world.full_supply)],
        ))
        .await
        .unwrap();

    // 仍持有版本 1
    let result = handler
        .transition(transition_command(&initiated, &user, RequisitionStatus::Submitted))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stored = handler
        .get_requisition(GetRequisitionQuery {
            requisition_id: filled.id().clone(),
        })
        .await
        .unwrap();
    assert_eq!(stored.status(), RequisitionStatus::Initiated);
    assert_eq!(stored.version(), filled.version());
}

#[tokio::test]
async fn test_rejected_transition_is_not_persisted() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    // 未填数据直接提交
    let initiated = handler.initiate(initiate_command(&world, &user)).await.unwrap();
    let result = handler
        .transition(transition_command(&initiated, &user, RequisitionStatus::Submitted))
        .await;

    let Err(AppError::InvalidFields(errors)) = result else {
        panic!("expected field errors");
    };
    assert!(errors.contains(REQUISITION_LINE_ITEMS, ERROR_VALUE_MUST_BE_ENTERED));

    let stored = handler
        .get_requisition(GetRequisitionQuery {
            requisition_id: initiated.id().clone(),
        })
        .await
        .unwrap();
    assert_eq!(stored.status(), RequisitionStatus::Initiated);
    assert_eq!(stored.version(), 1);
}

#[tokio::test]
async fn test_reject_keeps_reason_and_allows_resubmission() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let filled = filled_requisition(&handler, &world, &user).await;
    let submitted = handler
        .transition(transition_command(&filled, &user, RequisitionStatus::Submitted))
        .await
        .unwrap();

    let mut reject = transition_command(&submitted, &user, RequisitionStatus::Rejected);
    reject.reason = Some("Consumption looks too low".into());
    let rejected = handler.transition(reject).await.unwrap();
    assert_eq!(rejected.status(), RequisitionStatus::Rejected);
    assert_eq!(rejected.draft_status_message(), Some("Consumption looks too low"));

    let resubmitted = handler
        .transition(transition_command(&rejected, &user, RequisitionStatus::Submitted))
        .await
        .unwrap();
    assert_eq!(resubmitted.status(), RequisitionStatus::Submitted);
}

#[tokio::test]
async fn test_duplicate_regular_requisition_is_conflict() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    handler.initiate(initiate_command(&world, &user)).await.unwrap();
    let duplicate = handler.initiate(initiate_command(&world, &user)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // 紧急申请单不受限制
    let mut emergency = initiate_command(&world, &user);
    emergency.emergency = true;
    let emergency = handler.initiate(emergency).await.unwrap();
    assert!(emergency.is_emergency());
}

#[tokio::test]
async fn test_next_period_carries_consumption_history() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    filled_requisition(&handler, &world, &user).await;

    let mut next = initiate_command(&world, &user);
    next.processing_period_id = world.next_period.clone();
    let next = handler.initiate(next).await.unwrap();

    let line = &next.line_items()[0];
    assert_eq!(line.previous_adjusted_consumptions(), &[30]);
    // 期初余额为录入列，不从上期带入
    assert_eq!(line.value(BEGINNING_BALANCE), None);
}

#[tokio::test]
async fn test_add_non_full_supply_product() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let initiated = handler.initiate(initiate_command(&world, &user)).await.unwrap();

    let mut cmd = update_command(&initiated, &user, Vec::new());
    cmd.add_non_full_supply_products = vec![world.non_full_supply.clone()];
    let updated = handler.update_requisition(cmd).await.unwrap();

    assert_eq!(updated.line_items().len(), 2);
    let added = updated
        .find_line_item_by_product(&world.non_full_supply)
        .unwrap();
    assert!(added.is_non_full_supply());

    // 全供应产品不能再作为非全供应添加
    let mut cmd = update_command(&updated, &user, Vec::new());
    cmd.add_non_full_supply_products = vec![world.full_supply.clone()];
    let Err(AppError::InvalidFields(errors)) = handler.update_requisition(cmd).await else {
        panic!("expected field errors");
    };
    assert!(errors.contains(REQUISITION_LINE_ITEMS, ERROR_NON_FULL_SUPPLY_NOT_AVAILABLE));
}

#[tokio::test]
async fn test_calculated_column_cannot_be_edited() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let initiated = handler.initiate(initiate_command(&world, &user)).await.unwrap();
    let result = handler
        .update_requisition(update_command(
            &initiated,
            &user,
            vec![LineItemUpdate::new(world.full_supply.clone()).quantity(STOCK_ON_HAND, Some(5))],
        ))
        .await;

    let Err(AppError::InvalidFields(errors)) = result else {
        panic!("expected field errors");
    };
    assert!(errors.contains(STOCK_ON_HAND, ERROR_CALCULATED_FIELD_NOT_EDITABLE));
}

#[tokio::test]
async fn test_search_by_facility_and_status() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let filled = filled_requisition(&handler, &world, &user).await;
    handler
        .transition(transition_command(&filled, &user, RequisitionStatus::Submitted))
        .await
        .unwrap();

    let mut emergency = initiate_command(&world, &user);
    emergency.emergency = true;
    handler.initiate(emergency).await.unwrap();

    let all = handler
        .search(SearchRequisitionsQuery {
            filter: RequisitionFilter {
                facility_id: Some(world.clinic.clone()),
                ..Default::default()
            },
            pagination: Pagination::new(0, 10),
        })
        .await
        .unwrap();
    assert_eq!(all.total_elements, 2);

    let submitted = handler
        .search(SearchRequisitionsQuery {
            filter: RequisitionFilter {
                facility_id: Some(world.clinic.clone()),
                statuses: vec![RequisitionStatus::Submitted],
                ..Default::default()
            },
            pagination: Pagination::new(0, 10),
        })
        .await
        .unwrap();
    assert_eq!(submitted.total_elements, 1);
    assert_eq!(submitted.content[0].id(), filled.id());

    let elsewhere = handler
        .search(SearchRequisitionsQuery {
            filter: RequisitionFilter {
                facility_id: Some(world.warehouse.clone()),
                ..Default::default()
            },
            pagination: Pagination::new(0, 10),
        })
        .await
        .unwrap();
    assert!(elsewhere.content.is_empty());
}

#[tokio::test]
async fn test_export_resolves_reference_data() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let initiated = handler.initiate(initiate_command(&world, &user)).await.unwrap();
    let dto = handler
        .export_requisition(GetRequisitionQuery {
            requisition_id: initiated.id().clone(),
        })
        .await
        .unwrap();

    assert_eq!(dto.facility.id, world.clinic);
    assert_eq!(dto.facility.name.as_deref(), Some("Comfort Health Clinic"));
    assert_eq!(dto.program.name.as_deref(), Some("Family Planning"));
    assert_eq!(dto.processing_period.name.as_deref(), Some("2026-01"));
    assert_eq!(dto.available_non_full_supply_products.len(), 1);
    let available = &dto.available_non_full_supply_products[0];
    assert_eq!(available.id, world.non_full_supply);
    assert_eq!(available.product_code.as_deref(), Some("C300"));
    assert_eq!(available.full_product_name.as_deref(), Some("Product C300"));
}

// ============ 待转订单与供货机构 ============

#[tokio::test]
async fn test_convert_to_facility_outside_supply_lines_is_rejected() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let approved = approved_requisition(&handler, &world, &user).await;
    // 诊所存在但不在供应线上
    let result = handler
        .convert_to_order(ConvertToOrderCommand {
            requisition_id: approved.id().clone(),
            supplying_facility_id: world.clinic.clone(),
            version: approved.version(),
            user_id: user.clone(),
        })
        .await;

    let Err(AppError::InvalidFields(errors)) = result else {
        panic!("expected field errors");
    };
    assert!(errors.contains(FIELD_SUPPLYING_FACILITY, ERROR_SUPPLYING_FACILITY_NOT_AVAILABLE));

    let stored = handler
        .get_requisition(GetRequisitionQuery {
            requisition_id: approved.id().clone(),
        })
        .await
        .unwrap();
    assert_eq!(stored.status(), RequisitionStatus::Approved);
    assert_eq!(stored.supplying_facility_id(), None);
}

#[tokio::test]
async fn test_requisition_without_supervisory_node_has_no_depots() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let mut cmd = initiate_command(&world, &user);
    cmd.supervisory_node_id = None;
    let initiated = handler.initiate(cmd).await.unwrap();

    let depots = handler
        .supplying_depots(GetSupplyingDepotsQuery {
            requisition_id: initiated.id().clone(),
        })
        .await
        .unwrap();
    assert!(depots.is_empty());
}

#[tokio::test]
async fn test_supplying_depots_follow_supply_lines() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let initiated = handler.initiate(initiate_command(&world, &user)).await.unwrap();
    let depots = handler
        .supplying_depots(GetSupplyingDepotsQuery {
            requisition_id: initiated.id().clone(),
        })
        .await
        .unwrap();

    assert_eq!(depots.len(), 1);
    assert_eq!(depots[0].id, world.warehouse);
    assert_eq!(depots[0].code, "WH01");
}

#[tokio::test]
async fn test_requisitions_for_convert_lists_only_approved() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let approved = approved_requisition(&handler, &world, &user).await;

    // 下一周期的申请单停在已提交
    let mut next = initiate_command(&world, &user);
    next.processing_period_id = world.next_period.clone();
    let next = handler.initiate(next).await.unwrap();
    let next = handler
        .update_requisition(update_command(&next, &user, vec![stock_counts(&world.full_supply)]))
        .await
        .unwrap();
    handler
        .transition(transition_command(&next, &user, RequisitionStatus::Submitted))
        .await
        .unwrap();

    let page = handler
        .requisitions_for_convert(RequisitionsForConvertQuery {
            program_id: Some(world.program.clone()),
            pagination: Pagination::new(0, 10),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total_elements, 1);
    let entry = &page.content[0];
    assert_eq!(entry.requisition.id, *approved.id());
    assert_eq!(entry.requisition.status, RequisitionStatus::Approved);
    assert_eq!(entry.requisition.facility.name.as_deref(), Some("Comfort Health Clinic"));
    assert_eq!(entry.requisition.processing_period.name.as_deref(), Some("2026-01"));
    assert_eq!(entry.supplying_depots.len(), 1);
    assert_eq!(entry.supplying_depots[0].id, world.warehouse);
    assert_eq!(entry.supplying_depots[0].name.as_deref(), Some("Ninitoto Warehouse"));

    let elsewhere = handler
        .requisitions_for_convert(RequisitionsForConvertQuery {
            facility_id: Some(world.warehouse.clone()),
            pagination: Pagination::new(0, 10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(elsewhere.content.is_empty());
}

// ============ 驳回原因分类 ============

fn category_command(id: &RejectionReasonCategoryId, name: &str, code: &str) -> SaveRejectionReasonCategoryCommand {
    SaveRejectionReasonCategoryCommand {
        category_id: id.clone(),
        name: name.into(),
        code: code.into(),
        user_id: UserId::new(),
    }
}

#[tokio::test]
async fn test_rejection_reason_categories() {
    let world = World::new();
    let (handler, _) = world.handler().await;

    let stock = RejectionReasonCategoryId::new();
    let created = handler
        .save_rejection_reason_category(category_command(&stock, " Stock data ", "SD"))
        .await
        .unwrap();
    assert_eq!(created.name(), "Stock data");
    let created_at = created.audit_info().created_at;

    let renamed = handler
        .save_rejection_reason_category(category_command(&stock, "Stock counts", "SD"))
        .await
        .unwrap();
    assert_eq!(renamed.name(), "Stock counts");
    // 覆盖保存沿用创建时间
    assert_eq!(renamed.audit_info().created_at, created_at);

    handler
        .save_rejection_reason_category(category_command(
            &RejectionReasonCategoryId::new(),
            "Approval",
            "AP",
        ))
        .await
        .unwrap();
    let names: Vec<String> = handler
        .list_rejection_reason_categories()
        .await
        .unwrap()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, vec!["Approval", "Stock counts"]);

    let fetched = handler
        .get_rejection_reason_category(GetRejectionReasonCategoryQuery {
            category_id: stock.clone(),
        })
        .await
        .unwrap();
    assert_eq!(fetched.code(), "SD");
}

#[tokio::test]
async fn test_rejection_reason_category_errors() {
    let world = World::new();
    let (handler, _) = world.handler().await;

    handler
        .save_rejection_reason_category(category_command(
            &RejectionReasonCategoryId::new(),
            "Stock data",
            "SD",
        ))
        .await
        .unwrap();

    let duplicate = handler
        .save_rejection_reason_category(category_command(
            &RejectionReasonCategoryId::new(),
            "Other",
            "SD",
        ))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let blank = handler
        .save_rejection_reason_category(category_command(&RejectionReasonCategoryId::new(), " ", ""))
        .await;
    let Err(AppError::InvalidFields(errors)) = blank else {
        panic!("expected field errors");
    };
    assert!(errors.contains(FIELD_NAME, ERROR_REJECTION_REASON_CATEGORY_NAME_REQUIRED));
    assert!(errors.contains(FIELD_CODE, ERROR_REJECTION_REASON_CATEGORY_CODE_REQUIRED));

    let missing = handler
        .get_rejection_reason_category(GetRejectionReasonCategoryQuery {
            category_id: RejectionReasonCategoryId::new(),
        })
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

// ============ 上期数据 ============

/// 期初余额取自上期库存的模板
fn carried_balance_columns() -> Vec<TemplateColumn> {
    standard_columns()
        .into_iter()
        .map(|column| {
            if column.key == BEGINNING_BALANCE {
                calculated(BEGINNING_BALANCE)
            } else {
                column
            }
        })
        .collect()
}

/// 直接写入仓储的历史申请单
async fn store_previous(
    requisitions: &InMemoryRequisitionRepository,
    world: &World,
    template: &RequisitionTemplate,
    period: &ProcessingPeriodId,
    line_item: RequisitionLineItem,
) {
    let mut requisition = Requisition::restore(RequisitionParts {
        id: RequisitionId::new(),
        facility_id: world.clinic.clone(),
        program_id: world.program.clone(),
        processing_period_id: period.clone(),
        supervisory_node_id: Some(world.supervisory_node.clone()),
        supplying_facility_id: None,
        template_id: template.id().clone(),
        status: RequisitionStatus::Authorized,
        emergency: false,
        number_of_months_in_period: 1,
        draft_status_message: None,
        date_physical_stock_count_completed: None,
        line_items: vec![line_item],
        available_non_full_supply_products: BTreeSet::new(),
        status_changes: Vec::new(),
        version: 1,
        audit_info: AuditInfo::new(Some(UserId::new())),
    });
    engine()
        .calculator()
        .recalculate(&mut requisition, template)
        .unwrap();
    requisitions.save(&requisition).await.unwrap();
}

fn counted(world: &World, values: &[(&str, Option<i64>)]) -> RequisitionLineItem {
    let mut item = empty_line_item(&world.full_supply);
    for (key, value) in default_values() {
        item.set_column_value(key, value).unwrap();
    }
    for (key, value) in values {
        item.set_column_value(key, *value).unwrap();
    }
    item
}

#[tokio::test]
async fn test_previous_periods_are_ordered_by_period_not_creation() {
    let world = World::new();
    let (handler, template, requisitions) =
        world.handler_with_columns(carried_balance_columns()).await;
    let user = UserId::new();

    // 二月先录入，一月后补
    store_previous(
        &requisitions,
        &world,
        &template,
        &world.next_period,
        counted(&world, &[(BEGINNING_BALANCE, Some(120)), (TOTAL_CONSUMED_QUANTITY, Some(40))]),
    )
    .await;
    store_previous(&requisitions, &world, &template, &world.period, counted(&world, &[])).await;

    let mut march = initiate_command(&world, &user);
    march.processing_period_id = world.third_period.clone();
    let march = handler.initiate(march).await.unwrap();

    let line = &march.line_items()[0];
    assert_eq!(line.previous_adjusted_consumptions(), &[30, 40]);
    // 二月库存 120 + 50 - 40
    assert_eq!(line.value(BEGINNING_BALANCE), Some(130));
}

#[tokio::test]
async fn test_previous_period_without_values_is_passed_over() {
    let world = World::new();
    let (handler, template, requisitions) =
        world.handler_with_columns(carried_balance_columns()).await;
    let user = UserId::new();

    store_previous(&requisitions, &world, &template, &world.period, counted(&world, &[])).await;
    store_previous(
        &requisitions,
        &world,
        &template,
        &world.next_period,
        empty_line_item(&world.full_supply),
    )
    .await;

    let mut march = initiate_command(&world, &user);
    march.processing_period_id = world.third_period.clone();
    let march = handler.initiate(march).await.unwrap();

    let line = &march.line_items()[0];
    assert_eq!(line.previous_adjusted_consumptions(), &[30]);
    assert_eq!(line.value(BEGINNING_BALANCE), Some(120));
}

// ============ 参考数据替身 ============

mock! {
    pub Lookup {}

    #[async_trait]
    impl ReferenceDataLookup for Lookup {
        async fn find_facility(&self, id: &FacilityId) -> AppResult<Option<FacilityRecord>>;
        async fn find_program(&self, id: &ProgramId) -> AppResult<Option<ProgramRecord>>;
        async fn find_period(&self, id: &ProcessingPeriodId) -> AppResult<Option<PeriodRecord>>;
        async fn find_orderables(&self, ids: &[OrderableId]) -> AppResult<Vec<OrderableRecord>>;
        async fn find_approved_products(
            &self,
            facility_id: &FacilityId,
            program_id: &ProgramId,
        ) -> AppResult<Vec<ApprovedProductRecord>>;
        async fn find_supply_lines(
            &self,
            program_id: &ProgramId,
            supervisory_node_id: &SupervisoryNodeId,
        ) -> AppResult<Vec<SupplyLineRecord>>;
    }
}

async fn handler_with(lookup: MockLookup) -> ServiceHandler {
    ServiceHandler::new(
        Arc::new(InMemoryRequisitionRepository::new()),
        Arc::new(InMemoryTemplateRepository::new()),
        Arc::new(InMemoryRejectionReasonCategoryRepository::new()),
        Arc::new(lookup),
        engine(),
    )
}

#[tokio::test]
async fn test_unknown_facility_is_not_found() {
    let mut lookup = MockLookup::new();
    lookup.expect_find_facility().times(1).returning(|_| Ok(None));
    lookup.expect_find_approved_products().never();

    let handler = handler_with(lookup).await;
    let result = handler
        .initiate(initiate_command(&World::new(), &UserId::new()))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_facility_without_program_support_is_rejected() {
    let world = World::new();
    let clinic = world.clinic.clone();

    let mut lookup = MockLookup::new();
    lookup.expect_find_facility().returning(move |_| {
        Ok(Some(FacilityRecord {
            id: clinic.clone(),
            code: "HC02".into(),
            name: "Balaka District Hospital".into(),
            type_code: "district_hospital".into(),
            supported_programs: Vec::new(),
        }))
    });
    lookup.expect_find_program().never();

    let handler = handler_with(lookup).await;
    let result = handler.initiate(initiate_command(&world, &UserId::new())).await;

    let Err(AppError::InvalidFields(errors)) = result else {
        panic!("expected field errors");
    };
    assert!(errors.contains(FIELD_FACILITY, ERROR_FACILITY_DOES_NOT_SUPPORT_PROGRAM));
}

#[tokio::test]
async fn test_max_periods_of_stock_drives_maximum_quantity() {
    let world = World::new();
    let (handler, _) = world.handler().await;
    let user = UserId::new();

    let filled = filled_requisition(&handler, &world, &user).await;
    let line = &filled.line_items()[0];
    assert_eq!(line.max_periods_of_stock(), Decimal::from(3));
    assert_eq!(
        line.maximum_stock_quantity(),
        line.average_consumption().map(|p| p * 3)
    );
}
