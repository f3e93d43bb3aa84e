//! 集成测试共用的构造器

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use lmis_common::{AuditInfo, UserId};
use lmis_domain_core::Money;
use requisition::application::ServiceHandler;
use requisition::domain::calculation::CalculationSettings;
use requisition::domain::engine::StatusTransitionEngine;
use requisition::domain::entities::{
    Requisition, RequisitionLineItem, RequisitionParts, RequisitionTemplate, TemplateColumn,
};
use requisition::domain::enums::{ColumnSource, RequisitionStatus};
use requisition::domain::services::{
    ApprovedProductRecord, FacilityRecord, OrderableRecord, PeriodRecord, ProgramRecord,
    SupplyLineRecord, SupportedProgram,
};
use requisition::domain::value_objects::columns::*;
use requisition::domain::value_objects::{
    FacilityId, OrderableId, PackagingRules, ProcessingPeriodId, ProgramId, RequisitionId,
    SupervisoryNodeId, TemplateId,
};
use requisition::infrastructure::persistence::{
    InMemoryRejectionReasonCategoryRepository, InMemoryRequisitionRepository,
    InMemoryTemplateRepository,
};
use requisition::infrastructure::reference_data::{
    ApprovedProductsSeed, InMemoryReferenceData, ReferenceDataSeed,
};
use rust_decimal::Decimal;

pub fn input(key: &str) -> TemplateColumn {
    TemplateColumn::new(key, ColumnSource::UserInput)
}

pub fn calculated(key: &str) -> TemplateColumn {
    TemplateColumn::new(key, ColumnSource::Calculated)
}

pub fn reference(key: &str) -> TemplateColumn {
    TemplateColumn::new(key, ColumnSource::ReferenceData)
}

pub fn template(columns: Vec<TemplateColumn>) -> RequisitionTemplate {
    RequisitionTemplate::new(TemplateId::new(), ProgramId::new(), None, 3, columns).unwrap()
}

/// 收货总量与库存为计算列，消耗量手工录入
pub fn calculated_receipts_template() -> RequisitionTemplate {
    template(vec![
        reference(PRODUCT_CODE),
        reference(FULL_PRODUCT_NAME),
        input(SKIPPED),
        input(BEGINNING_BALANCE).required(),
        calculated(TOTAL_RECEIVED_QUANTITY),
        input(TOTAL_CONSUMED_QUANTITY).required(),
        input(TOTAL_LOSSES_AND_ADJUSTMENTS),
        calculated(STOCK_ON_HAND),
        input(TOTAL_STOCKOUT_DAYS).required(),
        calculated(TOTAL),
        calculated(CALCULATED_ORDER_QUANTITY),
        input(REQUESTED_QUANTITY),
        input(REQUESTED_QUANTITY_EXPLANATION),
        input(APPROVED_QUANTITY),
        input(REMARKS),
    ])
}

/// 全部库存数量手工录入，库存为计算列
pub fn standard_columns() -> Vec<TemplateColumn> {
    vec![
        reference(PRODUCT_CODE),
        reference(FULL_PRODUCT_NAME),
        reference(DISPENSING_UNIT),
        input(SKIPPED),
        input(BEGINNING_BALANCE).required(),
        input(TOTAL_RECEIVED_QUANTITY).required(),
        input(TOTAL_CONSUMED_QUANTITY).required(),
        input(TOTAL_LOSSES_AND_ADJUSTMENTS),
        calculated(STOCK_ON_HAND),
        input(TOTAL_STOCKOUT_DAYS),
        calculated(TOTAL),
        calculated(ADJUSTED_CONSUMPTION),
        calculated(AVERAGE_CONSUMPTION),
        calculated(MAXIMUM_STOCK_QUANTITY),
        calculated(CALCULATED_ORDER_QUANTITY),
        input(REQUESTED_QUANTITY),
        input(REQUESTED_QUANTITY_EXPLANATION),
        input(APPROVED_QUANTITY),
        input(REMARKS),
        reference(PRICE_PER_PACK),
        calculated(PACKS_TO_SHIP),
        calculated(TOTAL_COST),
    ]
}

/// A=100, B=50, C=30, D=0, X=0
pub fn default_values() -> Vec<(&'static str, Option<i64>)> {
    vec![
        (BEGINNING_BALANCE, Some(100)),
        (TOTAL_RECEIVED_QUANTITY, Some(50)),
        (TOTAL_CONSUMED_QUANTITY, Some(30)),
        (TOTAL_LOSSES_AND_ADJUSTMENTS, Some(0)),
        (TOTAL_STOCKOUT_DAYS, Some(0)),
    ]
}

/// 在默认值上覆盖部分列
pub fn line_item(overrides: &[(&str, Option<i64>)]) -> RequisitionLineItem {
    let mut item = empty_line_item(&OrderableId::new());
    for (key, value) in default_values() {
        item.set_column_value(key, value).unwrap();
    }
    for (key, value) in overrides {
        item.set_column_value(key, *value).unwrap();
    }
    item
}

/// 未填任何数量的全供应行
pub fn empty_line_item(orderable_id: &OrderableId) -> RequisitionLineItem {
    RequisitionLineItem::full_supply(
        orderable_id.clone(),
        PackagingRules::new(10, 4, false),
        Money::from_minor_units(450),
        Decimal::from(3),
    )
}

/// 指定状态的申请单
pub fn requisition_in(
    status: RequisitionStatus,
    template: &RequisitionTemplate,
    line_items: Vec<RequisitionLineItem>,
) -> Requisition {
    use lmis_domain_core::Entity;

    Requisition::restore(RequisitionParts {
        id: RequisitionId::new(),
        facility_id: FacilityId::new(),
        program_id: template.program_id().clone(),
        processing_period_id: ProcessingPeriodId::new(),
        supervisory_node_id: None,
        supplying_facility_id: None,
        template_id: template.id().clone(),
        status,
        emergency: false,
        number_of_months_in_period: 1,
        draft_status_message: None,
        date_physical_stock_count_completed: None,
        line_items,
        available_non_full_supply_products: BTreeSet::new(),
        status_changes: Vec::new(),
        version: 1,
        audit_info: AuditInfo::new(Some(UserId::new())),
    })
}

pub fn engine() -> StatusTransitionEngine {
    StatusTransitionEngine::new(CalculationSettings::default())
}

// ============================================================================
// 服务装配
// ============================================================================

/// 参考数据夹具：一个支持项目的诊所、一个仓库、一个全供应和一个非全供应产品
///
/// 诊所的监管节点经供应线由仓库供货
pub struct World {
    pub clinic: FacilityId,
    pub warehouse: FacilityId,
    pub program: ProgramId,
    pub supervisory_node: SupervisoryNodeId,
    pub period: ProcessingPeriodId,
    pub next_period: ProcessingPeriodId,
    pub third_period: ProcessingPeriodId,
    pub full_supply: OrderableId,
    pub non_full_supply: OrderableId,
}

impl World {
    pub fn new() -> Self {
        Self {
            clinic: FacilityId::new(),
            warehouse: FacilityId::new(),
            program: ProgramId::new(),
            supervisory_node: SupervisoryNodeId::new(),
            period: ProcessingPeriodId::new(),
            next_period: ProcessingPeriodId::new(),
            third_period: ProcessingPeriodId::new(),
            full_supply: OrderableId::new(),
            non_full_supply: OrderableId::new(),
        }
    }

    fn orderable(id: &OrderableId, code: &str) -> OrderableRecord {
        OrderableRecord {
            id: id.clone(),
            product_code: code.to_string(),
            full_product_name: format!("Product {}", code),
            dispensable: "each".to_string(),
        }
    }

    fn period(id: &ProcessingPeriodId, month: u32) -> PeriodRecord {
        PeriodRecord {
            id: id.clone(),
            name: format!("2026-{:02}", month),
            start_date: chrono::NaiveDate::from_ymd_opt(2026, month, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2026, month, 28).unwrap(),
            duration_in_months: 1,
        }
    }

    pub fn seed(&self) -> ReferenceDataSeed {
        ReferenceDataSeed {
            facilities: vec![
                FacilityRecord {
                    id: self.clinic.clone(),
                    code: "HC01".into(),
                    name: "Comfort Health Clinic".into(),
                    type_code: "health_center".into(),
                    supported_programs: vec![SupportedProgram {
                        program_id: self.program.clone(),
                        support_active: true,
                        program_active: true,
                        support_start_date: None,
                    }],
                },
                FacilityRecord {
                    id: self.warehouse.clone(),
                    code: "WH01".into(),
                    name: "Ninitoto Warehouse".into(),
                    type_code: "warehouse".into(),
                    supported_programs: Vec::new(),
                },
            ],
            programs: vec![ProgramRecord {
                id: self.program.clone(),
                code: "PRG001".into(),
                name: "Family Planning".into(),
            }],
            periods: vec![
                Self::period(&self.period, 1),
                Self::period(&self.next_period, 2),
                Self::period(&self.third_period, 3),
            ],
            orderables: Vec::new(),
            approved_products: vec![ApprovedProductsSeed {
                facility_id: self.clinic.clone(),
                program_id: self.program.clone(),
                products: vec![
                    ApprovedProductRecord {
                        orderable: Self::orderable(&self.full_supply, "C100"),
                        full_supply: true,
                        price_per_pack: Money::from_minor_units(450),
                        max_periods_of_stock: Decimal::from(3),
                        packaging: PackagingRules::new(10, 4, false),
                    },
                    ApprovedProductRecord {
                        orderable: Self::orderable(&self.non_full_supply, "C300"),
                        full_supply: false,
                        price_per_pack: Money::from_minor_units(80),
                        max_periods_of_stock: Decimal::from(3),
                        packaging: PackagingRules::new(100, 50, true),
                    },
                ],
            }],
            supply_lines: vec![SupplyLineRecord {
                supervisory_node_id: self.supervisory_node.clone(),
                program_id: self.program.clone(),
                supplying_facility_id: self.warehouse.clone(),
            }],
            templates: Vec::new(),
        }
    }

    /// 只带一个项目通用模板的处理器
    pub async fn handler(&self) -> (Arc<ServiceHandler>, RequisitionTemplate) {
        let (handler, template, _) = self.handler_with_columns(standard_columns()).await;
        (handler, template)
    }

    /// 指定模板列，并返回申请单仓储以便预置历史数据
    pub async fn handler_with_columns(
        &self,
        columns: Vec<TemplateColumn>,
    ) -> (
        Arc<ServiceHandler>,
        RequisitionTemplate,
        Arc<InMemoryRequisitionRepository>,
    ) {
        let template =
            RequisitionTemplate::new(TemplateId::new(), self.program.clone(), None, 3, columns)
                .unwrap();
        let requisitions = Arc::new(InMemoryRequisitionRepository::new());

        let handler = ServiceHandler::new(
            requisitions.clone(),
            Arc::new(InMemoryTemplateRepository::with_templates([template.clone()]).await),
            Arc::new(InMemoryRejectionReasonCategoryRepository::new()),
            Arc::new(InMemoryReferenceData::new(self.seed())),
            engine(),
        );
        (Arc::new(handler), template, requisitions)
    }
}
