//! 申请单导出/导入记录
//!
//! `to_record` / `from_record` 显式转换，按列键逐一拷贝数量列。
//! 机构、项目、周期和产品的展示字段来自参考数据，恢复时只读 ID

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use lmis_common::{AuditInfo, UserId};
use lmis_domain_core::{AggregateRoot, Entity, Money, Versioned};
use lmis_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    LineItemParts, Requisition, RequisitionLineItem, RequisitionParts, RequisitionTemplate,
    TemplateColumn,
};
use crate::domain::enums::RequisitionStatus;
use crate::domain::services::{FacilityRecord, OrderableRecord, PeriodRecord, ProgramRecord};
use crate::domain::value_objects::columns::*;
use crate::domain::value_objects::{
    FacilityId, LineItemId, OrderableId, PackagingRules, ProcessingPeriodId, ProgramId,
    RequisitionId, StatusChange, SupervisoryNodeId, TemplateId, known_columns,
};

/// 只带 ID 的引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference<T> {
    pub id: T,
}

impl<T> ObjectReference<T> {
    pub fn new(id: T) -> Self {
        Self { id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDto {
    pub id: TemplateId,
    pub program_id: ProgramId,
    pub facility_type_code: Option<String>,
    pub number_of_periods_to_average: u32,
    pub columns: Vec<TemplateColumn>,
}

impl From<&RequisitionTemplate> for TemplateDto {
    fn from(template: &RequisitionTemplate) -> Self {
        Self {
            id: template.id().clone(),
            program_id: template.program_id().clone(),
            facility_type_code: template.facility_type_code().map(String::from),
            number_of_periods_to_average: template.number_of_periods_to_average(),
            columns: template.columns().to_vec(),
        }
    }
}

/// 产品引用，附带展示用的参考数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderableDto {
    pub id: OrderableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispensable: Option<String>,
}

impl OrderableDto {
    pub fn resolve(id: &OrderableId, record: Option<&OrderableRecord>) -> Self {
        Self {
            id: id.clone(),
            product_code: record.map(|o| o.product_code.clone()),
            full_product_name: record.map(|o| o.full_product_name.clone()),
            dispensable: record.map(|o| o.dispensable.clone()),
        }
    }
}

/// 机构引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDto {
    pub id: FacilityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
}

impl FacilityDto {
    pub fn resolve(id: &FacilityId, record: Option<&FacilityRecord>) -> Self {
        Self {
            id: id.clone(),
            code: record.map(|f| f.code.clone()),
            name: record.map(|f| f.name.clone()),
            type_code: record.map(|f| f.type_code.clone()),
        }
    }
}

impl From<&FacilityRecord> for FacilityDto {
    fn from(record: &FacilityRecord) -> Self {
        Self::resolve(&record.id, Some(record))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDto {
    pub id: ProgramId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProgramDto {
    pub fn resolve(id: &ProgramId, record: Option<&ProgramRecord>) -> Self {
        Self {
            id: id.clone(),
            code: record.map(|p| p.code.clone()),
            name: record.map(|p| p.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingPeriodDto {
    pub id: ProcessingPeriodId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl ProcessingPeriodDto {
    pub fn resolve(id: &ProcessingPeriodId, record: Option<&PeriodRecord>) -> Self {
        Self {
            id: id.clone(),
            name: record.map(|p| p.name.clone()),
            start_date: record.map(|p| p.start_date),
            end_date: record.map(|p| p.end_date),
        }
    }
}

/// 导出时用到的参考数据，查不到的留空
#[derive(Debug, Clone, Default)]
pub struct ReferenceDetails {
    pub facility: Option<FacilityRecord>,
    pub program: Option<ProgramRecord>,
    pub period: Option<PeriodRecord>,
    pub orderables: HashMap<OrderableId, OrderableRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDto {
    pub id: LineItemId,
    pub orderable: Option<OrderableDto>,
    pub beginning_balance: Option<i64>,
    pub total_received_quantity: Option<i64>,
    pub total_consumed_quantity: Option<i64>,
    pub total_losses_and_adjustments: Option<i64>,
    pub stock_on_hand: Option<i64>,
    pub total_stockout_days: Option<i64>,
    pub total: Option<i64>,
    pub number_of_new_patients_added: Option<i64>,
    pub adjusted_consumption: Option<i64>,
    pub average_consumption: Option<i64>,
    pub maximum_stock_quantity: Option<i64>,
    pub calculated_order_quantity: Option<i64>,
    pub requested_quantity: Option<i64>,
    pub approved_quantity: Option<i64>,
    pub packs_to_ship: Option<i64>,
    pub requested_quantity_explanation: Option<String>,
    pub remarks: Option<String>,
    pub price_per_pack: Money,
    pub total_cost: Option<Money>,
    pub skipped: bool,
    pub non_full_supply: bool,
    pub packaging: PackagingRules,
    pub max_periods_of_stock: Decimal,
    #[serde(default)]
    pub previous_adjusted_consumptions: Vec<i64>,
}

impl LineItemDto {
    /// 数量列对应的字段
    fn quantity_slot(&mut self, key: &str) -> Option<&mut Option<i64>> {
        let slot = match key {
            BEGINNING_BALANCE => &mut self.beginning_balance,
            TOTAL_RECEIVED_QUANTITY => &mut self.total_received_quantity,
            TOTAL_CONSUMED_QUANTITY => &mut self.total_consumed_quantity,
            TOTAL_LOSSES_AND_ADJUSTMENTS => &mut self.total_losses_and_adjustments,
            STOCK_ON_HAND => &mut self.stock_on_hand,
            TOTAL_STOCKOUT_DAYS => &mut self.total_stockout_days,
            TOTAL => &mut self.total,
            NUMBER_OF_NEW_PATIENTS_ADDED => &mut self.number_of_new_patients_added,
            ADJUSTED_CONSUMPTION => &mut self.adjusted_consumption,
            AVERAGE_CONSUMPTION => &mut self.average_consumption,
            MAXIMUM_STOCK_QUANTITY => &mut self.maximum_stock_quantity,
            CALCULATED_ORDER_QUANTITY => &mut self.calculated_order_quantity,
            REQUESTED_QUANTITY => &mut self.requested_quantity,
            APPROVED_QUANTITY => &mut self.approved_quantity,
            PACKS_TO_SHIP => &mut self.packs_to_ship,
            _ => return None,
        };
        Some(slot)
    }
}

/// 申请单记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionDto {
    pub id: RequisitionId,
    pub facility: FacilityDto,
    pub program: ProgramDto,
    pub processing_period: ProcessingPeriodDto,
    pub supervisory_node: Option<ObjectReference<SupervisoryNodeId>>,
    pub supplying_facility: Option<ObjectReference<FacilityId>>,
    pub status: RequisitionStatus,
    pub emergency: bool,
    pub number_of_months_in_period: u32,
    pub version: i64,
    pub draft_status_message: Option<String>,
    pub date_physical_stock_count_completed: Option<NaiveDate>,
    pub template: TemplateDto,
    pub requisition_line_items: Vec<LineItemDto>,
    pub available_non_full_supply_products: Vec<OrderableDto>,
    pub status_changes: Vec<StatusChange>,
    pub created_date: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub modified_date: DateTime<Utc>,
    pub modified_by: Option<UserId>,
}

/// 申请单概要，用于待转订单列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicRequisitionDto {
    pub id: RequisitionId,
    pub status: RequisitionStatus,
    pub emergency: bool,
    pub version: i64,
    pub facility: FacilityDto,
    pub program: ProgramDto,
    pub processing_period: ProcessingPeriodDto,
    pub supervisory_node: Option<ObjectReference<SupervisoryNodeId>>,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

impl BasicRequisitionDto {
    pub fn new(requisition: &Requisition, details: &ReferenceDetails) -> Self {
        let audit = requisition.audit_info();
        Self {
            id: requisition.id().clone(),
            status: requisition.status(),
            emergency: requisition.is_emergency(),
            version: requisition.version(),
            facility: FacilityDto::resolve(requisition.facility_id(), details.facility.as_ref()),
            program: ProgramDto::resolve(requisition.program_id(), details.program.as_ref()),
            processing_period: ProcessingPeriodDto::resolve(
                requisition.processing_period_id(),
                details.period.as_ref(),
            ),
            supervisory_node: requisition
                .supervisory_node_id()
                .cloned()
                .map(ObjectReference::new),
            created_date: audit.created_at,
            modified_date: audit.updated_at,
        }
    }
}

/// 待转订单的申请单与可选供货机构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionForConvertDto {
    pub requisition: BasicRequisitionDto,
    pub supplying_depots: Vec<FacilityDto>,
}

/// 导出记录，参考数据缺失时只输出 ID
pub fn to_record(
    requisition: &Requisition,
    template: &RequisitionTemplate,
    details: &ReferenceDetails,
) -> RequisitionDto {
    let audit = requisition.audit_info();
    let orderables = &details.orderables;

    RequisitionDto {
        id: requisition.id().clone(),
        facility: FacilityDto::resolve(requisition.facility_id(), details.facility.as_ref()),
        program: ProgramDto::resolve(requisition.program_id(), details.program.as_ref()),
        processing_period: ProcessingPeriodDto::resolve(
            requisition.processing_period_id(),
            details.period.as_ref(),
        ),
        supervisory_node: requisition
            .supervisory_node_id()
            .cloned()
            .map(ObjectReference::new),
        supplying_facility: requisition
            .supplying_facility_id()
            .cloned()
            .map(ObjectReference::new),
        status: requisition.status(),
        emergency: requisition.is_emergency(),
        number_of_months_in_period: requisition.number_of_months_in_period(),
        version: requisition.version(),
        draft_status_message: requisition.draft_status_message().map(String::from),
        date_physical_stock_count_completed: requisition.date_physical_stock_count_completed(),
        template: TemplateDto::from(template),
        requisition_line_items: requisition
            .line_items()
            .iter()
            .map(|item| line_item_to_record(item, orderables.get(item.orderable_id())))
            .collect(),
        available_non_full_supply_products: requisition
            .available_non_full_supply_products()
            .iter()
            .map(|id| OrderableDto::resolve(id, orderables.get(id)))
            .collect(),
        status_changes: requisition.status_changes().to_vec(),
        created_date: audit.created_at,
        created_by: audit.created_by.clone(),
        modified_date: audit.updated_at,
        modified_by: audit.updated_by.clone(),
    }
}

fn line_item_to_record(item: &RequisitionLineItem, orderable: Option<&OrderableRecord>) -> LineItemDto {
    let mut dto = LineItemDto {
        id: item.id().clone(),
        orderable: Some(OrderableDto::resolve(item.orderable_id(), orderable)),
        requested_quantity_explanation: item.requested_quantity_explanation().map(String::from),
        remarks: item.remarks().map(String::from),
        price_per_pack: item.price_per_pack(),
        total_cost: item.total_cost(),
        skipped: item.is_skipped(),
        non_full_supply: item.is_non_full_supply(),
        packaging: *item.packaging(),
        max_periods_of_stock: item.max_periods_of_stock(),
        previous_adjusted_consumptions: item.previous_adjusted_consumptions().to_vec(),
        ..Default::default()
    };

    for (key, value) in item.values() {
        if let Some(slot) = dto.quantity_slot(key) {
            *slot = Some(*value);
        }
    }
    dto
}

/// 从记录恢复申请单
pub fn from_record(dto: RequisitionDto) -> AppResult<Requisition> {
    let line_items = dto
        .requisition_line_items
        .into_iter()
        .map(line_item_from_record)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Requisition::restore(RequisitionParts {
        id: dto.id,
        facility_id: dto.facility.id,
        program_id: dto.program.id,
        processing_period_id: dto.processing_period.id,
        supervisory_node_id: dto.supervisory_node.map(|r| r.id),
        supplying_facility_id: dto.supplying_facility.map(|r| r.id),
        template_id: dto.template.id,
        status: dto.status,
        emergency: dto.emergency,
        number_of_months_in_period: dto.number_of_months_in_period,
        draft_status_message: dto.draft_status_message,
        date_physical_stock_count_completed: dto.date_physical_stock_count_completed,
        line_items,
        available_non_full_supply_products: dto
            .available_non_full_supply_products
            .into_iter()
            .map(|o| o.id)
            .collect(),
        status_changes: dto.status_changes,
        version: dto.version,
        audit_info: AuditInfo {
            created_at: dto.created_date,
            created_by: dto.created_by,
            updated_at: dto.modified_date,
            updated_by: dto.modified_by,
        },
    }))
}

fn line_item_from_record(mut dto: LineItemDto) -> AppResult<RequisitionLineItem> {
    let orderable = dto
        .orderable
        .take()
        .ok_or_else(|| AppError::validation(format!("Line item {} has no orderable", dto.id)))?;

    let mut values = std::collections::BTreeMap::new();
    for definition in known_columns() {
        if let Some(Some(value)) = dto.quantity_slot(definition.key).map(|slot| *slot) {
            values.insert(definition.key.to_string(), value);
        }
    }

    Ok(RequisitionLineItem::restore(LineItemParts {
        id: dto.id,
        orderable_id: orderable.id,
        values,
        remarks: dto.remarks,
        requested_quantity_explanation: dto.requested_quantity_explanation,
        price_per_pack: dto.price_per_pack,
        total_cost: dto.total_cost,
        non_full_supply: dto.non_full_supply,
        skipped: dto.skipped,
        packaging: dto.packaging,
        max_periods_of_stock: dto.max_periods_of_stock,
        previous_adjusted_consumptions: dto.previous_adjusted_consumptions,
    }))
}
