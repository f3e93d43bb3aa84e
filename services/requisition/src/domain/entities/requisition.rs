//! 申请单聚合根

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use lmis_common::truncate_to_millis;
use lmis_domain_core::{AggregateRoot, AuditInfo, Entity, Money, UserId, Versioned};
use lmis_errors::{AppError, AppResult, FieldErrors, Message};

use super::line_item::RequisitionLineItem;
use super::template::RequisitionTemplate;
use crate::domain::enums::RequisitionStatus;
use crate::domain::messages::*;
use crate::domain::value_objects::columns::{REQUISITION_LINE_ITEMS, SKIPPED};
use crate::domain::value_objects::{
    ColumnKind, ColumnPhase, FacilityId, OrderableId, ProcessingPeriodId, ProgramId,
    RequisitionId, StatusChange, SupervisoryNodeId, TemplateId, column_definition,
};

/// 发起申请单所需的参数
#[derive(Debug, Clone)]
pub struct InitiateParams {
    pub facility_id: FacilityId,
    pub program_id: ProgramId,
    pub processing_period_id: ProcessingPeriodId,
    pub template_id: TemplateId,
    pub supervisory_node_id: Option<SupervisoryNodeId>,
    pub emergency: bool,
    pub number_of_months_in_period: u32,
    pub line_items: Vec<RequisitionLineItem>,
    pub available_non_full_supply_products: BTreeSet<OrderableId>,
}

/// 申请单全部字段，用于从存储或导入恢复
#[derive(Debug, Clone)]
pub struct RequisitionParts {
    pub id: RequisitionId,
    pub facility_id: FacilityId,
    pub program_id: ProgramId,
    pub processing_period_id: ProcessingPeriodId,
    pub supervisory_node_id: Option<SupervisoryNodeId>,
    pub supplying_facility_id: Option<FacilityId>,
    pub template_id: TemplateId,
    pub status: RequisitionStatus,
    pub emergency: bool,
    pub number_of_months_in_period: u32,
    pub draft_status_message: Option<String>,
    pub date_physical_stock_count_completed: Option<NaiveDate>,
    pub line_items: Vec<RequisitionLineItem>,
    pub available_non_full_supply_products: BTreeSet<OrderableId>,
    pub status_changes: Vec<StatusChange>,
    pub version: i64,
    pub audit_info: AuditInfo,
}

/// 单个字段的新值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Quantity(Option<i64>),
    Text(Option<String>),
    Flag(bool),
}

impl FieldValue {
    fn kind(&self) -> ColumnKind {
        match self {
            Self::Quantity(_) => ColumnKind::Quantity,
            Self::Text(_) => ColumnKind::Text,
            Self::Flag(_) => ColumnKind::Flag,
        }
    }
}

/// 对单行的修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemUpdate {
    pub orderable_id: OrderableId,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LineItemUpdate {
    pub fn new(orderable_id: OrderableId) -> Self {
        Self {
            orderable_id,
            fields: BTreeMap::new(),
        }
    }

    pub fn quantity(mut self, key: impl Into<String>, value: Option<i64>) -> Self {
        self.fields.insert(key.into(), FieldValue::Quantity(value));
        self
    }

    pub fn text(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.fields.insert(key.into(), FieldValue::Text(value));
        self
    }

    pub fn skipped(mut self, skipped: bool) -> Self {
        self.fields.insert(SKIPPED.to_string(), FieldValue::Flag(skipped));
        self
    }
}

/// 申请单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requisition {
    id: RequisitionId,
    facility_id: FacilityId,
    program_id: ProgramId,
    processing_period_id: ProcessingPeriodId,
    supervisory_node_id: Option<SupervisoryNodeId>,
    supplying_facility_id: Option<FacilityId>,
    template_id: TemplateId,
    status: RequisitionStatus,
    emergency: bool,
    number_of_months_in_period: u32,
    draft_status_message: Option<String>,
    date_physical_stock_count_completed: Option<NaiveDate>,
    line_items: Vec<RequisitionLineItem>,
    available_non_full_supply_products: BTreeSet<OrderableId>,
    status_changes: Vec<StatusChange>,
    version: i64,
    audit_info: AuditInfo,
}

impl Requisition {
    /// 发起新申请单，状态为 INITIATED，版本为 1
    pub fn initiate(params: InitiateParams, initiator: &UserId) -> Self {
        let audit_info = AuditInfo::new(Some(initiator.clone()));
        let initial = StatusChange::new(
            None,
            RequisitionStatus::Initiated,
            Some(initiator.clone()),
            audit_info.created_at,
        );

        Self {
            id: RequisitionId::new(),
            facility_id: params.facility_id,
            program_id: params.program_id,
            processing_period_id: params.processing_period_id,
            supervisory_node_id: params.supervisory_node_id,
            supplying_facility_id: None,
            template_id: params.template_id,
            status: RequisitionStatus::Initiated,
            emergency: params.emergency,
            number_of_months_in_period: params.number_of_months_in_period,
            draft_status_message: None,
            date_physical_stock_count_completed: None,
            line_items: params.line_items,
            available_non_full_supply_products: params.available_non_full_supply_products,
            status_changes: vec![initial],
            version: 1,
            audit_info,
        }
    }

    pub fn restore(parts: RequisitionParts) -> Self {
        Self {
            id: parts.id,
            facility_id: parts.facility_id,
            program_id: parts.program_id,
            processing_period_id: parts.processing_period_id,
            supervisory_node_id: parts.supervisory_node_id,
            supplying_facility_id: parts.supplying_facility_id,
            template_id: parts.template_id,
            status: parts.status,
            emergency: parts.emergency,
            number_of_months_in_period: parts.number_of_months_in_period,
            draft_status_message: parts.draft_status_message,
            date_physical_stock_count_completed: parts.date_physical_stock_count_completed,
            line_items: parts.line_items,
            available_non_full_supply_products: parts.available_non_full_supply_products,
            status_changes: parts.status_changes,
            version: parts.version,
            audit_info: parts.audit_info,
        }
    }

    // ========== Getters ==========

    pub fn facility_id(&self) -> &FacilityId {
        &self.facility_id
    }

    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    pub fn processing_period_id(&self) -> &ProcessingPeriodId {
        &self.processing_period_id
    }

    pub fn supervisory_node_id(&self) -> Option<&SupervisoryNodeId> {
        self.supervisory_node_id.as_ref()
    }

    pub fn supplying_facility_id(&self) -> Option<&FacilityId> {
        self.supplying_facility_id.as_ref()
    }

    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    pub fn status(&self) -> RequisitionStatus {
        self.status
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    pub fn number_of_months_in_period(&self) -> u32 {
        self.number_of_months_in_period
    }

    pub fn draft_status_message(&self) -> Option<&str> {
        self.draft_status_message.as_deref()
    }

    pub fn date_physical_stock_count_completed(&self) -> Option<NaiveDate> {
        self.date_physical_stock_count_completed
    }

    pub fn line_items(&self) -> &[RequisitionLineItem] {
        &self.line_items
    }

    pub(crate) fn line_items_mut(&mut self) -> &mut [RequisitionLineItem] {
        &mut self.line_items
    }

    pub fn available_non_full_supply_products(&self) -> &BTreeSet<OrderableId> {
        &self.available_non_full_supply_products
    }

    pub fn status_changes(&self) -> &[StatusChange] {
        &self.status_changes
    }

    /// 未跳过的行
    pub fn non_skipped_line_items(&self) -> impl Iterator<Item = &RequisitionLineItem> {
        self.line_items.iter().filter(|item| !item.is_skipped())
    }

    pub fn non_skipped_full_supply_line_items(
        &self,
    ) -> impl Iterator<Item = &RequisitionLineItem> {
        self.non_skipped_line_items()
            .filter(|item| !item.is_non_full_supply())
    }

    pub fn non_skipped_non_full_supply_line_items(
        &self,
    ) -> impl Iterator<Item = &RequisitionLineItem> {
        self.non_skipped_line_items()
            .filter(|item| item.is_non_full_supply())
    }

    pub fn find_line_item_by_product(&self, orderable_id: &OrderableId) -> Option<&RequisitionLineItem> {
        self.line_items
            .iter()
            .find(|item| item.orderable_id() == orderable_id)
    }

    /// 未跳过行的总金额
    pub fn total_cost(&self) -> Money {
        self.non_skipped_line_items()
            .filter_map(|item| item.total_cost())
            .sum()
    }

    // ========== 修改 ==========

    /// 批量修改行数据
    ///
    /// 先检查全部修改，有任何错误则整体拒绝，行数据保持不变
    pub fn update_line_items(
        &mut self,
        updates: &[LineItemUpdate],
        template: &RequisitionTemplate,
    ) -> AppResult<()> {
        let phase = match self.status {
            s if s.is_pre_authorize() => ColumnPhase::Entry,
            s if s.is_approvable() => ColumnPhase::Approval,
            s => {
                return Err(AppError::field(
                    FIELD_STATUS,
                    Message::new(ERROR_CANNOT_UPDATE_WITH_STATUS).param(s),
                ));
            }
        };

        let mut working = self.line_items.clone();
        let mut errors = FieldErrors::new();

        for update in updates {
            let Some(item) = working
                .iter_mut()
                .find(|item| item.orderable_id() == &update.orderable_id)
            else {
                errors.add(
                    REQUISITION_LINE_ITEMS,
                    Message::new(ERROR_LINE_ITEM_NOT_FOUND).param(&update.orderable_id),
                );
                continue;
            };

            for (key, value) in &update.fields {
                if let Some(message) = check_editable(template, phase, key, value) {
                    errors.add(key.as_str(), message);
                    continue;
                }

                match value {
                    FieldValue::Quantity(v) => item.set_column_value(key, *v)?,
                    FieldValue::Text(v) => item.set_text_value(key, v.clone())?,
                    FieldValue::Flag(true) => {
                        if !item.skip() {
                            errors.add(
                                SKIPPED,
                                Message::new(ERROR_CANNOT_SKIP_NON_FULL_SUPPLY)
                                    .param(item.orderable_id()),
                            );
                        }
                    }
                    FieldValue::Flag(false) => item.unskip(),
                }
            }
        }

        if !errors.is_empty() {
            return Err(AppError::invalid_fields(errors));
        }

        self.line_items = working;
        Ok(())
    }

    /// 添加非全供应产品行
    pub fn add_non_full_supply_line_item(&mut self, item: RequisitionLineItem) -> AppResult<()> {
        if !self.status.is_pre_authorize() {
            return Err(AppError::field(
                FIELD_STATUS,
                Message::new(ERROR_CANNOT_UPDATE_WITH_STATUS).param(self.status),
            ));
        }

        let orderable_id = item.orderable_id().clone();
        if !item.is_non_full_supply()
            || !self.available_non_full_supply_products.contains(&orderable_id)
            || self.find_line_item_by_product(&orderable_id).is_some()
        {
            return Err(AppError::field(
                REQUISITION_LINE_ITEMS,
                Message::new(ERROR_NON_FULL_SUPPLY_NOT_AVAILABLE).param(orderable_id),
            ));
        }

        self.line_items.push(item);
        Ok(())
    }

    /// 实际盘点日期不能晚于今天
    pub fn set_date_physical_stock_count_completed(
        &mut self,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<()> {
        if let Some(date) = date
            && date > today
        {
            return Err(AppError::field(
                FIELD_DATE_PHYSICAL_STOCK_COUNT,
                Message::new(ERROR_DATE_STOCK_COUNT_IN_FUTURE).param(date),
            ));
        }
        self.date_physical_stock_count_completed = date;
        Ok(())
    }

    pub fn set_draft_status_message(&mut self, message: Option<String>) {
        self.draft_status_message = message.filter(|m| !m.trim().is_empty());
    }

    /// 指定供货机构，仅 APPROVED 状态可用
    pub fn assign_supplying_facility(&mut self, facility_id: FacilityId) -> AppResult<()> {
        if self.status != RequisitionStatus::Approved {
            return Err(AppError::failed_precondition(format!(
                "Supplying facility can only be assigned to an approved requisition, status is {}",
                self.status
            )));
        }
        self.supplying_facility_id = Some(facility_id);
        Ok(())
    }

    /// 写入新状态并追加审计记录，只由状态机调用
    pub(crate) fn apply_status_change(
        &mut self,
        target: RequisitionStatus,
        actor: &UserId,
        at: DateTime<Utc>,
    ) {
        let at = truncate_to_millis(at);
        self.status_changes.push(StatusChange::new(
            Some(self.status),
            target,
            Some(actor.clone()),
            at,
        ));
        self.status = target;
        self.audit_info.updated_at = at;
        self.audit_info.updated_by = Some(actor.clone());
    }

    pub(crate) fn touch(&mut self, actor: &UserId) {
        self.audit_info.update(Some(actor.clone()));
    }

    pub(crate) fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// 检查某列在当前阶段是否可编辑，返回错误消息
fn check_editable(
    template: &RequisitionTemplate,
    phase: ColumnPhase,
    key: &str,
    value: &FieldValue,
) -> Option<Message> {
    let Some(definition) = column_definition(key) else {
        return Some(Message::new(ERROR_COLUMN_NOT_IN_TEMPLATE).param(key));
    };

    if !template.contains(key) {
        return Some(Message::new(ERROR_COLUMN_NOT_IN_TEMPLATE).param(key));
    }

    if template.is_column_calculated(key) {
        return Some(Message::new(ERROR_CALCULATED_FIELD_NOT_EDITABLE).param(key));
    }

    if key == SKIPPED && !template.is_column_displayed(SKIPPED) {
        return Some(Message::new(ERROR_SKIP_NOT_ALLOWED));
    }

    if !template.is_column_user_input(key)
        || definition.kind != value.kind()
        || definition.phase != phase
    {
        return Some(Message::new(ERROR_FIELD_NOT_EDITABLE).param(key));
    }

    None
}

impl Entity for Requisition {
    type Id = RequisitionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Requisition {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

impl Versioned for Requisition {
    fn version(&self) -> i64 {
        self.version
    }
}
