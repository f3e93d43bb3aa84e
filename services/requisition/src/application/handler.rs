//! 业务处理器

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use lmis_common::{AuditInfo, PagedResult, UserId};
use lmis_domain_core::{AggregateRoot, Entity, Versioned};
use lmis_errors::{AppError, AppResult, Message};
use metrics::counter;
use tracing::{info, warn};

use super::commands::*;
use super::dto::{
    BasicRequisitionDto, FacilityDto, ReferenceDetails, RequisitionDto, RequisitionForConvertDto,
    to_record,
};
use super::order::{OrderDto, to_order};
use super::queries::*;
use crate::domain::engine::StatusTransitionEngine;
use crate::domain::entities::{
    InitiateParams, RejectionReasonCategory, Requisition, RequisitionLineItem,
    RequisitionTemplate,
};
use crate::domain::enums::RequisitionStatus;
use crate::domain::messages::{
    ERROR_NON_FULL_SUPPLY_NOT_AVAILABLE, ERROR_SUPPLYING_FACILITY_NOT_AVAILABLE,
    FIELD_SUPPLYING_FACILITY,
};
use crate::domain::repositories::{
    RejectionReasonCategoryRepository, RequisitionRepository, TemplateRepository,
};
use crate::domain::services::{
    ApprovedProductRecord, FacilityRecord, PeriodRecord, ReferenceDataLookup,
    ensure_supports_program,
};
use crate::domain::value_objects::columns::{BEGINNING_BALANCE, REQUISITION_LINE_ITEMS};
use crate::domain::value_objects::{
    FacilityId, OrderableId, ProgramId, RequisitionId, SupervisoryNodeId,
};

pub struct ServiceHandler {
    requisition_repo: Arc<dyn RequisitionRepository>,
    template_repo: Arc<dyn TemplateRepository>,
    rejection_reason_repo: Arc<dyn RejectionReasonCategoryRepository>,
    reference_data: Arc<dyn ReferenceDataLookup>,
    engine: StatusTransitionEngine,
}

impl ServiceHandler {
    pub fn new(
        requisition_repo: Arc<dyn RequisitionRepository>,
        template_repo: Arc<dyn TemplateRepository>,
        rejection_reason_repo: Arc<dyn RejectionReasonCategoryRepository>,
        reference_data: Arc<dyn ReferenceDataLookup>,
        engine: StatusTransitionEngine,
    ) -> Self {
        Self {
            requisition_repo,
            template_repo,
            rejection_reason_repo,
            reference_data,
            engine,
        }
    }

    // ========== 申请单 ==========

    /// 发起申请单
    pub async fn initiate(&self, cmd: InitiateRequisitionCommand) -> AppResult<Requisition> {
        info!(
            facility_id = %cmd.facility_id,
            program_id = %cmd.program_id,
            period_id = %cmd.processing_period_id,
            emergency = cmd.emergency,
            "Initiating requisition"
        );

        // 1. 机构须支持该项目
        let facility = self
            .reference_data
            .find_facility(&cmd.facility_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Facility {} not found", cmd.facility_id)))?;
        ensure_supports_program(&facility, &cmd.program_id, Utc::now().date_naive())?;

        self.reference_data
            .find_program(&cmd.program_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Program {} not found", cmd.program_id)))?;
        let period = self
            .reference_data
            .find_period(&cmd.processing_period_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Processing period {} not found",
                    cmd.processing_period_id
                ))
            })?;

        // 2. 同一周期只能有一张常规申请单
        if !cmd.emergency
            && let Some(existing) = self
                .requisition_repo
                .find_regular(&cmd.facility_id, &cmd.program_id, &cmd.processing_period_id)
                .await?
        {
            return Err(AppError::conflict(format!(
                "Requisition {} already exists for this facility, program and period",
                existing.id()
            )));
        }

        // 3. 模板与产品
        let template = self
            .template_repo
            .find_for(&cmd.program_id, &facility.type_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No template for program {} and facility type {}",
                    cmd.program_id, facility.type_code
                ))
            })?;
        let products = self
            .reference_data
            .find_approved_products(&cmd.facility_id, &cmd.program_id)
            .await?;

        let history_size = template.number_of_periods_to_average().saturating_sub(1) as usize;
        let previous = if cmd.emergency {
            Vec::new()
        } else {
            self.previous_requisitions(&cmd.facility_id, &cmd.program_id, &period)
                .await?
        };

        let line_items = products
            .iter()
            .filter(|p| p.full_supply)
            .map(|p| build_full_supply_item(p, &template, &previous, history_size))
            .collect::<AppResult<Vec<_>>>()?;
        let available_non_full_supply_products: BTreeSet<OrderableId> = products
            .iter()
            .filter(|p| !p.full_supply)
            .map(|p| p.orderable.id.clone())
            .collect();

        // 4. 创建并计算
        let mut requisition = Requisition::initiate(
            InitiateParams {
                facility_id: cmd.facility_id,
                program_id: cmd.program_id,
                processing_period_id: cmd.processing_period_id,
                template_id: template.id().clone(),
                supervisory_node_id: cmd.supervisory_node_id,
                emergency: cmd.emergency,
                number_of_months_in_period: period.duration_in_months,
                line_items,
                available_non_full_supply_products,
            },
            &cmd.user_id,
        );
        self.engine
            .calculator()
            .recalculate(&mut requisition, &template)?;

        self.requisition_repo.save(&requisition).await?;
        counter!("requisitions_initiated_total", "emergency" => cmd.emergency.to_string())
            .increment(1);

        info!(
            requisition_id = %requisition.id(),
            line_items = requisition.line_items().len(),
            "Requisition initiated"
        );
        Ok(requisition)
    }

    /// 获取申请单
    pub async fn get_requisition(&self, query: GetRequisitionQuery) -> AppResult<Requisition> {
        self.load_requisition(&query.requisition_id).await
    }

    /// 导出申请单记录，附带模板与产品信息
    pub async fn export_requisition(&self, query: GetRequisitionQuery) -> AppResult<RequisitionDto> {
        let requisition = self.load_requisition(&query.requisition_id).await?;
        self.to_dto(&requisition).await
    }

    /// 组装导出记录，解析机构、项目、周期与产品
    pub async fn to_dto(&self, requisition: &Requisition) -> AppResult<RequisitionDto> {
        let template = self.load_template(requisition).await?;

        let ids: Vec<OrderableId> = requisition
            .line_items()
            .iter()
            .map(|item| item.orderable_id())
            .chain(requisition.available_non_full_supply_products())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let orderables: HashMap<_, _> = self
            .reference_data
            .find_orderables(&ids)
            .await?
            .into_iter()
            .map(|o| (o.id.clone(), o))
            .collect();

        let details = ReferenceDetails {
            orderables,
            ..self.reference_details(requisition).await?
        };
        Ok(to_record(requisition, &template, &details))
    }

    /// 更新草稿数据
    pub async fn update_requisition(&self, cmd: UpdateRequisitionCommand) -> AppResult<Requisition> {
        info!(
            requisition_id = %cmd.requisition_id,
            line_items = cmd.line_items.len(),
            "Updating requisition"
        );
        cmd.validate()?;

        let mut requisition = self.load_requisition(&cmd.requisition_id).await?;
        ensure_version(&requisition, cmd.version)?;
        let template = self.load_template(&requisition).await?;

        if !cmd.add_non_full_supply_products.is_empty() {
            let products = self
                .reference_data
                .find_approved_products(requisition.facility_id(), requisition.program_id())
                .await?;
            for orderable_id in &cmd.add_non_full_supply_products {
                let product = products
                    .iter()
                    .find(|p| !p.full_supply && &p.orderable.id == orderable_id)
                    .ok_or_else(|| {
                        AppError::field(
                            REQUISITION_LINE_ITEMS,
                            Message::new(ERROR_NON_FULL_SUPPLY_NOT_AVAILABLE).param(orderable_id),
                        )
                    })?;
                requisition.add_non_full_supply_line_item(RequisitionLineItem::non_full_supply(
                    orderable_id.clone(),
                    product.packaging,
                    product.price_per_pack,
                    product.max_periods_of_stock,
                ))?;
            }
        }

        requisition.update_line_items(&cmd.line_items, &template)?;
        if cmd.draft_status_message.is_some() {
            requisition.set_draft_status_message(cmd.draft_status_message);
        }
        if cmd.date_physical_stock_count_completed.is_some() {
            requisition.set_date_physical_stock_count_completed(
                cmd.date_physical_stock_count_completed,
                Utc::now().date_naive(),
            )?;
        }

        self.engine
            .calculator()
            .recalculate(&mut requisition, &template)?;
        requisition.touch(&cmd.user_id);

        let version = self.requisition_repo.update(&requisition, cmd.version).await?;
        requisition.set_version(version);

        info!(requisition_id = %requisition.id(), version, "Requisition updated");
        Ok(requisition)
    }

    /// 状态转换
    pub async fn transition(&self, cmd: TransitionRequisitionCommand) -> AppResult<Requisition> {
        cmd.validate()?;

        let requisition = self.load_requisition(&cmd.requisition_id).await?;
        ensure_version(&requisition, cmd.version)?;
        let template = self.load_template(&requisition).await?;

        let mut updated = self.attempt(&requisition, &template, cmd.target, &cmd.user_id)?;
        if cmd.target == RequisitionStatus::Rejected {
            updated.set_draft_status_message(cmd.reason);
        }

        self.persist(updated, cmd.version).await
    }

    /// 转订单：指定供货机构后转为 RELEASED
    pub async fn convert_to_order(&self, cmd: ConvertToOrderCommand) -> AppResult<OrderDto> {
        cmd.validate()?;

        let mut requisition = self.load_requisition(&cmd.requisition_id).await?;
        ensure_version(&requisition, cmd.version)?;
        let template = self.load_template(&requisition).await?;

        self.reference_data
            .find_facility(&cmd.supplying_facility_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Supplying facility {} not found",
                    cmd.supplying_facility_id
                ))
            })?;
        // 供货机构须在供应线上
        let depots = self.available_depots(&requisition).await?;
        if !depots.iter().any(|d| d.id == cmd.supplying_facility_id) {
            return Err(AppError::field(
                FIELD_SUPPLYING_FACILITY,
                Message::new(ERROR_SUPPLYING_FACILITY_NOT_AVAILABLE).param(&cmd.supplying_facility_id),
            ));
        }
        requisition.assign_supplying_facility(cmd.supplying_facility_id.clone())?;

        let released = self.attempt(
            &requisition,
            &template,
            RequisitionStatus::Released,
            &cmd.user_id,
        )?;
        let released = self.persist(released, cmd.version).await?;

        let order = to_order(
            &released,
            cmd.supplying_facility_id,
            cmd.user_id,
            Utc::now(),
        );
        info!(
            requisition_id = %released.id(),
            order_code = %order.order_code,
            "Requisition converted to order"
        );
        Ok(order)
    }

    /// 待转订单列表：已批准的申请单及各自可选的供货机构
    pub async fn requisitions_for_convert(
        &self,
        query: RequisitionsForConvertQuery,
    ) -> AppResult<PagedResult<RequisitionForConvertDto>> {
        let page = self
            .requisition_repo
            .search_approved(
                query.facility_id.as_ref(),
                query.program_id.as_ref(),
                query.pagination,
            )
            .await?;

        // 同一项目与监管节点的申请单共用供应线
        let mut depots_by_line: HashMap<(ProgramId, Option<SupervisoryNodeId>), Vec<FacilityDto>> =
            HashMap::new();
        let mut content = Vec::with_capacity(page.content.len());
        for requisition in &page.content {
            let key = (
                requisition.program_id().clone(),
                requisition.supervisory_node_id().cloned(),
            );
            if !depots_by_line.contains_key(&key) {
                let depots = self.available_depots(requisition).await?;
                depots_by_line.insert(key.clone(), depots.iter().map(FacilityDto::from).collect());
            }
            let supplying_depots = depots_by_line.get(&key).cloned().unwrap_or_default();

            let details = self.reference_details(requisition).await?;
            content.push(RequisitionForConvertDto {
                requisition: BasicRequisitionDto::new(requisition, &details),
                supplying_depots,
            });
        }

        Ok(PagedResult::new(content, page.total_elements, &query.pagination))
    }

    /// 申请单可选的供货机构
    pub async fn supplying_depots(&self, query: GetSupplyingDepotsQuery) -> AppResult<Vec<FacilityRecord>> {
        let requisition = self.load_requisition(&query.requisition_id).await?;
        self.available_depots(&requisition).await
    }

    /// 搜索申请单
    pub async fn search(&self, query: SearchRequisitionsQuery) -> AppResult<PagedResult<Requisition>> {
        self.requisition_repo
            .search(&query.filter, query.pagination)
            .await
    }

    // ========== 列模板 ==========

    pub async fn get_template(&self, query: GetTemplateQuery) -> AppResult<RequisitionTemplate> {
        self.template_repo
            .find_by_id(&query.template_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Template {} not found", query.template_id)))
    }

    /// 保存列模板
    pub async fn save_template(&self, cmd: SaveTemplateCommand) -> AppResult<RequisitionTemplate> {
        let user_id = cmd.user_id.clone();
        let mut template = cmd.into_template()?;

        let audit_info = match self.template_repo.find_by_id(template.id()).await? {
            Some(existing) => {
                let mut audit_info = existing.audit_info().clone();
                audit_info.update(Some(user_id));
                audit_info
            }
            None => AuditInfo::new(Some(user_id)),
        };
        *template.audit_info_mut() = audit_info;

        self.template_repo.save(&template).await?;
        info!(template_id = %template.id(), "Template saved");
        Ok(template)
    }

    // ========== 驳回原因分类 ==========

    pub async fn list_rejection_reason_categories(&self) -> AppResult<Vec<RejectionReasonCategory>> {
        self.rejection_reason_repo.find_all().await
    }

    pub async fn get_rejection_reason_category(
        &self,
        query: GetRejectionReasonCategoryQuery,
    ) -> AppResult<RejectionReasonCategory> {
        self.rejection_reason_repo
            .find_by_id(&query.category_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Rejection reason category {} not found",
                    query.category_id
                ))
            })
    }

    /// 保存驳回原因分类，已存在时沿用创建信息
    pub async fn save_rejection_reason_category(
        &self,
        cmd: SaveRejectionReasonCategoryCommand,
    ) -> AppResult<RejectionReasonCategory> {
        let user_id = cmd.user_id.clone();
        let incoming = cmd.into_category()?;

        let category = match self.rejection_reason_repo.find_by_id(incoming.id()).await? {
            Some(mut existing) => {
                existing.update_from(&incoming);
                existing.audit_info_mut().update(Some(user_id));
                existing
            }
            None => {
                let mut category = incoming;
                *category.audit_info_mut() = AuditInfo::new(Some(user_id));
                category
            }
        };

        self.rejection_reason_repo.save(&category).await?;
        info!(
            category_id = %category.id(),
            code = category.code(),
            "Rejection reason category saved"
        );
        Ok(category)
    }

    // ========== 内部 ==========

    /// 机构、项目、周期的展示信息
    async fn reference_details(&self, requisition: &Requisition) -> AppResult<ReferenceDetails> {
        Ok(ReferenceDetails {
            facility: self.reference_data.find_facility(requisition.facility_id()).await?,
            program: self.reference_data.find_program(requisition.program_id()).await?,
            period: self
                .reference_data
                .find_period(requisition.processing_period_id())
                .await?,
            orderables: HashMap::new(),
        })
    }

    /// 供应线上为该申请单项目与监管节点供货的机构；没有监管节点时为空
    async fn available_depots(&self, requisition: &Requisition) -> AppResult<Vec<FacilityRecord>> {
        let Some(node_id) = requisition.supervisory_node_id() else {
            return Ok(Vec::new());
        };

        let lines = self
            .reference_data
            .find_supply_lines(requisition.program_id(), node_id)
            .await?;
        let mut depots: Vec<FacilityRecord> = Vec::with_capacity(lines.len());
        for line in lines {
            if depots.iter().any(|d| d.id == line.supplying_facility_id) {
                continue;
            }
            match self.reference_data.find_facility(&line.supplying_facility_id).await? {
                Some(facility) => depots.push(facility),
                None => warn!(
                    facility_id = %line.supplying_facility_id,
                    supervisory_node_id = %node_id,
                    "Supplying facility of supply line not found"
                ),
            }
        }
        Ok(depots)
    }

    async fn load_requisition(&self, id: &RequisitionId) -> AppResult<Requisition> {
        self.requisition_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Requisition {} not found", id)))
    }

    async fn load_template(&self, requisition: &Requisition) -> AppResult<RequisitionTemplate> {
        self.template_repo
            .find_by_id(requisition.template_id())
            .await?
            .ok_or_else(|| {
                AppError::illegal_state(format!(
                    "Template {} of requisition {} is missing",
                    requisition.template_id(),
                    requisition.id()
                ))
            })
    }

    /// 本期之前的常规申请单，按周期开始日期倒序
    async fn previous_requisitions(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
        current: &PeriodRecord,
    ) -> AppResult<Vec<Requisition>> {
        let candidates = self
            .requisition_repo
            .find_regular_history(facility_id, program_id)
            .await?;

        let mut dated = Vec::with_capacity(candidates.len());
        for requisition in candidates {
            let Some(period) = self
                .reference_data
                .find_period(requisition.processing_period_id())
                .await?
            else {
                warn!(
                    requisition_id = %requisition.id(),
                    period_id = %requisition.processing_period_id(),
                    "Period of previous requisition not found"
                );
                continue;
            };
            if period.start_date < current.start_date {
                dated.push((period.start_date, requisition));
            }
        }

        dated.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(dated.into_iter().map(|(_, r)| r).collect())
    }

    /// 调用状态机并记录指标
    fn attempt(
        &self,
        requisition: &Requisition,
        template: &RequisitionTemplate,
        target: RequisitionStatus,
        actor: &UserId,
    ) -> AppResult<Requisition> {
        let from = requisition.status();
        let result = self
            .engine
            .attempt_transition(requisition, template, target, actor);

        let outcome = match &result {
            Ok(_) => "applied",
            Err(AppError::InvalidFields(_)) => "rejected",
            Err(_) => "failed",
        };
        counter!(
            "requisition_transitions_total",
            "from" => from.as_str(),
            "to" => target.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        if let Err(e) = &result
            && !e.is_user_error()
        {
            warn!(requisition_id = %requisition.id(), error = %e, "Transition failed");
        }
        result
    }

    async fn persist(&self, mut requisition: Requisition, expected_version: i64) -> AppResult<Requisition> {
        let version = self
            .requisition_repo
            .update(&requisition, expected_version)
            .await?;
        requisition.set_version(version);
        Ok(requisition)
    }
}

/// 调用方读到的版本须与当前一致
fn ensure_version(requisition: &Requisition, expected: i64) -> AppResult<()> {
    if requisition.is_stale(expected) {
        return Err(AppError::conflict(format!(
            "Requisition {} has version {}, expected {}",
            requisition.id(),
            requisition.version(),
            expected
        )));
    }
    Ok(())
}

/// 全供应行：期初余额取上一期库存，历史调整消耗量取最近几期
///
/// `previous` 按周期倒序；没有填值的上期（未填报或跳过）不参与
fn build_full_supply_item(
    product: &ApprovedProductRecord,
    template: &RequisitionTemplate,
    previous: &[Requisition],
    history_size: usize,
) -> AppResult<RequisitionLineItem> {
    let orderable_id = &product.orderable.id;
    let mut item = RequisitionLineItem::full_supply(
        orderable_id.clone(),
        product.packaging,
        product.price_per_pack,
        product.max_periods_of_stock,
    );

    let previous_items: Vec<&RequisitionLineItem> = previous
        .iter()
        .filter(|r| r.status() != RequisitionStatus::Skipped)
        .filter_map(|r| r.find_line_item_by_product(orderable_id))
        .filter(|i| !i.is_skipped())
        .collect();

    if template.is_column_calculated(BEGINNING_BALANCE)
        && let Some(stock_on_hand) = previous_items.iter().find_map(|i| i.stock_on_hand())
    {
        item.set_column_value(BEGINNING_BALANCE, Some(stock_on_hand))?;
    }

    // 最近的在前，历史按时间正序
    let mut history: Vec<i64> = previous_items
        .iter()
        .filter_map(|i| i.adjusted_consumption())
        .take(history_size)
        .collect();
    history.reverse();
    item.set_previous_adjusted_consumptions(history);

    Ok(item)
}
