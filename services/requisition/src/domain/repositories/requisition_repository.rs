//! 申请单仓储接口

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lmis_common::{PagedResult, Pagination};
use lmis_errors::AppResult;

use crate::domain::entities::Requisition;
use crate::domain::enums::RequisitionStatus;
use crate::domain::value_objects::{
    FacilityId, ProcessingPeriodId, ProgramId, RequisitionId, SupervisoryNodeId,
};

/// 搜索条件，字段之间为“与”关系
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequisitionFilter {
    pub facility_id: Option<FacilityId>,
    pub program_id: Option<ProgramId>,
    pub processing_period_id: Option<ProcessingPeriodId>,
    pub supervisory_node_id: Option<SupervisoryNodeId>,
    /// 为空表示不限状态
    pub statuses: Vec<RequisitionStatus>,
    pub emergency: Option<bool>,
    pub initiated_date_from: Option<NaiveDate>,
    pub initiated_date_to: Option<NaiveDate>,
    pub modified_date_from: Option<DateTime<Utc>>,
    pub modified_date_to: Option<DateTime<Utc>>,
}

impl RequisitionFilter {
    /// 内存实现与测试共用的匹配逻辑
    pub fn matches(&self, requisition: &Requisition) -> bool {
        use lmis_domain_core::AggregateRoot;

        let audit = requisition.audit_info();
        let initiated = audit.created_at.date_naive();

        self.facility_id
            .as_ref()
            .is_none_or(|id| id == requisition.facility_id())
            && self
                .program_id
                .as_ref()
                .is_none_or(|id| id == requisition.program_id())
            && self
                .processing_period_id
                .as_ref()
                .is_none_or(|id| id == requisition.processing_period_id())
            && self
                .supervisory_node_id
                .as_ref()
                .is_none_or(|id| Some(id) == requisition.supervisory_node_id())
            && (self.statuses.is_empty() || self.statuses.contains(&requisition.status()))
            && self
                .emergency
                .is_none_or(|e| e == requisition.is_emergency())
            && self.initiated_date_from.is_none_or(|d| initiated >= d)
            && self.initiated_date_to.is_none_or(|d| initiated <= d)
            && self.modified_date_from.is_none_or(|d| audit.updated_at >= d)
            && self.modified_date_to.is_none_or(|d| audit.updated_at <= d)
    }
}

/// 申请单仓储接口
#[async_trait]
pub trait RequisitionRepository: Send + Sync {
    /// 根据 ID 查找
    async fn find_by_id(&self, id: &RequisitionId) -> AppResult<Option<Requisition>>;

    /// 新建
    async fn save(&self, requisition: &Requisition) -> AppResult<()>;

    /// 按版本条件更新，成功后返回新版本号；版本不符返回 Conflict
    async fn update(&self, requisition: &Requisition, expected_version: i64) -> AppResult<i64>;

    /// 分页搜索，按创建时间倒序
    async fn search(
        &self,
        filter: &RequisitionFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<Requisition>>;

    /// 查找某机构、项目、周期的常规申请单
    async fn find_regular(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
        processing_period_id: &ProcessingPeriodId,
    ) -> AppResult<Option<Requisition>>;

    /// 待转订单的已批准申请单，可按供货申请机构和项目缩小范围
    async fn search_approved(
        &self,
        facility_id: Option<&FacilityId>,
        program_id: Option<&ProgramId>,
        pagination: Pagination,
    ) -> AppResult<PagedResult<Requisition>> {
        let filter = RequisitionFilter {
            facility_id: facility_id.cloned(),
            program_id: program_id.cloned(),
            statuses: vec![RequisitionStatus::Approved],
            ..Default::default()
        };
        self.search(&filter, pagination).await
    }

    /// 某机构、项目的全部常规申请单；周期先后由调用方按参考数据排序
    async fn find_regular_history(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
    ) -> AppResult<Vec<Requisition>>;
}
