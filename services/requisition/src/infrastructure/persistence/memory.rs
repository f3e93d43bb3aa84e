//! 内存仓储实现，用于本地开发与测试

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lmis_common::{PagedResult, Pagination};
use lmis_domain_core::{AggregateRoot, Entity, Versioned};
use lmis_errors::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::domain::entities::{RejectionReasonCategory, Requisition, RequisitionTemplate};
use crate::domain::repositories::{
    RejectionReasonCategoryRepository, RequisitionFilter, RequisitionRepository,
    TemplateRepository,
};
use crate::domain::value_objects::{
    FacilityId, ProcessingPeriodId, ProgramId, RejectionReasonCategoryId, RequisitionId,
    TemplateId,
};

// ============================================================================
// RequisitionRepository 实现
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryRequisitionRepository {
    store: Arc<RwLock<HashMap<RequisitionId, Requisition>>>,
}

impl InMemoryRequisitionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 按创建时间倒序
fn newest_first(a: &Requisition, b: &Requisition) -> std::cmp::Ordering {
    b.audit_info()
        .created_at
        .cmp(&a.audit_info().created_at)
        .then_with(|| b.id().cmp(a.id()))
}

#[async_trait]
impl RequisitionRepository for InMemoryRequisitionRepository {
    async fn find_by_id(&self, id: &RequisitionId) -> AppResult<Option<Requisition>> {
        Ok(self.store.read().await.get(id).cloned())
    }

    async fn save(&self, requisition: &Requisition) -> AppResult<()> {
        let mut store = self.store.write().await;
        if store.contains_key(requisition.id()) {
            return Err(AppError::conflict(format!(
                "Requisition {} already exists",
                requisition.id()
            )));
        }
        store.insert(requisition.id().clone(), requisition.clone());
        Ok(())
    }

    async fn update(&self, requisition: &Requisition, expected_version: i64) -> AppResult<i64> {
        let mut store = self.store.write().await;
        let current = store
            .get(requisition.id())
            .ok_or_else(|| AppError::not_found(format!("Requisition {} not found", requisition.id())))?;

        if current.is_stale(expected_version) {
            return Err(AppError::conflict(format!(
                "Requisition {} was modified concurrently",
                requisition.id()
            )));
        }

        let version = expected_version + 1;
        let mut stored = requisition.clone();
        stored.set_version(version);
        store.insert(requisition.id().clone(), stored);
        Ok(version)
    }

    async fn search(
        &self,
        filter: &RequisitionFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<Requisition>> {
        let store = self.store.read().await;
        let mut matched: Vec<&Requisition> = store.values().filter(|r| filter.matches(r)).collect();
        matched.sort_by(|a, b| newest_first(a, b));

        let total = matched.len() as u64;
        let content = matched
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .cloned()
            .collect();
        Ok(PagedResult::new(content, total, &pagination))
    }

    async fn find_regular(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
        processing_period_id: &ProcessingPeriodId,
    ) -> AppResult<Option<Requisition>> {
        let store = self.store.read().await;
        Ok(store
            .values()
            .find(|r| {
                !r.is_emergency()
                    && r.facility_id() == facility_id
                    && r.program_id() == program_id
                    && r.processing_period_id() == processing_period_id
            })
            .cloned())
    }

    async fn find_regular_history(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
    ) -> AppResult<Vec<Requisition>> {
        let store = self.store.read().await;
        let mut matched: Vec<&Requisition> = store
            .values()
            .filter(|r| {
                !r.is_emergency() && r.facility_id() == facility_id && r.program_id() == program_id
            })
            .collect();
        matched.sort_by(|a, b| newest_first(a, b));
        Ok(matched.into_iter().cloned().collect())
    }
}

// ============================================================================
// TemplateRepository 实现
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryTemplateRepository {
    store: Arc<RwLock<HashMap<TemplateId, RequisitionTemplate>>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置模板
    pub async fn with_templates(templates: impl IntoIterator<Item = RequisitionTemplate>) -> Self {
        let repo = Self::new();
        {
            let mut store = repo.store.write().await;
            for template in templates {
                store.insert(template.id().clone(), template);
            }
        }
        repo
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn find_by_id(&self, id: &TemplateId) -> AppResult<Option<RequisitionTemplate>> {
        Ok(self.store.read().await.get(id).cloned())
    }

    async fn find_for(
        &self,
        program_id: &ProgramId,
        facility_type_code: &str,
    ) -> AppResult<Option<RequisitionTemplate>> {
        let store = self.store.read().await;
        let mut program_wide = None;
        for template in store.values().filter(|t| t.program_id() == program_id) {
            match template.facility_type_code() {
                Some(code) if code == facility_type_code => return Ok(Some(template.clone())),
                None => program_wide = Some(template),
                Some(_) => {}
            }
        }
        Ok(program_wide.cloned())
    }

    async fn save(&self, template: &RequisitionTemplate) -> AppResult<()> {
        self.store
            .write()
            .await
            .insert(template.id().clone(), template.clone());
        Ok(())
    }
}

// ============================================================================
// RejectionReasonCategoryRepository 实现
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryRejectionReasonCategoryRepository {
    store: Arc<RwLock<HashMap<RejectionReasonCategoryId, RejectionReasonCategory>>>,
}

impl InMemoryRejectionReasonCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RejectionReasonCategoryRepository for InMemoryRejectionReasonCategoryRepository {
    async fn find_by_id(
        &self,
        id: &RejectionReasonCategoryId,
    ) -> AppResult<Option<RejectionReasonCategory>> {
        Ok(self.store.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<RejectionReasonCategory>> {
        let store = self.store.read().await;
        let mut categories: Vec<RejectionReasonCategory> = store.values().cloned().collect();
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    async fn save(&self, category: &RejectionReasonCategory) -> AppResult<()> {
        let mut store = self.store.write().await;
        if let Some(clash) = store.values().find(|other| {
            other.id() != category.id()
                && (other.name() == category.name() || other.code() == category.code())
        }) {
            return Err(AppError::conflict(format!(
                "Rejection reason category {} already uses name {} or code {}",
                clash.id(),
                category.name(),
                category.code()
            )));
        }
        store.insert(category.id().clone(), category.clone());
        Ok(())
    }
}
