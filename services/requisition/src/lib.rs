//! requisition - 申请单服务
//!
//! 列模板、申请单行计算、校验与状态流转

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

use axum::Router;
use lmis_bootstrap::Infrastructure;
use lmis_domain_core::Entity;
use lmis_errors::{AppError, AppResult};
use tracing::info;

use api::{AppState, routes};
use application::ServiceHandler;
use domain::calculation::CalculationSettings;
use domain::engine::StatusTransitionEngine;
use domain::repositories::{
    RejectionReasonCategoryRepository, RequisitionRepository, TemplateRepository,
};
use infrastructure::persistence::{
    InMemoryRejectionReasonCategoryRepository, InMemoryRequisitionRepository,
    InMemoryTemplateRepository, PostgresRejectionReasonCategoryRepository,
    PostgresRequisitionRepository, PostgresTemplateRepository, migrations,
};
use infrastructure::reference_data::{InMemoryReferenceData, ReferenceDataSeed};

/// 按配置装配仓储、参考数据与处理器
pub async fn build_state(infra: &Infrastructure) -> AppResult<AppState> {
    let config = &infra.config().requisition;

    let days_in_month = u32::try_from(config.days_in_month)
        .ok()
        .filter(|days| *days > 0)
        .ok_or_else(|| {
            AppError::validation(format!(
                "requisition.days_in_month must be positive, got {}",
                config.days_in_month
            ))
        })?;

    let (requisition_repo, template_repo, rejection_reason_repo): (
        Arc<dyn RequisitionRepository>,
        Arc<dyn TemplateRepository>,
        Arc<dyn RejectionReasonCategoryRepository>,
    ) = match infra.postgres_pool() {
        Some(pool) => {
            infra.run_migrations(&migrations()).await?;
            (
                Arc::new(PostgresRequisitionRepository::new(pool.clone())),
                Arc::new(PostgresTemplateRepository::new(pool.clone())),
                Arc::new(PostgresRejectionReasonCategoryRepository::new(pool)),
            )
        }
        None => (
            Arc::new(InMemoryRequisitionRepository::new()),
            Arc::new(InMemoryTemplateRepository::new()),
            Arc::new(InMemoryRejectionReasonCategoryRepository::new()),
        ),
    };

    let seed = match &config.reference_data_file {
        Some(path) => ReferenceDataSeed::from_file(path).await?,
        None => ReferenceDataSeed::default(),
    };
    // 已存在的模板不覆盖
    for template in seed.templates()? {
        if template_repo.find_by_id(template.id()).await?.is_none() {
            template_repo.save(&template).await?;
            info!(template_id = %template.id(), "Seeded requisition template");
        }
    }
    let reference_data = Arc::new(InMemoryReferenceData::new(seed));

    let engine = StatusTransitionEngine::new(CalculationSettings { days_in_month });
    let handler = ServiceHandler::new(
        requisition_repo,
        template_repo,
        rejection_reason_repo,
        reference_data,
        engine,
    );

    Ok(AppState {
        handler: Arc::new(handler),
        default_page_size: config.default_page_size,
    })
}

/// 构建业务路由
pub async fn build_router(infra: Infrastructure) -> AppResult<Router> {
    let state = build_state(&infra).await?;
    info!(database = infra.has_database(), "Requisition service initialized");
    Ok(routes(state))
}
