//! PostgreSQL 仓储实现

use std::collections::HashMap;

use async_trait::async_trait;
use lmis_adapter_postgres::map_db_error;
use lmis_common::{PagedResult, Pagination};
use lmis_domain_core::{AggregateRoot, Entity, Versioned};
use lmis_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::domain::entities::{RejectionReasonCategory, Requisition, RequisitionTemplate};
use crate::domain::repositories::{
    RejectionReasonCategoryRepository, RequisitionFilter, RequisitionRepository,
    TemplateRepository,
};
use crate::domain::value_objects::{
    FacilityId, ProcessingPeriodId, ProgramId, RejectionReasonCategoryId, RequisitionId,
    TemplateId,
};

use super::converters::{
    rejection_reason_category_from_row, requisition_from_rows, template_from_row, to_json,
};
use super::rows::{
    LineItemRow, RejectionReasonCategoryRow, RequisitionRow, StatusChangeRow, TemplateRow,
};

const REQUISITION_COLUMNS: &str = r#"
    SELECT id, facility_id, program_id, processing_period_id, supervisory_node_id,
           supplying_facility_id, template_id, status, emergency, number_of_months_in_period,
           draft_status_message, date_physical_stock_count_completed,
           available_non_full_supply_products, version,
           created_at, created_by, updated_at, updated_by
    FROM requisitions
"#;

// ============================================================================
// RequisitionRepository 实现
// ============================================================================

pub struct PostgresRequisitionRepository {
    pool: PgPool,
}

impl PostgresRequisitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 批量加载行明细与状态变更并组装
    async fn assemble(&self, rows: Vec<RequisitionRow>) -> AppResult<Vec<Requisition>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let line_items = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT id, requisition_id, orderable_id, quantities, remarks,
                   requested_quantity_explanation, price_per_pack, total_cost,
                   non_full_supply, skipped, net_content, pack_rounding_threshold,
                   round_to_zero, max_periods_of_stock, previous_adjusted_consumptions
            FROM requisition_line_items
            WHERE requisition_id = ANY($1)
            ORDER BY requisition_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load requisition line items", e))?;

        let status_changes = sqlx::query_as::<_, StatusChangeRow>(
            r#"
            SELECT requisition_id, previous_status, status, author_id, changed_at
            FROM status_changes
            WHERE requisition_id = ANY($1)
            ORDER BY requisition_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load status changes", e))?;

        let mut items_by_requisition: HashMap<Uuid, Vec<LineItemRow>> = HashMap::new();
        for item in line_items {
            items_by_requisition.entry(item.requisition_id).or_default().push(item);
        }
        let mut changes_by_requisition: HashMap<Uuid, Vec<StatusChangeRow>> = HashMap::new();
        for change in status_changes {
            changes_by_requisition.entry(change.requisition_id).or_default().push(change);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_requisition.remove(&row.id).unwrap_or_default();
                let changes = changes_by_requisition.remove(&row.id).unwrap_or_default();
                requisition_from_rows(row, items, changes)
            })
            .collect()
    }

    async fn fetch_one(&self, row: Option<RequisitionRow>) -> AppResult<Option<Requisition>> {
        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }
}

/// 整体替换子表数据
async fn replace_children(
    tx: &mut Transaction<'_, Postgres>,
    requisition: &Requisition,
) -> AppResult<()> {
    let requisition_id = requisition.id().0;

    sqlx::query("DELETE FROM requisition_line_items WHERE requisition_id = $1")
        .bind(requisition_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error("Failed to clear line items", e))?;
    sqlx::query("DELETE FROM status_changes WHERE requisition_id = $1")
        .bind(requisition_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error("Failed to clear status changes", e))?;

    for (position, item) in requisition.line_items().iter().enumerate() {
        let packaging = item.packaging();
        sqlx::query(
            r#"
            INSERT INTO requisition_line_items (
                id, requisition_id, position, orderable_id, quantities, remarks,
                requested_quantity_explanation, price_per_pack, total_cost,
                non_full_supply, skipped, net_content, pack_rounding_threshold,
                round_to_zero, max_periods_of_stock, previous_adjusted_consumptions
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(item.id().0)
        .bind(requisition_id)
        .bind(position as i32)
        .bind(item.orderable_id().0)
        .bind(to_json(item.values())?)
        .bind(item.remarks())
        .bind(item.requested_quantity_explanation())
        .bind(item.price_per_pack().amount())
        .bind(item.total_cost().map(|c| c.amount()))
        .bind(item.is_non_full_supply())
        .bind(item.is_skipped())
        .bind(packaging.net_content)
        .bind(packaging.pack_rounding_threshold)
        .bind(packaging.round_to_zero)
        .bind(item.max_periods_of_stock())
        .bind(to_json(&item.previous_adjusted_consumptions())?)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error("Failed to insert line item", e))?;
    }

    for (position, change) in requisition.status_changes().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO status_changes (
                requisition_id, position, previous_status, status, author_id, changed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(requisition_id)
        .bind(position as i32)
        .bind(change.previous_status.map(|s| s.as_str()))
        .bind(change.status.as_str())
        .bind(change.author_id.as_ref().map(|u| u.0))
        .bind(change.changed_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error("Failed to insert status change", e))?;
    }

    Ok(())
}

/// 追加过滤条件
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RequisitionFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(id) = &filter.facility_id {
        builder.push(" AND facility_id = ").push_bind(id.0);
    }
    if let Some(id) = &filter.program_id {
        builder.push(" AND program_id = ").push_bind(id.0);
    }
    if let Some(id) = &filter.processing_period_id {
        builder.push(" AND processing_period_id = ").push_bind(id.0);
    }
    if let Some(id) = &filter.supervisory_node_id {
        builder.push(" AND supervisory_node_id = ").push_bind(id.0);
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
        builder.push(" AND status = ANY(").push_bind(statuses).push(")");
    }
    if let Some(emergency) = filter.emergency {
        builder.push(" AND emergency = ").push_bind(emergency);
    }
    if let Some(date) = filter.initiated_date_from {
        builder.push(" AND (created_at AT TIME ZONE 'UTC')::date >= ").push_bind(date);
    }
    if let Some(date) = filter.initiated_date_to {
        builder.push(" AND (created_at AT TIME ZONE 'UTC')::date <= ").push_bind(date);
    }
    if let Some(at) = filter.modified_date_from {
        builder.push(" AND updated_at >= ").push_bind(at);
    }
    if let Some(at) = filter.modified_date_to {
        builder.push(" AND updated_at <= ").push_bind(at);
    }
}

#[async_trait]
impl RequisitionRepository for PostgresRequisitionRepository {
    async fn find_by_id(&self, id: &RequisitionId) -> AppResult<Option<Requisition>> {
        let row = sqlx::query_as::<_, RequisitionRow>(&format!("{REQUISITION_COLUMNS} WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to query requisition", e))?;

        self.fetch_one(row).await
    }

    async fn save(&self, requisition: &Requisition) -> AppResult<()> {
        let audit = requisition.audit_info();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO requisitions (
                id, facility_id, program_id, processing_period_id, supervisory_node_id,
                supplying_facility_id, template_id, status, emergency, number_of_months_in_period,
                draft_status_message, date_physical_stock_count_completed,
                available_non_full_supply_products, version,
                created_at, created_by, updated_at, updated_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(requisition.id().0)
        .bind(requisition.facility_id().0)
        .bind(requisition.program_id().0)
        .bind(requisition.processing_period_id().0)
        .bind(requisition.supervisory_node_id().map(|id| id.0))
        .bind(requisition.supplying_facility_id().map(|id| id.0))
        .bind(requisition.template_id().0)
        .bind(requisition.status().as_str())
        .bind(requisition.is_emergency())
        .bind(requisition.number_of_months_in_period() as i32)
        .bind(requisition.draft_status_message())
        .bind(requisition.date_physical_stock_count_completed())
        .bind(to_json(requisition.available_non_full_supply_products())?)
        .bind(requisition.version())
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|u| u.0))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to insert requisition", e))?;

        replace_children(&mut tx, requisition).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit requisition", e))
    }

    async fn update(&self, requisition: &Requisition, expected_version: i64) -> AppResult<i64> {
        let audit = requisition.audit_info();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE requisitions SET
                supervisory_node_id = $1,
                supplying_facility_id = $2,
                status = $3,
                draft_status_message = $4,
                date_physical_stock_count_completed = $5,
                available_non_full_supply_products = $6,
                updated_at = $7,
                updated_by = $8,
                version = version + 1
            WHERE id = $9 AND version = $10
            RETURNING version
            "#,
        )
        .bind(requisition.supervisory_node_id().map(|id| id.0))
        .bind(requisition.supplying_facility_id().map(|id| id.0))
        .bind(requisition.status().as_str())
        .bind(requisition.draft_status_message())
        .bind(requisition.date_physical_stock_count_completed())
        .bind(to_json(requisition.available_non_full_supply_products())?)
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|u| u.0))
        .bind(requisition.id().0)
        .bind(expected_version)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to update requisition", e))?;

        let Some(version) = version else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM requisitions WHERE id = $1)")
                    .bind(requisition.id().0)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| map_db_error("Failed to query requisition", e))?;
            return Err(if exists {
                AppError::conflict(format!(
                    "Requisition {} was modified concurrently",
                    requisition.id()
                ))
            } else {
                AppError::not_found(format!("Requisition {} not found", requisition.id()))
            });
        };

        replace_children(&mut tx, requisition).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit requisition", e))?;

        Ok(version)
    }

    async fn search(
        &self,
        filter: &RequisitionFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<Requisition>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM requisitions");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to count requisitions", e))?;

        let mut select = QueryBuilder::<Postgres>::new(REQUISITION_COLUMNS);
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit() as i64)
            .push(" OFFSET ")
            .push_bind(pagination.offset() as i64);
        let rows = select
            .build_query_as::<RequisitionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to search requisitions", e))?;

        let content = self.assemble(rows).await?;
        Ok(PagedResult::new(content, total.max(0) as u64, &pagination))
    }

    async fn find_regular(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
        processing_period_id: &ProcessingPeriodId,
    ) -> AppResult<Option<Requisition>> {
        let row = sqlx::query_as::<_, RequisitionRow>(&format!(
            "{REQUISITION_COLUMNS} WHERE facility_id = $1 AND program_id = $2 \
             AND processing_period_id = $3 AND emergency = FALSE"
        ))
        .bind(facility_id.0)
        .bind(program_id.0)
        .bind(processing_period_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to query regular requisition", e))?;

        self.fetch_one(row).await
    }

    async fn find_regular_history(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
    ) -> AppResult<Vec<Requisition>> {
        let rows = sqlx::query_as::<_, RequisitionRow>(&format!(
            "{REQUISITION_COLUMNS} WHERE facility_id = $1 AND program_id = $2 \
             AND emergency = FALSE ORDER BY created_at DESC, id DESC"
        ))
        .bind(facility_id.0)
        .bind(program_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to query previous requisitions", e))?;

        self.assemble(rows).await
    }
}

// ============================================================================
// TemplateRepository 实现
// ============================================================================

pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn find_by_id(&self, id: &TemplateId) -> AppResult<Option<RequisitionTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, program_id, facility_type_code, number_of_periods_to_average, columns,
                   created_at, created_by, updated_at, updated_by
            FROM requisition_templates
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to query template", e))?;

        row.map(template_from_row).transpose()
    }

    async fn find_for(
        &self,
        program_id: &ProgramId,
        facility_type_code: &str,
    ) -> AppResult<Option<RequisitionTemplate>> {
        // 专用模板优先
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, program_id, facility_type_code, number_of_periods_to_average, columns,
                   created_at, created_by, updated_at, updated_by
            FROM requisition_templates
            WHERE program_id = $1 AND (facility_type_code = $2 OR facility_type_code IS NULL)
            ORDER BY facility_type_code NULLS LAST, created_at
            LIMIT 1
            "#,
        )
        .bind(program_id.0)
        .bind(facility_type_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to query template", e))?;

        row.map(template_from_row).transpose()
    }

    async fn save(&self, template: &RequisitionTemplate) -> AppResult<()> {
        let audit = template.audit_info();

        sqlx::query(
            r#"
            INSERT INTO requisition_templates (
                id, program_id, facility_type_code, number_of_periods_to_average, columns,
                created_at, created_by, updated_at, updated_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                program_id = EXCLUDED.program_id,
                facility_type_code = EXCLUDED.facility_type_code,
                number_of_periods_to_average = EXCLUDED.number_of_periods_to_average,
                columns = EXCLUDED.columns,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(template.id().0)
        .bind(template.program_id().0)
        .bind(template.facility_type_code())
        .bind(template.number_of_periods_to_average() as i32)
        .bind(to_json(&template.columns())?)
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|u| u.0))
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to save template", e))?;

        Ok(())
    }
}

// ============================================================================
// RejectionReasonCategoryRepository 实现
// ============================================================================

pub struct PostgresRejectionReasonCategoryRepository {
    pool: PgPool,
}

impl PostgresRejectionReasonCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RejectionReasonCategoryRepository for PostgresRejectionReasonCategoryRepository {
    async fn find_by_id(
        &self,
        id: &RejectionReasonCategoryId,
    ) -> AppResult<Option<RejectionReasonCategory>> {
        let row = sqlx::query_as::<_, RejectionReasonCategoryRow>(
            r#"
            SELECT id, name, code, created_at, created_by, updated_at, updated_by
            FROM rejection_reason_categories
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to query rejection reason category", e))?;

        Ok(row.map(rejection_reason_category_from_row))
    }

    async fn find_all(&self) -> AppResult<Vec<RejectionReasonCategory>> {
        let rows = sqlx::query_as::<_, RejectionReasonCategoryRow>(
            r#"
            SELECT id, name, code, created_at, created_by, updated_at, updated_by
            FROM rejection_reason_categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to query rejection reason categories", e))?;

        Ok(rows.into_iter().map(rejection_reason_category_from_row).collect())
    }

    async fn save(&self, category: &RejectionReasonCategory) -> AppResult<()> {
        let audit = category.audit_info();

        // 名称或编码重复由唯一约束转为 Conflict
        sqlx::query(
            r#"
            INSERT INTO rejection_reason_categories (
                id, name, code, created_at, created_by, updated_at, updated_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                code = EXCLUDED.code,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(category.id().0)
        .bind(category.name())
        .bind(category.code())
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|u| u.0))
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to save rejection reason category", e))?;

        Ok(())
    }
}
