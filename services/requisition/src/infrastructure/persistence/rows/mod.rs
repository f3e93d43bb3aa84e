//! 数据库行映射结构

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// 申请单数据库行
#[derive(Debug, FromRow)]
pub struct RequisitionRow {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub program_id: Uuid,
    pub processing_period_id: Uuid,
    pub supervisory_node_id: Option<Uuid>,
    pub supplying_facility_id: Option<Uuid>,
    pub template_id: Uuid,
    pub status: String,
    pub emergency: bool,
    pub number_of_months_in_period: i32,
    pub draft_status_message: Option<String>,
    pub date_physical_stock_count_completed: Option<NaiveDate>,
    pub available_non_full_supply_products: serde_json::Value,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 申请单行数据库行
#[derive(Debug, FromRow)]
pub struct LineItemRow {
    pub id: Uuid,
    pub requisition_id: Uuid,
    pub orderable_id: Uuid,
    pub quantities: serde_json::Value,
    pub remarks: Option<String>,
    pub requested_quantity_explanation: Option<String>,
    pub price_per_pack: Decimal,
    pub total_cost: Option<Decimal>,
    pub non_full_supply: bool,
    pub skipped: bool,
    pub net_content: i64,
    pub pack_rounding_threshold: i64,
    pub round_to_zero: bool,
    pub max_periods_of_stock: Decimal,
    pub previous_adjusted_consumptions: serde_json::Value,
}

/// 状态变更数据库行
#[derive(Debug, FromRow)]
pub struct StatusChangeRow {
    pub requisition_id: Uuid,
    pub previous_status: Option<String>,
    pub status: String,
    pub author_id: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
}

/// 列模板数据库行
#[derive(Debug, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub program_id: Uuid,
    pub facility_type_code: Option<String>,
    pub number_of_periods_to_average: i32,
    pub columns: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 驳回原因分类数据库行
#[derive(Debug, FromRow)]
pub struct RejectionReasonCategoryRow {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}
