//! 参考数据接口
//!
//! 机构、项目、周期、产品和供应线由其他服务维护，这里只读

use async_trait::async_trait;
use chrono::NaiveDate;
use lmis_domain_core::Money;
use lmis_errors::AppResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    FacilityId, OrderableId, PackagingRules, ProcessingPeriodId, ProgramId, SupervisoryNodeId,
};

/// 机构支持的项目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedProgram {
    pub program_id: ProgramId,
    pub support_active: bool,
    pub program_active: bool,
    #[serde(default)]
    pub support_start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
    pub id: FacilityId,
    pub code: String,
    pub name: String,
    pub type_code: String,
    #[serde(default)]
    pub supported_programs: Vec<SupportedProgram>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRecord {
    pub id: ProgramId,
    pub code: String,
    pub name: String,
}

/// 报告周期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRecord {
    pub id: ProcessingPeriodId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_in_months: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderableRecord {
    pub id: OrderableId,
    pub product_code: String,
    pub full_product_name: String,
    pub dispensable: String,
}

/// 机构在项目下可申请的产品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedProductRecord {
    pub orderable: OrderableRecord,
    pub full_supply: bool,
    pub price_per_pack: Money,
    pub max_periods_of_stock: Decimal,
    #[serde(default)]
    pub packaging: PackagingRules,
}

/// 供应线：某监管节点下某项目由哪个机构供货
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyLineRecord {
    pub supervisory_node_id: SupervisoryNodeId,
    pub program_id: ProgramId,
    pub supplying_facility_id: FacilityId,
}

/// 参考数据查询
#[async_trait]
pub trait ReferenceDataLookup: Send + Sync {
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
