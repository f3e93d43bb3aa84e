//! 本地参考数据
//!
//! 从 JSON 种子文件加载机构、项目、周期、产品、供应线和模板

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use lmis_errors::{AppError, AppResult};
use serde::Deserialize;
use tracing::info;

use crate::domain::entities::{RequisitionTemplate, TemplateColumn};
use crate::domain::services::{
    ApprovedProductRecord, FacilityRecord, OrderableRecord, PeriodRecord, ProgramRecord,
    ReferenceDataLookup, SupplyLineRecord,
};
use crate::domain::value_objects::{
    FacilityId, OrderableId, ProcessingPeriodId, ProgramId, SupervisoryNodeId, TemplateId,
};

/// 机构在某项目下的可申请产品
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedProductsSeed {
    pub facility_id: FacilityId,
    pub program_id: ProgramId,
    pub products: Vec<ApprovedProductRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSeed {
    pub id: TemplateId,
    pub program_id: ProgramId,
    #[serde(default)]
    pub facility_type_code: Option<String>,
    pub number_of_periods_to_average: u32,
    pub columns: Vec<TemplateColumn>,
}

/// 种子文件内容
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceDataSeed {
    pub facilities: Vec<FacilityRecord>,
    pub programs: Vec<ProgramRecord>,
    pub periods: Vec<PeriodRecord>,
    pub orderables: Vec<OrderableRecord>,
    pub approved_products: Vec<ApprovedProductsSeed>,
    pub supply_lines: Vec<SupplyLineRecord>,
    pub templates: Vec<TemplateSeed>,
}

impl ReferenceDataSeed {
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::validation(format!("Invalid reference data: {}", e)))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::internal(format!(
                "Failed to read reference data {}: {}",
                path.display(),
                e
            ))
        })?;
        let seed = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            facilities = seed.facilities.len(),
            orderables = seed.orderables.len(),
            supply_lines = seed.supply_lines.len(),
            templates = seed.templates.len(),
            "Reference data loaded"
        );
        Ok(seed)
    }

    /// 校验并构造种子中的模板
    pub fn templates(&self) -> AppResult<Vec<RequisitionTemplate>> {
        self.templates
            .iter()
            .map(|seed| {
                RequisitionTemplate::new(
                    seed.id.clone(),
                    seed.program_id.clone(),
                    seed.facility_type_code.clone(),
                    seed.number_of_periods_to_average,
                    seed.columns.clone(),
                )
                .map_err(|e| {
                    AppError::validation(format!("Invalid template {}: {}", seed.id, e))
                })
            })
            .collect()
    }
}

/// 内存参考数据
#[derive(Debug, Default)]
pub struct InMemoryReferenceData {
    facilities: HashMap<FacilityId, FacilityRecord>,
    programs: HashMap<ProgramId, ProgramRecord>,
    periods: HashMap<ProcessingPeriodId, PeriodRecord>,
    orderables: HashMap<OrderableId, OrderableRecord>,
    approved_products: HashMap<(FacilityId, ProgramId), Vec<ApprovedProductRecord>>,
    supply_lines: Vec<SupplyLineRecord>,
}

impl InMemoryReferenceData {
    pub fn new(seed: ReferenceDataSeed) -> Self {
        let mut orderables: HashMap<OrderableId, OrderableRecord> = seed
            .orderables
            .into_iter()
            .map(|o| (o.id.clone(), o))
            .collect();

        let mut approved_products = HashMap::new();
        for entry in seed.approved_products {
            // 已批准产品中的产品也可按 ID 查询
            for product in &entry.products {
                orderables
                    .entry(product.orderable.id.clone())
                    .or_insert_with(|| product.orderable.clone());
            }
            approved_products
                .entry((entry.facility_id, entry.program_id))
                .or_insert_with(Vec::new)
                .extend(entry.products);
        }

        Self {
            facilities: seed.facilities.into_iter().map(|f| (f.id.clone(), f)).collect(),
            programs: seed.programs.into_iter().map(|p| (p.id.clone(), p)).collect(),
            periods: seed.periods.into_iter().map(|p| (p.id.clone(), p)).collect(),
            orderables,
            approved_products,
            supply_lines: seed.supply_lines,
        }
    }
}

#[async_trait]
impl ReferenceDataLookup for InMemoryReferenceData {
    async fn find_facility(&self, id: &FacilityId) -> AppResult<Option<FacilityRecord>> {
        Ok(self.facilities.get(id).cloned())
    }

    async fn find_program(&self, id: &ProgramId) -> AppResult<Option<ProgramRecord>> {
        Ok(self.programs.get(id).cloned())
    }

    async fn find_period(&self, id: &ProcessingPeriodId) -> AppResult<Option<PeriodRecord>> {
        Ok(self.periods.get(id).cloned())
    }

    async fn find_orderables(&self, ids: &[OrderableId]) -> AppResult<Vec<OrderableRecord>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.orderables.get(id).cloned())
            .collect())
    }

    async fn find_approved_products(
        &self,
        facility_id: &FacilityId,
        program_id: &ProgramId,
    ) -> AppResult<Vec<ApprovedProductRecord>> {
        Ok(self
            .approved_products
            .get(&(facility_id.clone(), program_id.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_supply_lines(
        &self,
        program_id: &ProgramId,
        supervisory_node_id: &SupervisoryNodeId,
    ) -> AppResult<Vec<SupplyLineRecord>> {
        Ok(self
            .supply_lines
            .iter()
            .filter(|line| {
                &line.program_id == program_id && &line.supervisory_node_id == supervisory_node_id
            })
            .cloned()
            .collect())
    }
}
