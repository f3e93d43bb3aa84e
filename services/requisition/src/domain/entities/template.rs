//! 列模板实体

use std::collections::HashSet;

use lmis_domain_core::{AggregateRoot, AuditInfo, Entity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::enums::ColumnSource;
use crate::domain::value_objects::columns::{STOCK_ON_HAND, TOTAL_CONSUMED_QUANTITY};
use crate::domain::value_objects::{ProgramId, TemplateId, column_definition};

/// 平均消耗量最少取两期
pub const MIN_PERIODS_TO_AVERAGE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column {column} cannot use source {column_source}")]
    UnsupportedSource {
        column: String,
        column_source: ColumnSource,
    },

    #[error("stockOnHand and totalConsumedQuantity cannot both be calculated")]
    BothStockColumnsCalculated,

    #[error("Number of periods to average must be at least {MIN_PERIODS_TO_AVERAGE}, got {0}")]
    TooFewPeriodsToAverage(u32),
}

/// 模板列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateColumn {
    pub key: String,
    pub label: String,
    pub source: ColumnSource,
    pub displayed: bool,
    pub required: bool,
}

impl TemplateColumn {
    pub fn new(key: impl Into<String>, source: ColumnSource) -> Self {
        let key = key.into();
        let label = column_definition(&key)
            .map(|d| d.label.to_string())
            .unwrap_or_else(|| key.clone());
        Self {
            key,
            label,
            source,
            displayed: true,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn is_calculated(&self) -> bool {
        self.source == ColumnSource::Calculated
    }
}

/// 列模板
///
/// 按项目（可选机构类型）配置，处理申请单期间只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequisitionTemplate {
    id: TemplateId,
    program_id: ProgramId,
    facility_type_code: Option<String>,
    number_of_periods_to_average: u32,
    columns: Vec<TemplateColumn>,
    audit_info: AuditInfo,
}

impl RequisitionTemplate {
    pub fn new(
        id: TemplateId,
        program_id: ProgramId,
        facility_type_code: Option<String>,
        number_of_periods_to_average: u32,
        columns: Vec<TemplateColumn>,
    ) -> Result<Self, TemplateError> {
        Self::restore(
            id,
            program_id,
            facility_type_code,
            number_of_periods_to_average,
            columns,
            AuditInfo::default(),
        )
    }

    /// 从存储恢复，同样执行校验
    pub fn restore(
        id: TemplateId,
        program_id: ProgramId,
        facility_type_code: Option<String>,
        number_of_periods_to_average: u32,
        columns: Vec<TemplateColumn>,
        audit_info: AuditInfo,
    ) -> Result<Self, TemplateError> {
        validate_columns(&columns)?;
        if number_of_periods_to_average < MIN_PERIODS_TO_AVERAGE {
            return Err(TemplateError::TooFewPeriodsToAverage(
                number_of_periods_to_average,
            ));
        }

        Ok(Self {
            id,
            program_id,
            facility_type_code,
            number_of_periods_to_average,
            columns,
            audit_info,
        })
    }

    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    pub fn facility_type_code(&self) -> Option<&str> {
        self.facility_type_code.as_deref()
    }

    pub fn number_of_periods_to_average(&self) -> u32 {
        self.number_of_periods_to_average
    }

    pub fn columns(&self) -> &[TemplateColumn] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&TemplateColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.column(key).is_some()
    }

    /// 列是否为计算列，未知列返回 false
    pub fn is_column_calculated(&self, key: &str) -> bool {
        self.column(key).is_some_and(TemplateColumn::is_calculated)
    }

    /// 列是否为用户录入列，未知列返回 false
    pub fn is_column_user_input(&self, key: &str) -> bool {
        self.column(key)
            .is_some_and(|c| c.source == ColumnSource::UserInput)
    }

    pub fn is_column_displayed(&self, key: &str) -> bool {
        self.column(key).is_some_and(|c| c.displayed)
    }

    pub fn is_column_required(&self, key: &str) -> bool {
        self.column(key).is_some_and(|c| c.displayed && c.required)
    }

    /// 显示的用户录入列
    pub fn displayed_user_input_columns(&self) -> impl Iterator<Item = &TemplateColumn> {
        self.columns
            .iter()
            .filter(|c| c.displayed && c.source == ColumnSource::UserInput)
    }
}

fn validate_columns(columns: &[TemplateColumn]) -> Result<(), TemplateError> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.key.as_str()) {
            return Err(TemplateError::DuplicateColumn(column.key.clone()));
        }

        let definition = column_definition(&column.key)
            .ok_or_else(|| TemplateError::UnknownColumn(column.key.clone()))?;

        let supported = match column.source {
            ColumnSource::Calculated => definition.can_be_calculated,
            ColumnSource::UserInput => definition.can_be_user_input,
            ColumnSource::ReferenceData => {
                !definition.can_be_calculated && !definition.can_be_user_input
            }
        };
        if !supported {
            return Err(TemplateError::UnsupportedSource {
                column: column.key.clone(),
                column_source: column.source,
            });
        }
    }

    let calculated = |key: &str| {
        columns
            .iter()
            .any(|c| c.key == key && c.is_calculated())
    };
    if calculated(STOCK_ON_HAND) && calculated(TOTAL_CONSUMED_QUANTITY) {
        return Err(TemplateError::BothStockColumnsCalculated);
    }

    Ok(())
}

impl Entity for RequisitionTemplate {
    type Id = TemplateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for RequisitionTemplate {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::columns::*;

    fn template(columns: Vec<TemplateColumn>) -> Result<RequisitionTemplate, TemplateError> {
        RequisitionTemplate::new(TemplateId::new(), ProgramId::new(), None, 3, columns)
    }

    #[test]
    fn test_column_lookups() {
        let template = template(vec![
            TemplateColumn::new(BEGINNING_BALANCE, ColumnSource::UserInput).required(),
            TemplateColumn::new(TOTAL_RECEIVED_QUANTITY, ColumnSource::Calculated),
            TemplateColumn::new(STOCK_ON_HAND, ColumnSource::Calculated).hidden(),
        ])
        .unwrap();

        assert!(template.is_column_calculated(TOTAL_RECEIVED_QUANTITY));
        assert!(!template.is_column_user_input(TOTAL_RECEIVED_QUANTITY));
        assert!(template.is_column_user_input(BEGINNING_BALANCE));
        assert!(template.is_column_required(BEGINNING_BALANCE));
        assert!(template.is_column_calculated(STOCK_ON_HAND));
        assert!(!template.is_column_displayed(STOCK_ON_HAND));
    }

    #[test]
    fn test_unknown_keys_return_false() {
        let template = template(vec![]).unwrap();
        assert!(!template.is_column_calculated("noSuchColumn"));
        assert!(!template.is_column_user_input("noSuchColumn"));
        assert!(!template.is_column_displayed(TOTAL));
        assert!(!template.is_column_required(TOTAL));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = template(vec![
            TemplateColumn::new(REMARKS, ColumnSource::UserInput),
            TemplateColumn::new(REMARKS, ColumnSource::UserInput),
        ]);
        assert_eq!(result, Err(TemplateError::DuplicateColumn(REMARKS.to_string())));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let result = template(vec![TemplateColumn::new("magic", ColumnSource::UserInput)]);
        assert_eq!(result, Err(TemplateError::UnknownColumn("magic".to_string())));
    }

    #[test]
    fn test_unsupported_source_rejected() {
        let result = template(vec![TemplateColumn::new(PACKS_TO_SHIP, ColumnSource::UserInput)]);
        assert!(matches!(result, Err(TemplateError::UnsupportedSource { .. })));

        let result = template(vec![TemplateColumn::new(REMARKS, ColumnSource::Calculated)]);
        assert!(matches!(result, Err(TemplateError::UnsupportedSource { .. })));
    }

    #[test]
    fn test_both_stock_columns_calculated_rejected() {
        let result = template(vec![
            TemplateColumn::new(STOCK_ON_HAND, ColumnSource::Calculated),
            TemplateColumn::new(TOTAL_CONSUMED_QUANTITY, ColumnSource::Calculated),
        ]);
        assert_eq!(result, Err(TemplateError::BothStockColumnsCalculated));
    }

    #[test]
    fn test_periods_to_average_minimum() {
        let result =
            RequisitionTemplate::new(TemplateId::new(), ProgramId::new(), None, 1, vec![]);
        assert_eq!(result, Err(TemplateError::TooFewPeriodsToAverage(1)));
    }

    #[test]
    fn test_default_label_from_registry() {
        let column = TemplateColumn::new(STOCK_ON_HAND, ColumnSource::Calculated);
        assert_eq!(column.label, "Stock on hand");
    }
}
