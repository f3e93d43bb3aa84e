//! 按目标状态登记的校验器

use std::collections::HashMap;

use lmis_errors::{AppResult, FieldErrors};
use tracing::debug;

use super::context::ValidationContext;
use super::validator::RequisitionValidator;
use crate::domain::enums::RequisitionStatus;

/// 校验器注册表，同一状态下按登记顺序执行
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<RequisitionStatus, Vec<RequisitionValidator>>,
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 标准规则集
    pub fn standard() -> Self {
        use RequisitionStatus::*;
        use RequisitionValidator::*;

        let entry = [
            RequiredFields,
            NonNegativeInputs,
            TotalReceivedQuantity,
            ConsumptionCounterpart,
            StockBalance,
            StockoutDays,
            RequestedQuantity,
            NonFullSupply,
        ];

        let mut registry = Self::empty();
        for status in [Submitted, Authorized] {
            for validator in entry {
                registry.register(status, validator);
            }
        }
        registry.register(InApproval, ApprovedQuantity);
        registry.register(Approved, ApprovedQuantity);
        registry.register(Released, SupplyingFacility);
        registry.register(Skipped, SkipEligibility);
        registry
    }

    /// 追加到该状态的末尾
    pub fn register(&mut self, status: RequisitionStatus, validator: RequisitionValidator) {
        self.validators.entry(status).or_default().push(validator);
    }

    pub fn validators_for(&self, status: RequisitionStatus) -> &[RequisitionValidator] {
        self.validators
            .get(&status)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 依次执行目标状态下的全部规则并合并错误
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
        let mut errors = FieldErrors::new();
        for validator in self.validators_for(ctx.target) {
            let found = validator.validate(ctx)?;
            if !found.is_empty() {
                debug!(
                    validator = %validator,
                    target = %ctx.target,
                    errors = found.message_count(),
                    "Validation rule failed"
                );
            }
            errors.merge(found);
        }
        Ok(errors)
    }
}
