//! 状态转换引擎
//!
//! 纯同步计算，不做 I/O。被拒绝的转换不改变传入的申请单。

use chrono::Utc;
use lmis_domain_core::{Entity, UserId};
use lmis_errors::{AppError, AppResult, Message};
use tracing::{debug, info};

use crate::domain::calculation::{CalculationSettings, LineItemFieldsCalculator};
use crate::domain::entities::{Requisition, RequisitionTemplate};
use crate::domain::enums::RequisitionStatus;
use crate::domain::messages::{ERROR_STATUS_TRANSITION_NOT_ALLOWED, FIELD_STATUS};
use crate::domain::validation::{ValidationContext, ValidatorRegistry};

/// 状态转换引擎
#[derive(Debug, Clone)]
pub struct StatusTransitionEngine {
    calculator: LineItemFieldsCalculator,
    registry: ValidatorRegistry,
}

impl StatusTransitionEngine {
    pub fn new(settings: CalculationSettings) -> Self {
        Self::with_registry(settings, ValidatorRegistry::standard())
    }

    pub fn with_registry(settings: CalculationSettings, registry: ValidatorRegistry) -> Self {
        Self {
            calculator: LineItemFieldsCalculator::new(settings),
            registry,
        }
    }

    pub fn calculator(&self) -> &LineItemFieldsCalculator {
        &self.calculator
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// 尝试把申请单转到目标状态
    ///
    /// 成功时返回更新后的副本；业务错误为 `InvalidFields`，模板不匹配等故障为 `IllegalState`
    pub fn attempt_transition(
        &self,
        requisition: &Requisition,
        template: &RequisitionTemplate,
        target: RequisitionStatus,
        actor: &UserId,
    ) -> AppResult<Requisition> {
        if requisition.template_id() != template.id() {
            return Err(AppError::illegal_state(format!(
                "Requisition {} uses template {}, got {}",
                requisition.id(),
                requisition.template_id(),
                template.id()
            )));
        }

        let current = requisition.status();
        if !current.can_transition_to(target) {
            debug!(
                requisition_id = %requisition.id(),
                from = %current,
                to = %target,
                "Transition not allowed"
            );
            return Err(AppError::field(
                FIELD_STATUS,
                Message::new(ERROR_STATUS_TRANSITION_NOT_ALLOWED)
                    .param(current)
                    .param(target),
            ));
        }

        let mut working = requisition.clone();
        self.calculator.recalculate(&mut working, template)?;

        let settings = self.calculator.settings();
        let ctx = ValidationContext::new(&working, template, target, settings);
        let errors = self.registry.validate(&ctx)?;

        if !errors.is_empty() {
            info!(
                requisition_id = %requisition.id(),
                from = %current,
                to = %target,
                error_count = errors.message_count(),
                "Transition rejected"
            );
            return Err(AppError::invalid_fields(errors));
        }

        working.apply_status_change(target, actor, Utc::now());
        info!(
            requisition_id = %requisition.id(),
            from = %current,
            to = %target,
            "Transition applied"
        );
        Ok(working)
    }
}

impl Default for StatusTransitionEngine {
    fn default() -> Self {
        Self::new(CalculationSettings::default())
    }
}
