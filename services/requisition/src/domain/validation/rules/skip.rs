//! 跳过整张申请单

use lmis_errors::{AppResult, FieldErrors, Message};

use super::single;
use crate::domain::messages::{ERROR_CANNOT_SKIP_EMERGENCY, FIELD_EMERGENCY};
use crate::domain::validation::ValidationContext;

/// 紧急申请单不能跳过
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    Ok(single(
        FIELD_EMERGENCY,
        ctx.requisition
            .is_emergency()
            .then(|| Message::new(ERROR_CANNOT_SKIP_EMERGENCY)),
    ))
}
