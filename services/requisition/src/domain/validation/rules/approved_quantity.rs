//! 批准数量

use lmis_errors::{AppResult, FieldErrors};

use super::{missing_or_negative, single};
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::APPROVED_QUANTITY;

/// 审批阶段每个未跳过的行都要有非负的批准数量
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    if !ctx.template.is_column_displayed(APPROVED_QUANTITY) {
        return Ok(FieldErrors::new());
    }

    let message = ctx
        .requisition
        .non_skipped_line_items()
        .find_map(|item| missing_or_negative(item.approved_quantity()));

    Ok(single(APPROVED_QUANTITY, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::RequisitionStatus;
    use crate::domain::messages::{ERROR_MUST_BE_NON_NEGATIVE, ERROR_VALUE_MUST_BE_ENTERED};
    use crate::domain::validation::rules::fixtures::*;

    #[test]
    fn test_approved_quantity() {
        let template = template(vec![input(APPROVED_QUANTITY)]);
        let settings = settings();

        let missing = requisition(vec![item(&[(APPROVED_QUANTITY, 1)]), item(&[])]);
        let ctx = ValidationContext::new(&missing, &template, RequisitionStatus::Approved, &settings);
        assert!(validate(&ctx).unwrap().contains(APPROVED_QUANTITY, ERROR_VALUE_MUST_BE_ENTERED));

        let negative = requisition(vec![item(&[(APPROVED_QUANTITY, -1)])]);
        let ctx = ValidationContext::new(&negative, &template, RequisitionStatus::Approved, &settings);
        assert!(validate(&ctx).unwrap().contains(APPROVED_QUANTITY, ERROR_MUST_BE_NON_NEGATIVE));

        let ok = requisition(vec![item(&[(APPROVED_QUANTITY, 0)])]);
        let ctx = ValidationContext::new(&ok, &template, RequisitionStatus::Approved, &settings);
        assert!(validate(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_hidden_column_is_not_checked() {
        let template = template(vec![input(APPROVED_QUANTITY).hidden()]);
        let requisition = requisition(vec![item(&[])]);
        let settings = settings();
        let ctx = ValidationContext::new(&requisition, &template, RequisitionStatus::Approved, &settings);
        assert!(validate(&ctx).unwrap().is_empty());
    }
}
