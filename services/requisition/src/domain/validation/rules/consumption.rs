//! 消耗量与库存的对应字段

use lmis_domain_core::Entity;
use lmis_errors::{AppResult, FieldErrors, Message};

use crate::domain::messages::ERROR_FIELD_MUST_HAVE_VALUES;
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::{STOCK_ON_HAND, TOTAL_CONSUMED_QUANTITY};

/// 计算列所依赖的对应字段全部为空时报错，键为缺失的字段
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    let template = ctx.template;
    let requisition = ctx.requisition;

    for item in requisition.non_skipped_line_items() {
        for (calculated, counterpart) in [
            (TOTAL_CONSUMED_QUANTITY, STOCK_ON_HAND),
            (STOCK_ON_HAND, TOTAL_CONSUMED_QUANTITY),
        ] {
            if template.is_column_calculated(calculated)
                && item.all_required_calc_fields_not_filled(calculated)
            {
                let message = Message::new(ERROR_FIELD_MUST_HAVE_VALUES)
                    .param(requisition.id())
                    .param(counterpart)
                    .param(calculated);
                return Ok(FieldErrors::single(counterpart, message));
            }
        }
    }

    Ok(FieldErrors::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::RequisitionStatus;
    use crate::domain::validation::rules::fixtures::*;

    #[test]
    fn test_calculated_consumption_needs_stock_on_hand() {
        let template = template(vec![input(STOCK_ON_HAND), calculated(TOTAL_CONSUMED_QUANTITY)]);
        let requisition = requisition(vec![item(&[]), item(&[])]);
        let settings = settings();
        let ctx = ValidationContext::new(&requisition, &template, RequisitionStatus::Submitted, &settings);

        let errors = validate(&ctx).unwrap();
        assert_eq!(errors.message_count(), 1);
        let message = &errors.get(STOCK_ON_HAND)[0];
        assert_eq!(message.key, ERROR_FIELD_MUST_HAVE_VALUES);
        assert_eq!(message.params[1], STOCK_ON_HAND);
        assert_eq!(message.params[2], TOTAL_CONSUMED_QUANTITY);
    }

    #[test]
    fn test_calculated_stock_on_hand_needs_consumption() {
        let template = template(vec![calculated(STOCK_ON_HAND), input(TOTAL_CONSUMED_QUANTITY)]);
        let requisition = requisition(vec![item(&[])]);
        let settings = settings();
        let ctx = ValidationContext::new(&requisition, &template, RequisitionStatus::Submitted, &settings);

        let errors = validate(&ctx).unwrap();
        assert!(errors.contains(TOTAL_CONSUMED_QUANTITY, ERROR_FIELD_MUST_HAVE_VALUES));
    }

    #[test]
    fn test_filled_counterpart_passes() {
        let template = template(vec![calculated(STOCK_ON_HAND), input(TOTAL_CONSUMED_QUANTITY)]);
        let requisition = requisition(vec![item(&[(TOTAL_CONSUMED_QUANTITY, 0)])]);
        let settings = settings();
        let ctx = ValidationContext::new(&requisition, &template, RequisitionStatus::Submitted, &settings);

        assert!(validate(&ctx).unwrap().is_empty());
    }
}
