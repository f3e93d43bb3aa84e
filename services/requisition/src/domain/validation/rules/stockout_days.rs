//! 缺货天数

use lmis_errors::{AppResult, FieldErrors, Message};

use super::single;
use crate::domain::messages::ERROR_STOCKOUT_DAYS_EXCEED_PERIOD;
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::TOTAL_STOCKOUT_DAYS;

/// 缺货天数不能超过本期天数
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    if !ctx.template.contains(TOTAL_STOCKOUT_DAYS) {
        return Ok(FieldErrors::new());
    }

    let limit = ctx.days_in_period();
    let exceeded = ctx
        .requisition
        .non_skipped_line_items()
        .any(|item| item.total_stockout_days().is_some_and(|days| days > limit));

    Ok(single(
        TOTAL_STOCKOUT_DAYS,
        exceeded.then(|| Message::new(ERROR_STOCKOUT_DAYS_EXCEED_PERIOD).param(limit)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::RequisitionStatus;
    use crate::domain::validation::rules::fixtures::*;

    #[test]
    fn test_stockout_days_within_period() {
        let template = template(vec![input(TOTAL_STOCKOUT_DAYS)]);
        let settings = settings();

        let ok = requisition(vec![item(&[(TOTAL_STOCKOUT_DAYS, 30)])]);
        let ctx = ValidationContext::new(&ok, &template, RequisitionStatus::Submitted, &settings);
        assert!(validate(&ctx).unwrap().is_empty());

        let bad = requisition(vec![item(&[(TOTAL_STOCKOUT_DAYS, 31)])]);
        let ctx = ValidationContext::new(&bad, &template, RequisitionStatus::Submitted, &settings);
        let errors = validate(&ctx).unwrap();
        let message = &errors.get(TOTAL_STOCKOUT_DAYS)[0];
        assert_eq!(message.key, ERROR_STOCKOUT_DAYS_EXCEED_PERIOD);
        assert_eq!(message.params, vec!["30".to_string()]);
    }
}
