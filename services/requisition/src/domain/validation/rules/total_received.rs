//! 计算来源的收货总量

use lmis_errors::{AppResult, FieldErrors, Message};

use super::single;
use crate::domain::messages::{ERROR_MUST_BE_NON_NEGATIVE, ERROR_VALUE_MUST_BE_ENTERED};
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::{REQUISITION_LINE_ITEMS, TOTAL_RECEIVED_QUANTITY};

/// 收货总量为计算列时，每行必须有值且非负，整单至多一条错误
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    if !ctx.template.is_column_calculated(TOTAL_RECEIVED_QUANTITY) {
        return Ok(FieldErrors::new());
    }

    let message = ctx.requisition.non_skipped_line_items().find_map(|item| {
        if item.all_required_calc_fields_not_filled(TOTAL_RECEIVED_QUANTITY) {
            Some(Message::new(ERROR_VALUE_MUST_BE_ENTERED))
        } else if item
            .total_received_quantity()
            .is_some_and(|v| v < 0)
        {
            Some(Message::new(ERROR_MUST_BE_NON_NEGATIVE))
        } else {
            None
        }
    });

    Ok(single(REQUISITION_LINE_ITEMS, message))
}
