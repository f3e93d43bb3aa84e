//! 库存平衡

use lmis_errors::{AppResult, FieldErrors, Message};

use crate::domain::calculation;
use crate::domain::messages::{ERROR_MUST_BE_NON_NEGATIVE, ERROR_STOCK_ON_HAND_INCONSISTENT};
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::*;

const STOCK_COLUMNS: [&str; 5] = [
    BEGINNING_BALANCE,
    TOTAL_RECEIVED_QUANTITY,
    TOTAL_CONSUMED_QUANTITY,
    TOTAL_LOSSES_AND_ADJUSTMENTS,
    STOCK_ON_HAND,
];

/// 计算出的库存或消耗不能为负；全部手工录入时 E 必须等于 A + B - C + D
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    let template = ctx.template;
    let mut errors = FieldErrors::new();

    for key in [STOCK_ON_HAND, TOTAL_CONSUMED_QUANTITY] {
        if template.is_column_calculated(key)
            && ctx
                .requisition
                .non_skipped_line_items()
                .any(|item| item.value(key).is_some_and(|v| v < 0))
        {
            errors.add(key, Message::new(ERROR_MUST_BE_NON_NEGATIVE));
        }
    }

    let all_entered = STOCK_COLUMNS
        .iter()
        .all(|key| template.contains(key) && !template.is_column_calculated(key));
    if all_entered {
        let inconsistent = ctx.requisition.non_skipped_line_items().find(|item| {
            let expected = calculation::stock_on_hand(
                item.beginning_balance(),
                item.total_received_quantity(),
                item.total_consumed_quantity(),
                item.total_losses_and_adjustments(),
            );
            matches!((expected, item.stock_on_hand()), (Some(e), Some(actual)) if e != actual)
        });

        if let Some(item) = inconsistent {
            errors.add(
                STOCK_ON_HAND,
                Message::new(ERROR_STOCK_ON_HAND_INCONSISTENT).param(item.orderable_id()),
            );
        }
    }

    Ok(errors)
}
