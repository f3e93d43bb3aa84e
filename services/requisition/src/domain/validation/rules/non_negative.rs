//! 录入数量非负

use lmis_errors::{AppResult, FieldErrors, Message};

use crate::domain::enums::ColumnSource;
use crate::domain::messages::ERROR_MUST_BE_NON_NEGATIVE;
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::{
    REQUISITION_LINE_ITEMS, TOTAL_LOSSES_AND_ADJUSTMENTS, is_quantity_column,
};

/// 已录入的用户数量不能为负，损耗与调整除外
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    let keys: Vec<&str> = ctx
        .template
        .columns()
        .iter()
        .filter(|c| c.source == ColumnSource::UserInput)
        .map(|c| c.key.as_str())
        .filter(|key| is_quantity_column(key) && *key != TOTAL_LOSSES_AND_ADJUSTMENTS)
        .collect();

    let negative = ctx.requisition.non_skipped_line_items().any(|item| {
        keys.iter()
            .any(|key| item.value(key).is_some_and(|v| v < 0))
    });

    if negative {
        return Ok(FieldErrors::single(
            REQUISITION_LINE_ITEMS,
            Message::new(ERROR_MUST_BE_NON_NEGATIVE),
        ));
    }
    Ok(FieldErrors::new())
}
