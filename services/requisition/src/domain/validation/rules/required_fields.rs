//! 必填列

use lmis_errors::{AppResult, FieldErrors, Message};

use crate::domain::enums::ColumnSource;
use crate::domain::messages::ERROR_VALUE_MUST_BE_ENTERED;
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::REQUISITION_LINE_ITEMS;
use crate::domain::value_objects::{ColumnPhase, column_definition};

/// 显示且必填的录入阶段用户列，每个未跳过的全供应行都必须有值
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    let required: Vec<&str> = ctx
        .template
        .columns()
        .iter()
        .filter(|c| c.displayed && c.required && c.source == ColumnSource::UserInput)
        .filter(|c| column_definition(&c.key).is_some_and(|d| d.phase == ColumnPhase::Entry))
        .map(|c| c.key.as_str())
        .collect();

    for item in ctx.requisition.non_skipped_full_supply_line_items() {
        for key in &required {
            if !item.has_value(key)? {
                return Ok(FieldErrors::single(
                    REQUISITION_LINE_ITEMS,
                    Message::new(ERROR_VALUE_MUST_BE_ENTERED),
                ));
            }
        }
    }

    Ok(FieldErrors::new())
}
