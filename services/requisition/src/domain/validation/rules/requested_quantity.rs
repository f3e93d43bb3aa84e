//! 申请数量与说明

use lmis_errors::{AppResult, FieldErrors, Message};

use crate::domain::messages::{ERROR_EXPLANATION_REQUIRED, ERROR_VALUE_MUST_BE_ENTERED};
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::{
    CALCULATED_ORDER_QUANTITY, REQUESTED_QUANTITY, REQUESTED_QUANTITY_EXPLANATION,
};

/// 显示计算订货量时，填写了申请数量就必须给出说明；否则申请数量必填
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    let template = ctx.template;
    if !template.is_column_displayed(REQUESTED_QUANTITY) {
        return Ok(FieldErrors::new());
    }

    let calc_displayed = template.is_column_displayed(CALCULATED_ORDER_QUANTITY);
    let explanation_displayed = template.is_column_displayed(REQUESTED_QUANTITY_EXPLANATION);

    for item in ctx.requisition.non_skipped_full_supply_line_items() {
        if calc_displayed {
            if explanation_displayed
                && item.requested_quantity().is_some()
                && item.requested_quantity_explanation().is_none()
            {
                return Ok(FieldErrors::single(
                    REQUESTED_QUANTITY_EXPLANATION,
                    Message::new(ERROR_EXPLANATION_REQUIRED),
                ));
            }
        } else if item.requested_quantity().is_none() {
            return Ok(FieldErrors::single(
                REQUESTED_QUANTITY,
                Message::new(ERROR_VALUE_MUST_BE_ENTERED),
            ));
        }
    }

    Ok(FieldErrors::new())
}
