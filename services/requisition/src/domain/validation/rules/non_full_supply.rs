//! 非全供应产品行

use lmis_errors::{AppResult, FieldErrors};

use super::{missing_or_negative, single};
use crate::domain::validation::ValidationContext;
use crate::domain::value_objects::columns::REQUESTED_QUANTITY;

/// 非全供应行必须填写非负的申请数量
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    let message = ctx
        .requisition
        .non_skipped_non_full_supply_line_items()
        .find_map(|item| missing_or_negative(item.requested_quantity()));

    Ok(single(REQUESTED_QUANTITY, message))
}
