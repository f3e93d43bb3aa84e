//! 各条校验规则
//!
//! 每条规则一个模块，签名统一为 `validate(&ValidationContext) -> AppResult<FieldErrors>`

pub(super) mod approved_quantity;
pub(super) mod consumption;
pub(super) mod non_full_supply;
pub(super) mod non_negative;
pub(super) mod required_fields;
pub(super) mod requested_quantity;
pub(super) mod skip;
pub(super) mod stock_balance;
pub(super) mod stockout_days;
pub(super) mod supplying_facility;
pub(super) mod total_received;

use lmis_errors::{FieldErrors, Message};

use crate::domain::messages::{ERROR_MUST_BE_NON_NEGATIVE, ERROR_VALUE_MUST_BE_ENTERED};

/// 缺值或负值检查，返回第一条错误消息
fn missing_or_negative(value: Option<i64>) -> Option<Message> {
    match value {
        None => Some(Message::new(ERROR_VALUE_MUST_BE_ENTERED)),
        Some(v) if v < 0 => Some(Message::new(ERROR_MUST_BE_NON_NEGATIVE)),
        Some(_) => None,
    }
}

/// 至多一条错误的结果
fn single(field: &str, message: Option<Message>) -> FieldErrors {
    match message {
        Some(message) => FieldErrors::single(field, message),
        None => FieldErrors::new(),
    }
}
