//! 消息目录
//!
//! 消息键到英文模板的映射，`{0}`、`{1}` 为位置参数

use std::collections::HashMap;
use std::sync::LazyLock;

use lmis_errors::{Message, MessageSource};

use crate::domain::messages::*;

static CATALOGUE: LazyLock<MessageCatalogue> = LazyLock::new(MessageCatalogue::english);

/// 默认目录
pub fn catalogue() -> &'static MessageCatalogue {
    &CATALOGUE
}

#[derive(Debug, Clone, Default)]
pub struct MessageCatalogue {
    templates: HashMap<&'static str, &'static str>,
}

impl MessageCatalogue {
    pub fn english() -> Self {
        let templates = HashMap::from([
            (ERROR_VALUE_MUST_BE_ENTERED, "This value must be entered"),
            (ERROR_MUST_BE_NON_NEGATIVE, "This value must be a non-negative number"),
            (
                ERROR_FIELD_MUST_HAVE_VALUES,
                "Requisition {0}: {1} must be entered when {2} is calculated",
            ),
            (
                ERROR_STOCK_ON_HAND_INCONSISTENT,
                "Stock on hand of product {0} does not match beginning balance, receipts, consumption and adjustments",
            ),
            (
                ERROR_STOCKOUT_DAYS_EXCEED_PERIOD,
                "Total stockout days cannot be greater than the length of the period ({0} days)",
            ),
            (
                ERROR_EXPLANATION_REQUIRED,
                "An explanation is required when the requested quantity is entered",
            ),
            (
                ERROR_SUPPLYING_FACILITY_REQUIRED,
                "A supplying facility must be selected before the requisition is released",
            ),
            (ERROR_CANNOT_SKIP_EMERGENCY, "Line items of an emergency requisition cannot be skipped"),
            (ERROR_CANNOT_SKIP_NON_FULL_SUPPLY, "Non full supply product {0} cannot be skipped"),
            (ERROR_SKIP_NOT_ALLOWED, "The template does not allow skipping line items"),
            (
                ERROR_STATUS_TRANSITION_NOT_ALLOWED,
                "Cannot change requisition status from {0} to {1}",
            ),
            (ERROR_CANNOT_UPDATE_WITH_STATUS, "A requisition with status {0} cannot be updated"),
            (ERROR_CALCULATED_FIELD_NOT_EDITABLE, "Column {0} is calculated and cannot be edited"),
            (ERROR_FIELD_NOT_EDITABLE, "Column {0} cannot be edited in the current status"),
            (ERROR_COLUMN_NOT_IN_TEMPLATE, "Column {0} is not part of the requisition template"),
            (ERROR_LINE_ITEM_NOT_FOUND, "The requisition has no line item for product {0}"),
            (
                ERROR_NON_FULL_SUPPLY_NOT_AVAILABLE,
                "Product {0} is not available as a non full supply product",
            ),
            (
                ERROR_DATE_STOCK_COUNT_IN_FUTURE,
                "The date physical stock count completed ({0}) cannot be in the future",
            ),
            (
                ERROR_FACILITY_DOES_NOT_SUPPORT_PROGRAM,
                "Facility {0} does not support program {1}",
            ),
            (
                ERROR_REQUISITION_ALREADY_EXISTS,
                "A requisition already exists for this facility, program and period",
            ),
            (ERROR_SEARCH_INVALID_PARAMS, "Unknown search parameter: {0}"),
            (ERROR_INVALID_REQUISITION_STATUS, "Invalid requisition status: {0}"),
            (ERROR_INVALID_SEARCH_PARAM_VALUE, "Invalid value for search parameter {0}: {1}"),
            (
                ERROR_SUPPLYING_FACILITY_NOT_AVAILABLE,
                "Facility {0} does not supply this requisition's program and supervisory node",
            ),
            (
                ERROR_REJECTION_REASON_CATEGORY_NAME_REQUIRED,
                "A rejection reason category must have a name",
            ),
            (
                ERROR_REJECTION_REASON_CATEGORY_CODE_REQUIRED,
                "A rejection reason category must have a code",
            ),
            (
                ERROR_VERSION_MISMATCH,
                "The requisition was modified by another user, reload and try again",
            ),
        ]);
        Self { templates }
    }

    pub fn template(&self, key: &str) -> Option<&'static str> {
        self.templates.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl MessageSource for MessageCatalogue {
    /// 未登记的键原样返回
    fn render(&self, message: &Message) -> String {
        let Some(template) = self.template(&message.key) else {
            return message.to_string();
        };

        let mut text = template.to_string();
        for (index, param) in message.params.iter().enumerate() {
            text = text.replace(&format!("{{{index}}}"), param);
        }
        text
    }
}
