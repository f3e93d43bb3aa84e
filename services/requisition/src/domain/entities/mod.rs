//! 实体模块

mod line_item;
mod rejection_reason_category;
mod requisition;
mod template;

pub use line_item::{LineItemParts, RequisitionLineItem};
pub use rejection_reason_category::RejectionReasonCategory;
pub use requisition::{
    FieldValue, InitiateParams, LineItemUpdate, Requisition, RequisitionParts,
};
pub use template::{MIN_PERIODS_TO_AVERAGE, RequisitionTemplate, TemplateColumn, TemplateError};
