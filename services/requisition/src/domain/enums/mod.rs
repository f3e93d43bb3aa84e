//! 枚举模块

mod column_source;
mod requisition_status;

pub use column_source::ColumnSource;
pub use requisition_status::{ParseStatusError, RequisitionStatus};
