//! 查询

mod requisition_queries;
pub mod search_params;

pub use requisition_queries::*;
pub use search_params::{parse_convert_params, parse_search_params};
