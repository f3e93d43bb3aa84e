//! 申请单校验

mod context;
mod registry;
mod rules;
mod validator;

pub use context::ValidationContext;
pub use registry::ValidatorRegistry;
pub use validator::RequisitionValidator;
