//! 仓储接口

mod rejection_reason_category_repository;
mod requisition_repository;
mod template_repository;

pub use rejection_reason_category_repository::RejectionReasonCategoryRepository;
pub use requisition_repository::{RequisitionFilter, RequisitionRepository};
pub use template_repository::TemplateRepository;
