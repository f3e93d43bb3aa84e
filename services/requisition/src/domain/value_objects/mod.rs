//! 值对象模块

pub mod columns;
mod ids;
mod packaging;
mod status_change;

pub use columns::{ColumnDefinition, ColumnKind, ColumnPhase, column_definition, known_columns};
pub use ids::{
    FacilityId, LineItemId, OrderId, OrderableId, ProcessingPeriodId, ProgramId,
    RejectionReasonCategoryId, RequisitionId, SupervisoryNodeId, TemplateId,
};
pub use packaging::PackagingRules;
pub use status_change::StatusChange;
