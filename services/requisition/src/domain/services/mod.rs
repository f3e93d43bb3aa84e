//! 领域服务

mod facility_support;
mod reference_data;

pub use facility_support::{ensure_supports_program, supports_program};
pub use reference_data::{
    ApprovedProductRecord, FacilityRecord, OrderableRecord, PeriodRecord, ProgramRecord,
    ReferenceDataLookup, SupplyLineRecord, SupportedProgram,
};
