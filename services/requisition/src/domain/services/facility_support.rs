//! 机构是否支持项目

use chrono::NaiveDate;
use lmis_errors::{AppError, AppResult, Message};

use super::reference_data::FacilityRecord;
use crate::domain::messages::{ERROR_FACILITY_DOES_NOT_SUPPORT_PROGRAM, FIELD_FACILITY};
use crate::domain::value_objects::ProgramId;

/// 项目须已启用且支持关系生效，开始日期不晚于今天
pub fn supports_program(facility: &FacilityRecord, program_id: &ProgramId, today: NaiveDate) -> bool {
    facility.supported_programs.iter().any(|support| {
        &support.program_id == program_id
            && support.support_active
            && support.program_active
            && support.support_start_date.is_none_or(|start| start <= today)
    })
}

/// 不支持时返回字段错误
pub fn ensure_supports_program(
    facility: &FacilityRecord,
    program_id: &ProgramId,
    today: NaiveDate,
) -> AppResult<()> {
    if supports_program(facility, program_id, today) {
        return Ok(());
    }
    Err(AppError::field(
        FIELD_FACILITY,
        Message::new(ERROR_FACILITY_DOES_NOT_SUPPORT_PROGRAM)
            .param(&facility.id)
            .param(program_id),
    ))
}
