//! 列模板命令

use lmis_common::UserId;
use lmis_errors::{AppError, AppResult};

use crate::domain::entities::{RequisitionTemplate, TemplateColumn};
use crate::domain::value_objects::{ProgramId, TemplateId};

/// 保存（新建或覆盖）列模板命令
#[derive(Debug, Clone)]
pub struct SaveTemplateCommand {
    pub template_id: TemplateId,
    pub program_id: ProgramId,
    pub facility_type_code: Option<String>,
    pub number_of_periods_to_average: u32,
    pub columns: Vec<TemplateColumn>,
    pub user_id: UserId,
}

impl SaveTemplateCommand {
    /// 构建并校验模板
    pub fn into_template(self) -> AppResult<RequisitionTemplate> {
        let facility_type_code = self
            .facility_type_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        RequisitionTemplate::new(
            self.template_id,
            self.program_id,
            facility_type_code,
            self.number_of_periods_to_average,
            self.columns,
        )
        .map_err(|e| AppError::validation(e.to_string()))
    }
}
