//! 驳回原因分类

use lmis_domain_core::{AggregateRoot, AuditInfo, Entity};
use lmis_errors::{AppError, AppResult, FieldErrors, Message};

use crate::domain::messages::{
    ERROR_REJECTION_REASON_CATEGORY_CODE_REQUIRED, ERROR_REJECTION_REASON_CATEGORY_NAME_REQUIRED,
    FIELD_CODE, FIELD_NAME,
};
use crate::domain::value_objects::RejectionReasonCategoryId;

/// 驳回原因分类，名称与编码都不能为空且全局唯一
///
/// 唯一性由仓储保证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionReasonCategory {
    id: RejectionReasonCategoryId,
    name: String,
    code: String,
    audit_info: AuditInfo,
}

impl RejectionReasonCategory {
    pub fn new(
        id: RejectionReasonCategoryId,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> AppResult<Self> {
        let (name, code) = validated(name.into(), code.into())?;
        Ok(Self {
            id,
            name,
            code,
            audit_info: AuditInfo::default(),
        })
    }

    /// 从存储恢复
    pub fn restore(
        id: RejectionReasonCategoryId,
        name: String,
        code: String,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            name,
            code,
            audit_info,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// 用另一条记录的名称和编码覆盖，ID 与创建信息不变
    pub fn update_from(&mut self, other: &RejectionReasonCategory) {
        self.name = other.name.clone();
        self.code = other.code.clone();
    }
}

fn validated(name: String, code: String) -> AppResult<(String, String)> {
    let name = name.trim().to_string();
    let code = code.trim().to_string();

    let mut errors = FieldErrors::new();
    if name.is_empty() {
        errors.add(FIELD_NAME, Message::new(ERROR_REJECTION_REASON_CATEGORY_NAME_REQUIRED));
    }
    if code.is_empty() {
        errors.add(FIELD_CODE, Message::new(ERROR_REJECTION_REASON_CATEGORY_CODE_REQUIRED));
    }
    if !errors.is_empty() {
        return Err(AppError::invalid_fields(errors));
    }
    Ok((name, code))
}

impl Entity for RejectionReasonCategory {
    type Id = RejectionReasonCategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for RejectionReasonCategory {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
