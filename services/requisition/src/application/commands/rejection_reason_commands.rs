//! 驳回原因分类命令

use lmis_common::UserId;
use lmis_errors::AppResult;

use crate::domain::entities::RejectionReasonCategory;
use crate::domain::value_objects::RejectionReasonCategoryId;

/// 保存（新建或覆盖）驳回原因分类
#[derive(Debug, Clone)]
pub struct SaveRejectionReasonCategoryCommand {
    pub category_id: RejectionReasonCategoryId,
    pub name: String,
    pub code: String,
    pub user_id: UserId,
}

impl SaveRejectionReasonCategoryCommand {
    pub fn into_category(self) -> AppResult<RejectionReasonCategory> {
        RejectionReasonCategory::new(self.category_id, self.name, self.code)
    }
}
