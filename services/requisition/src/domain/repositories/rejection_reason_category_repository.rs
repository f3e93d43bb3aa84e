//! 驳回原因分类仓储接口

use async_trait::async_trait;
use lmis_errors::AppResult;

use crate::domain::entities::RejectionReasonCategory;
use crate::domain::value_objects::RejectionReasonCategoryId;

#[async_trait]
pub trait RejectionReasonCategoryRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &RejectionReasonCategoryId,
    ) -> AppResult<Option<RejectionReasonCategory>>;

    /// 按名称排序
    async fn find_all(&self) -> AppResult<Vec<RejectionReasonCategory>>;

    /// 新建或覆盖；名称或编码与其他分类重复时返回 Conflict
    async fn save(&self, category: &RejectionReasonCategory) -> AppResult<()>;
}
