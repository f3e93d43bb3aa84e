//! 列模板仓储接口

use async_trait::async_trait;
use lmis_errors::AppResult;

use crate::domain::entities::RequisitionTemplate;
use crate::domain::value_objects::{ProgramId, TemplateId};

/// 列模板仓储接口
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn find_by_id(&self, id: &TemplateId) -> AppResult<Option<RequisitionTemplate>>;

    /// 查找项目与机构类型对应的模板，没有专用模板时回退到项目通用模板
    async fn find_for(
        &self,
        program_id: &ProgramId,
        facility_type_code: &str,
    ) -> AppResult<Option<RequisitionTemplate>>;

    /// 新建或覆盖
    async fn save(&self, template: &RequisitionTemplate) -> AppResult<()>;
}
