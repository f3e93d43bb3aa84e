//! 申请单查询

use lmis_common::Pagination;

use crate::domain::repositories::RequisitionFilter;
use crate::domain::value_objects::{
    FacilityId, ProgramId, RejectionReasonCategoryId, RequisitionId, TemplateId,
};

/// 获取申请单查询
#[derive(Debug, Clone)]
pub struct GetRequisitionQuery {
    pub requisition_id: RequisitionId,
}

/// 搜索申请单查询
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequisitionsQuery {
    pub filter: RequisitionFilter,
    pub pagination: Pagination,
}

/// 获取列模板查询
#[derive(Debug, Clone)]
pub struct GetTemplateQuery {
    pub template_id: TemplateId,
}

/// 待转订单列表查询，按申请机构与项目过滤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequisitionsForConvertQuery {
    pub facility_id: Option<FacilityId>,
    pub program_id: Option<ProgramId>,
    pub pagination: Pagination,
}

/// 申请单可选供货机构查询
#[derive(Debug, Clone)]
pub struct GetSupplyingDepotsQuery {
    pub requisition_id: RequisitionId,
}

#[derive(Debug, Clone)]
pub struct GetRejectionReasonCategoryQuery {
    pub category_id: RejectionReasonCategoryId,
}
