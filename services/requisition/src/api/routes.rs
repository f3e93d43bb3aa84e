//! HTTP 路由

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use lmis_common::PagedResult;

use super::error::ApiResult;
use super::extract::ActingUser;
use super::requests::{
    ConvertToOrderRequest, InitiateRequest, RejectionReasonCategoryDto,
    RejectionReasonCategoryRequest, RequisitionSummary, TemplateRequest, TransitionRequest,
    UpdateRequest,
};
use crate::application::dto::{FacilityDto, RequisitionDto, RequisitionForConvertDto, TemplateDto};
use crate::application::order::OrderDto;
use crate::application::{
    GetRejectionReasonCategoryQuery, GetRequisitionQuery, GetSupplyingDepotsQuery,
    GetTemplateQuery, ServiceHandler, parse_convert_params, parse_search_params,
};
use crate::domain::value_objects::{RejectionReasonCategoryId, RequisitionId, TemplateId};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<ServiceHandler>,
    pub default_page_size: u32,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/requisitions/initiate", post(initiate))
        .route("/api/requisitions/search", get(search))
        .route("/api/requisitions/requisitionsForConvert", get(requisitions_for_convert))
        .route("/api/requisitions/{id}", get(get_requisition).put(update_requisition))
        .route("/api/requisitions/{id}/status", post(transition))
        .route("/api/requisitions/{id}/convertToOrder", post(convert_to_order))
        .route("/api/requisitions/{id}/supplyingDepots", get(supplying_depots))
        .route("/api/requisitionTemplates/{id}", get(get_template).put(save_template))
        .route("/api/rejectionReasonCategories", get(list_rejection_reason_categories))
        .route(
            "/api/rejectionReasonCategories/{id}",
            get(get_rejection_reason_category).put(save_rejection_reason_category),
        )
        .with_state(state)
}

async fn initiate(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<InitiateRequest>,
) -> ApiResult<(StatusCode, Json<RequisitionDto>)> {
    let requisition = state.handler.initiate(request.into_command(user_id)).await?;
    let dto = state.handler.to_dto(&requisition).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

async fn get_requisition(
    State(state): State<AppState>,
    Path(id): Path<RequisitionId>,
) -> ApiResult<Json<RequisitionDto>> {
    let dto = state
        .handler
        .export_requisition(GetRequisitionQuery { requisition_id: id })
        .await?;
    Ok(Json(dto))
}

async fn update_requisition(
    State(state): State<AppState>,
    Path(id): Path<RequisitionId>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<UpdateRequest>,
) -> ApiResult<Json<RequisitionDto>> {
    let command = request.into_command(id, user_id)?;
    let requisition = state.handler.update_requisition(command).await?;
    Ok(Json(state.handler.to_dto(&requisition).await?))
}

async fn transition(
    State(state): State<AppState>,
    Path(id): Path<RequisitionId>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Json<RequisitionDto>> {
    let requisition = state
        .handler
        .transition(request.into_command(id, user_id))
        .await?;
    Ok(Json(state.handler.to_dto(&requisition).await?))
}

async fn convert_to_order(
    State(state): State<AppState>,
    Path(id): Path<RequisitionId>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<ConvertToOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderDto>)> {
    let order = state
        .handler
        .convert_to_order(request.into_command(id, user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn requisitions_for_convert(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<PagedResult<RequisitionForConvertDto>>> {
    let query = parse_convert_params(&params, state.default_page_size)?;
    Ok(Json(state.handler.requisitions_for_convert(query).await?))
}

async fn supplying_depots(
    State(state): State<AppState>,
    Path(id): Path<RequisitionId>,
) -> ApiResult<Json<Vec<FacilityDto>>> {
    let depots = state
        .handler
        .supplying_depots(GetSupplyingDepotsQuery { requisition_id: id })
        .await?;
    Ok(Json(depots.iter().map(FacilityDto::from).collect()))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<PagedResult<RequisitionSummary>>> {
    let query = parse_search_params(&params, state.default_page_size)?;
    let pagination = query.pagination;
    let result = state.handler.search(query).await?;

    let content = result.content.iter().map(RequisitionSummary::from).collect();
    Ok(Json(PagedResult::new(content, result.total_elements, &pagination)))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
) -> ApiResult<Json<TemplateDto>> {
    let template = state
        .handler
        .get_template(GetTemplateQuery { template_id: id })
        .await?;
    Ok(Json(TemplateDto::from(&template)))
}

async fn save_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<TemplateRequest>,
) -> ApiResult<Json<TemplateDto>> {
    let template = state
        .handler
        .save_template(request.into_command(id, user_id))
        .await?;
    Ok(Json(TemplateDto::from(&template)))
}

async fn list_rejection_reason_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RejectionReasonCategoryDto>>> {
    let categories = state.handler.list_rejection_reason_categories().await?;
    Ok(Json(categories.iter().map(RejectionReasonCategoryDto::from).collect()))
}

async fn get_rejection_reason_category(
    State(state): State<AppState>,
    Path(id): Path<RejectionReasonCategoryId>,
) -> ApiResult<Json<RejectionReasonCategoryDto>> {
    let category = state
        .handler
        .get_rejection_reason_category(GetRejectionReasonCategoryQuery { category_id: id })
        .await?;
    Ok(Json(RejectionReasonCategoryDto::from(&category)))
}

async fn save_rejection_reason_category(
    State(state): State<AppState>,
    Path(id): Path<RejectionReasonCategoryId>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<RejectionReasonCategoryRequest>,
) -> ApiResult<Json<RejectionReasonCategoryDto>> {
    let category = state
        .handler
        .save_rejection_reason_category(request.into_command(id, user_id))
        .await?;
    Ok(Json(RejectionReasonCategoryDto::from(&category)))
}
