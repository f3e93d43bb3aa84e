//! HTTP 错误响应

use axum::response::{IntoResponse, Response};
use lmis_errors::AppError;
use tracing::error;

use super::messages::catalogue;

/// 以 Problem Details 渲染应用错误，字段消息使用消息目录
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if !self.0.is_user_error() {
            error!(error = %self.0, "Request failed");
        }
        self.0.to_problem_details_with(catalogue()).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
