//! lmis-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

mod message;

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use message::{FieldErrors, KeyOnlySource, Message, MessageSource};

const PROBLEM_BASE: &str = "https://api.lmis.local/problems";

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 可由用户修正的字段错误
    #[error("Validation failed: {0}")]
    InvalidFields(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 编程或配置缺陷，不可重试
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_fields(errors: FieldErrors) -> Self {
        Self::InvalidFields(errors)
    }

    /// 单个字段、单条消息
    pub fn field(field: impl Into<String>, message: Message) -> Self {
        Self::InvalidFields(FieldErrors::single(field, message))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    /// 字段错误（仅 InvalidFields）
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::InvalidFields(errors) => Some(errors),
            _ => None,
        }
    }

    /// 是否为用户可修正的错误
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Validation(_)
                | Self::InvalidFields(_)
                | Self::Conflict(_)
                | Self::FailedPrecondition(_)
        )
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InvalidFields(_) => 422,
            Self::Conflict(_) => 409,
            Self::IllegalState(_) => 500,
            Self::Internal(_) => 500,
            Self::Database(_) => 500,
            Self::FailedPrecondition(_) => 412,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        self.to_problem_details_with(&KeyOnlySource)
    }

    /// 转换为 Problem Details，字段消息由 `source` 渲染
    pub fn to_problem_details_with(&self, source: &dyn MessageSource) -> ProblemDetails {
        let errors = self.field_errors().map(|errors| {
            errors
                .iter()
                .map(|(field, messages)| {
                    let rendered = messages
                        .iter()
                        .map(|m| FieldMessage {
                            message_key: m.key.clone(),
                            params: m.params.clone(),
                            message: source.render(m),
                        })
                        .collect();
                    (field.to_string(), rendered)
                })
                .collect()
        });

        ProblemDetails {
            r#type: format!("{}/{}", PROBLEM_BASE, self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
            errors,
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::InvalidFields(_) => "invalid-fields",
            Self::Conflict(_) => "conflict",
            Self::IllegalState(_) => "illegal-state",
            Self::Internal(_) => "internal",
            Self::Database(_) => "database",
            Self::FailedPrecondition(_) => "failed-precondition",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::InvalidFields(_) => "Invalid Fields",
            Self::Conflict(_) => "Conflict",
            Self::IllegalState(_) => "Illegal State",
            Self::Internal(_) => "Internal Server Error",
            Self::Database(_) => "Database Error",
            Self::FailedPrecondition(_) => "Failed Precondition",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_problem_details().into_response()
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<FieldMessage>>>,
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

/// 渲染后的字段消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMessage {
    pub message_key: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub message: String,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
