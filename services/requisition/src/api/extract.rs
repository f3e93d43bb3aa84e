//! 请求提取器

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lmis_common::UserId;
use lmis_errors::AppError;

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// 当前操作用户，来自 `X-User-Id` 请求头
#[derive(Debug, Clone)]
pub struct ActingUser(pub UserId);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::validation("Missing X-User-Id header"))?;
        let user_id = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .ok_or_else(|| AppError::validation("Invalid X-User-Id header"))?;
        Ok(Self(user_id))
    }
}
