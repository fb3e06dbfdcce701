//! Custom Axum extractors.
//!
//! - [`Caller`]: verified owner identity from the `X-User-Id` header
//! - [`ApiJson`], [`ApiPath`], [`ApiQuery`]: the stock extractors with
//!   rejections rendered as [`AppError`] JSON bodies

use super::error::AppError;
use crate::types::OwnerId;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

/// Header carrying the caller identity set by the upstream auth layer
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Identity of the calling owner.
///
/// # Example
///
/// ```ignore
/// async fn handler(Caller(owner): Caller) -> String {
///     format!("Hello {owner}")
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub OwnerId);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::unauthorized(format!("Missing {USER_ID_HEADER} header")))?;

        raw.to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(|uuid| Self(OwnerId::from_uuid(uuid)))
            .ok_or_else(|| AppError::unauthorized(format!("Invalid {USER_ID_HEADER} header")))
    }
}

/// JSON body extractor with JSON error responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor with JSON error responses.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query-string extractor with JSON error responses.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
