//! Cart API endpoint.
//!
//! - POST /api/cart/preview - Consolidate cart events and price the result

use super::{ApiJson, AppError};
use crate::cart::{CartEvent, CartSummary};
use crate::server::state::AppState;
use axum::{Json, extract::State};
use serde::Deserialize;

/// Request to preview a cart.
#[derive(Debug, Deserialize)]
pub struct PreviewCartRequest {
    /// Add/set/remove events in the order they happened
    #[serde(default)]
    pub events: Vec<CartEvent>,
}

/// Consolidate cart events against current stock.
///
/// Quantities above stock are clamped, never rejected.
///
/// # Errors
///
/// `422 VALIDATION_ERROR` for a malformed body.
pub async fn preview_cart(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PreviewCartRequest>,
) -> Result<Json<CartSummary>, AppError> {
    Ok(Json(state.engine.preview_cart(&request.events).await?))
}
