//! Sales API endpoints.
//!
//! - GET /api/sales - List the caller's sales, newest first
//! - POST /api/sales - Check out a cart
//! - POST /api/sales/:id/complete - Mark a sale as handed over
//! - POST /api/sales/:id/cancel - Cancel a sale and restock

use super::status::SaleView;
use super::{ApiJson, ApiPath, AppError, Caller};
use crate::server::state::AppState;
use crate::types::{CartLine, SaleId};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

/// Request to check out a cart.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    /// Lines in cart order
    pub items: Vec<CartLine>,
}

/// List the caller's sales.
pub async fn list_sales(
    State(state): State<AppState>,
    Caller(owner): Caller,
) -> Json<Vec<SaleView>> {
    let sales = state.engine.list_sales(&owner).await;
    Json(sales.into_iter().map(SaleView::from).collect())
}

/// Check out a cart into a confirmed sale.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/sales \
///   -H "X-User-Id: 9a3b1c52-6d0e-4f6a-8b2c-3e4d5f6a7b8c" \
///   -H "Content-Type: application/json" \
///   -d '{"items": [{"productId": "7c2d8e1f-4a5b-4c6d-8e9f-0a1b2c3d4e01", "quantity": 2}]}'
/// ```
///
/// # Errors
///
/// `409 INSUFFICIENT_STOCK` naming the first short product, `422` for an
/// empty cart or zero quantity, `503 TIMEOUT` when the products are busy.
pub async fn create_sale(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiJson(request): ApiJson<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleView>), AppError> {
    let sale = state.engine.checkout(owner, request.items).await?;
    Ok((StatusCode::CREATED, Json(sale.into())))
}

/// Mark a sale as handed over.
///
/// # Errors
///
/// `404` or `409 INVALID_STATE`.
pub async fn complete_sale(
    State(state): State<AppState>,
    Caller(staff): Caller,
    ApiPath(id): ApiPath<SaleId>,
) -> Result<Json<SaleView>, AppError> {
    tracing::debug!(%staff, sale_id = %id, "Sale completion requested");
    let sale = state.engine.complete_sale(id).await?;
    Ok(Json(sale.into()))
}

/// Cancel one of the caller's sales.
///
/// # Errors
///
/// `404`, `403`, or `409 INVALID_STATE`.
pub async fn cancel_sale(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<SaleId>,
) -> Result<Json<SaleView>, AppError> {
    let sale = state.engine.cancel_sale(owner, id).await?;
    Ok(Json(sale.into()))
}
