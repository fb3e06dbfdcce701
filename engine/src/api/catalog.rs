//! Catalog API endpoints.
//!
//! - GET /api/services - List services
//! - GET /api/services/:id - Get a service
//! - GET /api/products - List products with current stock
//! - GET /api/products/:id - Get a product

use super::{ApiPath, AppError};
use crate::server::state::AppState;
use crate::types::{Product, ProductId, Service, ServiceId};
use axum::{Json, extract::State};

/// List every service, ordered by name.
pub async fn list_services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.engine.list_services())
}

/// Get one service.
///
/// # Errors
///
/// `404 NOT_FOUND` if unknown.
pub async fn get_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ServiceId>,
) -> Result<Json<Service>, AppError> {
    Ok(Json(state.engine.get_service(&id)?))
}

/// List every product, ordered by name.
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.engine.list_products().await)
}

/// Get one product with its current stock.
///
/// # Errors
///
/// `404 NOT_FOUND` if unknown.
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.engine.get_product(&id).await?))
}
