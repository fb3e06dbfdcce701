//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{bookings, cart, catalog, pets, sales};
use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Health checks live at the root; everything else is under `/api`. Every
/// response carries an `x-request-id` (generated when the request has
/// none) and every request is traced.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalog
        .route("/services", get(catalog::list_services))
        .route("/services/:id", get(catalog::get_service))
        .route("/products", get(catalog::list_products))
        .route("/products/:id", get(catalog::get_product))
        // Pets
        .route("/pets", get(pets::list_pets).post(pets::create_pet))
        .route("/pets/:id", axum::routing::delete(pets::delete_pet))
        // Bookings
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking).delete(bookings::cancel_booking),
        )
        .route("/bookings/:id/confirm", post(bookings::confirm_booking))
        .route("/bookings/:id/complete", post(bookings::complete_booking))
        .route("/availability", get(bookings::check_availability))
        // Cart & sales
        .route("/cart/preview", post(cart::preview_cart))
        .route("/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/sales/:id/complete", post(sales::complete_sale))
        .route("/sales/:id/cancel", post(sales::cancel_sale));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
