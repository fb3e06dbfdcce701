//! Booking API endpoints.
//!
//! - GET /api/bookings - List the caller's bookings, latest first
//! - POST /api/bookings - Book a service for a pet
//! - GET /api/bookings/:id - Get one of the caller's bookings
//! - DELETE /api/bookings/:id - Cancel a booking
//! - POST /api/bookings/:id/confirm - Facility confirms a booking
//! - POST /api/bookings/:id/complete - Facility completes a booking
//! - GET /api/availability - Probe a slot without booking it

use super::status::BookingView;
use super::{ApiJson, ApiPath, ApiQuery, AppError, Caller};
use crate::availability::Availability;
use crate::server::state::AppState;
use crate::types::{BookingId, PetId, ServiceId};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;

// ============================================================================
// Request Types
// ============================================================================

/// Request to create a booking.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Pet to service
    pub pet_id: PetId,
    /// Service to book
    pub service_id: ServiceId,
    /// Start instant (ISO-8601)
    pub date: DateTime<Utc>,
    /// Owner notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters of the availability probe.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    /// Pet
    pub pet_id: PetId,
    /// Service
    pub service_id: ServiceId,
    /// Proposed start (ISO-8601)
    pub start: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List the caller's bookings.
pub async fn list_bookings(
    State(state): State<AppState>,
    Caller(owner): Caller,
) -> Json<Vec<BookingView>> {
    let bookings = state.engine.list_bookings(&owner).await;
    Json(bookings.into_iter().map(BookingView::from).collect())
}

/// Book a service.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings \
///   -H "X-User-Id: 9a3b1c52-6d0e-4f6a-8b2c-3e4d5f6a7b8c" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "petId": "3c1e...",
///     "serviceId": "0b9f6a3e-6c41-4c8e-9f0a-1d2b3c4d5e01",
///     "date": "2025-07-02T14:00:00Z",
///     "notes": "Sensitive skin"
///   }'
/// ```
///
/// # Errors
///
/// `422` for validation and opening-hours failures, `404`/`403` for the
/// pet or service, `409 CONFLICT` for an overlapping booking.
pub async fn create_booking(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let booking = state
        .engine
        .create_booking(
            owner,
            request.pet_id,
            request.service_id,
            request.date,
            request.notes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// Get one of the caller's bookings.
///
/// # Errors
///
/// `404` if unknown, `403` if owned by someone else.
pub async fn get_booking(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.engine.get_booking(&owner, &id).await?;
    Ok(Json(booking.into()))
}

/// Cancel one of the caller's bookings.
///
/// # Errors
///
/// `404`, `403`, or `409 INVALID_STATE` if already terminal.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.engine.cancel_booking(owner, id).await?;
    Ok(Json(booking.into()))
}

/// Confirm a pending booking.
///
/// # Errors
///
/// `404` or `409 INVALID_STATE`.
pub async fn confirm_booking(
    State(state): State<AppState>,
    Caller(staff): Caller,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<BookingView>, AppError> {
    tracing::debug!(%staff, booking_id = %id, "Confirm requested");
    let booking = state.engine.confirm_booking(id).await?;
    Ok(Json(booking.into()))
}

/// Complete a confirmed booking whose start has passed.
///
/// # Errors
///
/// `404`, `409 INVALID_STATE`, or `409 TOO_EARLY`.
pub async fn complete_booking(
    State(state): State<AppState>,
    Caller(staff): Caller,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<BookingView>, AppError> {
    tracing::debug!(%staff, booking_id = %id, "Completion requested");
    let booking = state.engine.complete_booking(id).await?;
    Ok(Json(booking.into()))
}

/// Probe whether a slot is free. Advisory only.
///
/// # Errors
///
/// `422` for malformed parameters or an inactive service, `404`/`403` for
/// the pet or service.
pub async fn check_availability(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<Json<Availability>, AppError> {
    let availability = state
        .engine
        .check_availability(&owner, &query.pet_id, &query.service_id, query.start)
        .await?;
    Ok(Json(availability))
}
