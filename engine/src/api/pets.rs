//! Pet API endpoints.
//!
//! - GET /api/pets - List the caller's pets
//! - POST /api/pets - Register a pet
//! - DELETE /api/pets/:id - Remove a pet without active bookings

use super::{ApiJson, ApiPath, AppError, Caller};
use crate::server::state::AppState;
use crate::types::{NewPet, Pet, PetId};
use axum::{Json, extract::State, http::StatusCode};

/// List the caller's pets.
pub async fn list_pets(State(state): State<AppState>, Caller(owner): Caller) -> Json<Vec<Pet>> {
    Json(state.engine.list_pets(&owner).await)
}

/// Register a pet for the caller.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/pets \
///   -H "X-User-Id: 9a3b1c52-6d0e-4f6a-8b2c-3e4d5f6a7b8c" \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Luna", "species": "perro", "age": 3}'
/// ```
///
/// # Errors
///
/// `422 VALIDATION_ERROR` for a blank or overlong name.
pub async fn create_pet(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiJson(pet): ApiJson<NewPet>,
) -> Result<(StatusCode, Json<Pet>), AppError> {
    let pet = state.engine.register_pet(owner, pet).await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

/// Remove one of the caller's pets.
///
/// # Errors
///
/// `404`, `403`, or `409 INVALID_STATE` while a booking holds a slot.
pub async fn delete_pet(
    State(state): State<AppState>,
    Caller(owner): Caller,
    ApiPath(id): ApiPath<PetId>,
) -> Result<StatusCode, AppError> {
    state.engine.remove_pet(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
