//! HTTP server for the DogSpa engine.
//!
//! - `state`: shared application state
//! - `routes`: router with tracing and request-id layers
//! - `health`: liveness and readiness probes

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
