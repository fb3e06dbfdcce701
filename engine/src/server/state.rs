//! Application state for the HTTP server.

use crate::engine::SpaEngine;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Booking and order engine
    pub engine: Arc<SpaEngine>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(engine: Arc<SpaEngine>) -> Self {
        Self { engine }
    }
}
