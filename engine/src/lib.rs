//! # DogSpa
//!
//! Booking and order engine for a pet spa, with an HTTP interface.
//!
//! The engine does two things:
//!
//! - **Scheduling**: books service appointments for pets against opening
//!   hours and the pet's existing reservations, then moves each booking
//!   through `PENDING → CONFIRMED → COMPLETED` (or `CANCELLED`)
//! - **Checkout**: consolidates a client-held cart and turns it into a
//!   sale, reserving finite product stock all-or-nothing
//!
//! ## Architecture
//!
//! ```text
//! HTTP (api, server)
//!        │
//!        ▼
//!   SpaEngine (engine)
//!    │            │
//!    ▼            ▼
//! Schedule     Inventory          aggregates, each in a dogspa_runtime::Store
//!    │            │
//!    ▼            ▼
//! availability  cart, catalog
//! ```
//!
//! Writes to the same pet or product are serialized by lock keys with a
//! bounded wait; reads see a committed snapshot.

pub mod aggregates;
pub mod api;
pub mod availability;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod server;
pub mod types;

pub use availability::{Availability, BusinessHours, TimeWindow};
pub use cart::{CartEvent, CartSummary};
pub use catalog::{CatalogError, CatalogSeed};
pub use config::{Config, ConfigError, EngineConfig, ServerConfig};
pub use engine::SpaEngine;
pub use error::{EngineError, ErrorKind};
pub use types::*;
