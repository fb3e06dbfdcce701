//! HTTP API for the DogSpa engine.
//!
//! Handlers translate JSON requests into [`SpaEngine`](crate::SpaEngine)
//! calls. Caller identity comes from the `X-User-Id` header; errors are
//! rendered by [`AppError`].

pub mod bookings;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod extractors;
pub mod pets;
pub mod sales;
pub mod status;

pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery, Caller};
