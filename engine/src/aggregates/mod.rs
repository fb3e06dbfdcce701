//! Aggregates for the DogSpa engine.
//!
//! Each aggregate is a [`Reducer`](dogspa_core::reducer::Reducer) run inside
//! its own [`Store`](dogspa_runtime::Store):
//!
//! - **Schedule**: pets and bookings, serialized per pet
//! - **Inventory**: product stock and sales, serialized per product

pub mod inventory;
pub mod schedule;

pub use inventory::{
    InventoryAction, InventoryEnvironment, InventoryEvent, InventoryKey, InventoryReducer,
    InventoryState,
};
pub use schedule::{
    ScheduleAction, ScheduleEnvironment, ScheduleEvent, ScheduleKey, ScheduleReducer,
    ScheduleState,
};
