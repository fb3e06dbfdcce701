//! Business metrics for the DogSpa engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `dogspa_bookings_total{status}` - Booking lifecycle transitions by status
//! - `dogspa_checkouts_total{outcome}` - Checkout attempts by outcome
//! - `dogspa_sales_total{status}` - Sale status changes after checkout
//! - `dogspa_sales_revenue_cents_total` - Revenue of committed sales in cents
//! - `dogspa_units_sold_total` - Product units sold
//! - `dogspa_pets_registered_total` - Pets registered
//!
//! ## Gauges
//! - `dogspa_active_bookings` - Bookings currently holding a slot
//!
//! Lock timeouts and per-store action latencies are recorded by the runtime
//! (`store_lock_timeouts_total`, `store_action_duration_seconds`).

use crate::error::EngineError;
use crate::types::{BookingStatus, Money, SaleStatus};
use metrics::{describe_counter, describe_gauge};

/// Register all business metric descriptions.
///
/// Call once at startup, before any metric is recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "dogspa_bookings_total",
        "Booking lifecycle transitions by resulting status"
    );
    describe_gauge!(
        "dogspa_active_bookings",
        "Bookings currently holding a slot (pending or confirmed)"
    );
    describe_counter!(
        "dogspa_checkouts_total",
        "Checkout attempts by outcome (committed or error code)"
    );
    describe_counter!(
        "dogspa_sales_total",
        "Sale status changes after checkout"
    );
    describe_counter!(
        "dogspa_sales_revenue_cents_total",
        "Revenue of committed sales in cents"
    );
    describe_counter!("dogspa_units_sold_total", "Product units sold");
    describe_counter!("dogspa_pets_registered_total", "Pets registered");

    tracing::info!("Business metrics registered");
}

/// Record a booking entering `status`.
pub fn record_booking(status: BookingStatus) {
    let label = match status {
        BookingStatus::Pending => "pending",
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::Cancelled => "cancelled",
        BookingStatus::Completed => "completed",
    };
    metrics::counter!("dogspa_bookings_total", "status" => label).increment(1);
    match status {
        BookingStatus::Pending => metrics::gauge!("dogspa_active_bookings").increment(1.0),
        BookingStatus::Cancelled | BookingStatus::Completed => {
            metrics::gauge!("dogspa_active_bookings").decrement(1.0);
        }
        BookingStatus::Confirmed => {}
    }
    tracing::debug!(%status, "Recorded booking metric");
}

/// Record a committed checkout.
pub fn record_checkout_committed(total: Money, units: u32) {
    metrics::counter!("dogspa_checkouts_total", "outcome" => "committed").increment(1);
    metrics::counter!("dogspa_sales_revenue_cents_total").increment(total.cents());
    metrics::counter!("dogspa_units_sold_total").increment(u64::from(units));
    tracing::debug!(total = %total, units, "Recorded checkout metric");
}

/// Record a rejected checkout.
pub fn record_checkout_rejected(error: &EngineError) {
    metrics::counter!("dogspa_checkouts_total", "outcome" => error.kind().code()).increment(1);
}

/// Record a sale status change after checkout.
pub fn record_sale(status: SaleStatus) {
    let label = match status {
        SaleStatus::Pending => "pending",
        SaleStatus::Confirmed => "confirmed",
        SaleStatus::Cancelled => "cancelled",
        SaleStatus::Completed => "completed",
    };
    metrics::counter!("dogspa_sales_total", "status" => label).increment(1);
}

/// Record a pet registration.
pub fn record_pet_registered() {
    metrics::counter!("dogspa_pets_registered_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        register_business_metrics();
        record_booking(BookingStatus::Pending);
        record_booking(BookingStatus::Cancelled);
        record_checkout_committed(Money::from_cents(2550), 3);
        record_checkout_rejected(&EngineError::validation("empty cart"));
        record_sale(SaleStatus::Cancelled);
        record_pet_registered();
    }
}
