//! Presentation metadata for statuses.
//!
//! Pure status → {label, tone, icon, variant} table used by booking and
//! sale responses. Labels are the Spanish strings shown by the client.

use crate::types::{Booking, BookingStatus, Sale, SaleStatus};
use serde::Serialize;

/// How a status is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    /// Human-readable label
    pub label: &'static str,
    /// Colour family
    pub tone: &'static str,
    /// Icon name
    pub icon: &'static str,
    /// Badge variant
    pub variant: &'static str,
}

impl StatusDisplay {
    const PENDING: Self = Self {
        label: "Pendiente",
        tone: "yellow",
        icon: "alert-circle",
        variant: "secondary",
    };
    const CONFIRMED: Self = Self {
        label: "Confirmada",
        tone: "green",
        icon: "check-circle",
        variant: "default",
    };
    const CANCELLED: Self = Self {
        label: "Cancelada",
        tone: "red",
        icon: "x-circle",
        variant: "destructive",
    };
    const COMPLETED: Self = Self {
        label: "Completada",
        tone: "blue",
        icon: "check-circle",
        variant: "default",
    };
}

impl From<BookingStatus> for StatusDisplay {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => Self::PENDING,
            BookingStatus::Confirmed => Self::CONFIRMED,
            BookingStatus::Cancelled => Self::CANCELLED,
            BookingStatus::Completed => Self::COMPLETED,
        }
    }
}

impl From<SaleStatus> for StatusDisplay {
    fn from(status: SaleStatus) -> Self {
        match status {
            SaleStatus::Pending => Self::PENDING,
            SaleStatus::Confirmed => Self::CONFIRMED,
            SaleStatus::Cancelled => Self::CANCELLED,
            SaleStatus::Completed => Self::COMPLETED,
        }
    }
}

/// Booking with its status metadata.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    /// Booking fields, inlined
    #[serde(flatten)]
    pub booking: Booking,
    /// Status metadata
    pub display: StatusDisplay,
}

impl From<Booking> for BookingView {
    fn from(booking: Booking) -> Self {
        let display = booking.status.into();
        Self { booking, display }
    }
}

/// Sale with its status metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    /// Sale fields, inlined
    #[serde(flatten)]
    pub sale: Sale,
    /// Status metadata
    pub display: StatusDisplay,
}

impl From<Sale> for SaleView {
    fn from(sale: Sale) -> Self {
        let display = sale.status.into();
        Self { sale, display }
    }
}
