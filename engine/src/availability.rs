//! Slot checks for bookings.
//!
//! A booking occupies the half-open window `[start, start + duration)`. Two
//! windows overlap iff `a.start < b.end && b.start < a.end`, so back-to-back
//! appointments are allowed.

use crate::error::EngineError;
use crate::types::{Booking, BookingId};
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Half-open time interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `duration_minutes` starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the end is past the representable range.
    pub fn starting_at(start: DateTime<Utc>, duration_minutes: u32) -> Result<Self, EngineError> {
        start
            .checked_add_signed(chrono::Duration::minutes(i64::from(duration_minutes)))
            .map(|end| Self { start, end })
            .ok_or_else(|| {
                EngineError::validation(format!(
                    "Booking date {} is too far in the future",
                    start.to_rfc3339()
                ))
            })
    }

    /// Window occupied by an existing booking.
    #[must_use]
    pub fn of(booking: &Booking) -> Option<Self> {
        Self::starting_at(booking.scheduled_at, booking.duration_minutes).ok()
    }

    /// Whether the two windows share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Facility opening hours in its local time zone.
///
/// Only the start of a booking is tested: it must fall in `[opens, closes)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusinessHours {
    tz: Tz,
    opens: NaiveTime,
    closes: NaiveTime,
}

impl BusinessHours {
    /// Build opening hours; `opens` must be earlier than `closes`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the range is empty.
    pub fn new(tz: Tz, opens: NaiveTime, closes: NaiveTime) -> Result<Self, EngineError> {
        if opens >= closes {
            return Err(EngineError::validation(format!(
                "Opening time {opens} must be before closing time {closes}"
            )));
        }
        Ok(Self { tz, opens, closes })
    }

    /// Facility time zone
    #[must_use]
    pub const fn tz(&self) -> Tz {
        self.tz
    }

    /// Opening time (inclusive)
    #[must_use]
    pub const fn opens(&self) -> NaiveTime {
        self.opens
    }

    /// Closing time (exclusive)
    #[must_use]
    pub const fn closes(&self) -> NaiveTime {
        self.closes
    }

    /// Local time-of-day of `at`, truncated to the minute.
    #[must_use]
    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveTime {
        let local = at.with_timezone(&self.tz).time();
        local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local)
    }

    /// Whether a booking may start at `at`.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.tz).time();
        self.opens <= local && local < self.closes
    }

    /// Reject a start outside opening hours.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfHours`].
    pub fn check(&self, at: DateTime<Utc>) -> Result<(), EngineError> {
        if self.contains(at) {
            Ok(())
        } else {
            Err(EngineError::OutOfHours {
                requested: self.local_time(at),
                opens: self.opens,
                closes: self.closes,
            })
        }
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::Santiago,
            opens: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            closes: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        }
    }
}

/// Outcome of a slot probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// No slot-holding booking of the pet overlaps `window`
    pub available: bool,
    /// Start falls inside opening hours
    pub within_business_hours: bool,
    /// Proposed window
    pub window: TimeWindow,
    /// First overlapping booking, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_booking_id: Option<BookingId>,
}

/// First booking in `existing` that holds its slot and overlaps `window`.
pub fn find_conflict<'a, I>(window: &TimeWindow, existing: I) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    existing
        .into_iter()
        .filter(|b| b.status.holds_slot())
        .find(|b| TimeWindow::of(b).is_some_and(|w| w.overlaps(window)))
}

/// Probe a window against a pet's bookings and the opening hours.
pub fn check_availability<'a, I>(
    hours: &BusinessHours,
    window: TimeWindow,
    existing: I,
) -> Availability
where
    I: IntoIterator<Item = &'a Booking>,
{
    let conflict = find_conflict(&window, existing).map(|b| b.id);
    Availability {
        available: conflict.is_none(),
        within_business_hours: hours.contains(window.start),
        window,
        conflicting_booking_id: conflict,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{BookingStatus, Money, OwnerId, PetId, ServiceId};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn utc_hours() -> BusinessHours {
        BusinessHours::new(
            Tz::UTC,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn booking(start: DateTime<Utc>, minutes: u32, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(),
            pet_id: PetId::new(),
            service_id: ServiceId::new(),
            owner_id: OwnerId::new(),
            scheduled_at: start,
            duration_minutes: minutes,
            status,
            total_price: Money::from_cents(1000),
            notes: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn business_hours_boundaries() {
        let hours = utc_hours();
        assert!(!hours.contains(at(8, 59)));
        assert!(hours.contains(at(9, 0)));
        assert!(hours.contains(at(17, 59)));
        assert!(!hours.contains(at(18, 0)));
    }

    #[test]
    fn out_of_hours_reports_local_time() {
        let err = utc_hours().check(at(18, 0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::OutOfHours { requested, .. } if requested == NaiveTime::from_hms_opt(18, 0, 0).unwrap()
        ));
    }

    #[test]
    fn hours_follow_facility_time_zone() {
        let hours = BusinessHours::new(
            chrono_tz::America::New_York,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
        .unwrap();
        // 10 March 2025: New York is UTC-4 (DST started 9 March)
        assert!(!hours.contains(at(12, 59)));
        assert!(hours.contains(at(13, 0)));
    }

    #[test]
    fn empty_hours_rejected() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(BusinessHours::new(Tz::UTC, nine, nine).is_err());
    }

    #[test]
    fn back_to_back_windows_do_not_overlap() {
        let first = TimeWindow::starting_at(at(10, 0), 60).unwrap();
        let second = TimeWindow::starting_at(at(11, 0), 30).unwrap();
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
        assert!(first.overlaps(&TimeWindow::starting_at(at(10, 59), 30).unwrap()));
    }

    #[test]
    fn window_past_the_calendar_end_is_rejected() {
        let last = chrono::NaiveDate::MAX.and_hms_opt(23, 30, 0).unwrap().and_utc();
        let err = TimeWindow::starting_at(last, 60).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(TimeWindow::starting_at(last, 29).is_ok());
    }

    #[test]
    fn terminal_bookings_free_their_slot() {
        let cancelled = booking(at(10, 0), 60, BookingStatus::Cancelled);
        let completed = booking(at(10, 0), 60, BookingStatus::Completed);
        let window = TimeWindow::starting_at(at(10, 30), 30).unwrap();
        assert!(find_conflict(&window, [&cancelled, &completed]).is_none());

        let confirmed = booking(at(10, 0), 60, BookingStatus::Confirmed);
        let found = find_conflict(&window, [&cancelled, &confirmed]).unwrap();
        assert_eq!(found.id, confirmed.id);
    }

    #[test]
    fn probe_reports_conflict_and_hours() {
        let pending = booking(at(9, 0), 45, BookingStatus::Pending);
        let result = check_availability(
            &utc_hours(),
            TimeWindow::starting_at(at(9, 30), 30).unwrap(),
            [&pending],
        );
        assert!(!result.available);
        assert!(result.within_business_hours);
        assert_eq!(result.conflicting_booking_id, Some(pending.id));
    }
}
