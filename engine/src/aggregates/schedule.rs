//! Schedule aggregate: pets and their bookings.
//!
//! Pet registration, pet removal, and booking creation lock the pet, so the
//! availability check and the insert of a new booking can never interleave
//! with another request for the same pet. Status transitions lock only the
//! booking: confirming keeps the slot held, cancelling and completing only
//! free it, so they never invalidate a concurrent decision for the pet.

use crate::availability::{BusinessHours, TimeWindow, find_conflict};
use crate::catalog::ServiceCatalog;
use crate::error::EngineError;
use crate::types::{Booking, BookingId, BookingStatus, NewPet, OwnerId, Pet, PetId, ServiceId};
use chrono::{DateTime, Utc};
use dogspa_core::environment::Clock;
use dogspa_core::reducer::Reducer;
use dogspa_core::{SmallVec, smallvec};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Longest accepted booking note, in characters
pub const MAX_NOTES_CHARS: usize = 1000;

/// Longest accepted pet name, in characters
pub const MAX_PET_NAME_CHARS: usize = 100;

// ============================================================================
// State
// ============================================================================

/// Pets and bookings.
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    pets: BTreeMap<PetId, Pet>,
    bookings: BTreeMap<BookingId, Booking>,
    by_pet: HashMap<PetId, Vec<BookingId>>,
}

impl ScheduleState {
    /// Empty schedule
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pet by ID
    #[must_use]
    pub fn pet(&self, id: &PetId) -> Option<&Pet> {
        self.pets.get(id)
    }

    /// Booking by ID
    #[must_use]
    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    /// Every booking ever made for a pet, in creation order
    pub fn bookings_of_pet<'a>(&'a self, pet_id: &PetId) -> impl Iterator<Item = &'a Booking> + 'a {
        self.by_pet
            .get(pet_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.bookings.get(id))
    }

    /// An owner's pets, oldest registration first
    #[must_use]
    pub fn pets_of(&self, owner_id: &OwnerId) -> Vec<Pet> {
        let mut pets: Vec<Pet> = self
            .pets
            .values()
            .filter(|p| &p.owner_id == owner_id)
            .cloned()
            .collect();
        pets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        pets
    }

    /// An owner's bookings, latest appointment first
    #[must_use]
    pub fn bookings_of(&self, owner_id: &OwnerId) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .values()
            .filter(|b| &b.owner_id == owner_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        bookings
    }

    /// Number of bookings holding a slot
    #[must_use]
    pub fn active_booking_count(&self) -> usize {
        self.bookings
            .values()
            .filter(|b| b.status.holds_slot())
            .count()
    }

    /// Look up a pet and check it belongs to `owner_id`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] or [`EngineError::Forbidden`].
    pub fn owned_pet(&self, pet_id: &PetId, owner_id: &OwnerId) -> Result<&Pet, EngineError> {
        let pet = self
            .pets
            .get(pet_id)
            .ok_or_else(|| EngineError::not_found("Pet", pet_id))?;
        if &pet.owner_id != owner_id {
            return Err(EngineError::Forbidden(format!(
                "Pet {pet_id} belongs to another owner"
            )));
        }
        Ok(pet)
    }

    /// Look up a booking and check it belongs to `owner_id`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] or [`EngineError::Forbidden`].
    pub fn owned_booking(
        &self,
        booking_id: &BookingId,
        owner_id: &OwnerId,
    ) -> Result<&Booking, EngineError> {
        let booking = self
            .bookings
            .get(booking_id)
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;
        if &booking.owner_id != owner_id {
            return Err(EngineError::Forbidden(format!(
                "Booking {booking_id} belongs to another owner"
            )));
        }
        Ok(booking)
    }
}

// ============================================================================
// Actions & Events
// ============================================================================

/// Requests against the schedule.
#[derive(Debug, Clone)]
pub enum ScheduleAction {
    /// Register a pet for an owner
    RegisterPet {
        /// ID for the new pet
        pet_id: PetId,
        /// Owner
        owner_id: OwnerId,
        /// Pet details
        pet: NewPet,
    },
    /// Remove a pet with no active bookings
    RemovePet {
        /// Pet
        pet_id: PetId,
        /// Caller
        requester: OwnerId,
    },
    /// Book a service for a pet
    CreateBooking {
        /// ID for the new booking
        booking_id: BookingId,
        /// Caller
        owner_id: OwnerId,
        /// Pet
        pet_id: PetId,
        /// Service
        service_id: ServiceId,
        /// Requested start
        scheduled_at: DateTime<Utc>,
        /// Owner notes
        notes: Option<String>,
    },
    /// Owner cancels a booking
    CancelBooking {
        /// Booking
        booking_id: BookingId,
        /// Caller
        requester: OwnerId,
    },
    /// Facility confirms a pending booking
    ConfirmBooking {
        /// Booking
        booking_id: BookingId,
    },
    /// Facility marks a confirmed booking as delivered
    CompleteBooking {
        /// Booking
        booking_id: BookingId,
    },
}

/// Facts recorded by the schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleEvent {
    /// A pet was registered
    PetRegistered(Pet),
    /// A pet was removed
    PetRemoved {
        /// Removed pet
        pet_id: PetId,
    },
    /// A booking was created in `PENDING`
    BookingCreated(Booking),
    /// A booking changed status
    BookingStatusChanged {
        /// Booking after the change
        booking: Booking,
        /// Previous status
        from: BookingStatus,
    },
}

impl ScheduleEvent {
    /// The booking this event created or changed
    #[must_use]
    pub const fn booking(&self) -> Option<&Booking> {
        match self {
            Self::BookingCreated(booking) | Self::BookingStatusChanged { booking, .. } => {
                Some(booking)
            }
            Self::PetRegistered(_) | Self::PetRemoved { .. } => None,
        }
    }
}

/// Lock keys of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScheduleKey {
    /// Everything about one pet: its record and new bookings for it
    Pet(PetId),
    /// Status of one existing booking
    Booking(BookingId),
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the schedule reducer.
#[derive(Clone)]
pub struct ScheduleEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Bookable services
    pub catalog: Arc<dyn ServiceCatalog>,
    /// Facility opening hours
    pub hours: BusinessHours,
}

impl ScheduleEnvironment {
    /// Create a new environment
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, catalog: Arc<dyn ServiceCatalog>, hours: BusinessHours) -> Self {
        Self {
            clock,
            catalog,
            hours,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the schedule aggregate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleReducer;

impl ScheduleReducer {
    /// Create a new reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn register_pet(
        state: &ScheduleState,
        pet_id: PetId,
        owner_id: OwnerId,
        pet: NewPet,
        now: DateTime<Utc>,
    ) -> Result<ScheduleEvent, EngineError> {
        let name = pet.name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("Pet name must not be empty"));
        }
        if name.chars().count() > MAX_PET_NAME_CHARS {
            return Err(EngineError::validation(format!(
                "Pet name must be at most {MAX_PET_NAME_CHARS} characters"
            )));
        }
        if let Some(weight) = pet.weight_kg {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(EngineError::validation("Pet weight must be a positive number"));
            }
        }
        if state.pets.contains_key(&pet_id) {
            return Err(EngineError::InvalidState(format!("Pet {pet_id} already exists")));
        }

        Ok(ScheduleEvent::PetRegistered(Pet {
            id: pet_id,
            owner_id,
            name: name.to_string(),
            species: pet.species,
            breed: non_blank(pet.breed),
            age_years: pet.age_years,
            weight_kg: pet.weight_kg,
            special_notes: non_blank(pet.special_notes),
            created_at: now,
        }))
    }

    fn remove_pet(
        state: &ScheduleState,
        pet_id: PetId,
        requester: OwnerId,
    ) -> Result<ScheduleEvent, EngineError> {
        state.owned_pet(&pet_id, &requester)?;
        if let Some(active) = state.bookings_of_pet(&pet_id).find(|b| b.status.holds_slot()) {
            return Err(EngineError::InvalidState(format!(
                "Pet {pet_id} has an active booking ({}); cancel it first",
                active.id
            )));
        }
        Ok(ScheduleEvent::PetRemoved { pet_id })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_booking(
        state: &ScheduleState,
        env: &ScheduleEnvironment,
        booking_id: BookingId,
        owner_id: OwnerId,
        pet_id: PetId,
        service_id: ServiceId,
        scheduled_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<ScheduleEvent, EngineError> {
        let notes = non_blank(notes);
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_CHARS) {
            return Err(EngineError::validation(format!(
                "Notes must be at most {MAX_NOTES_CHARS} characters"
            )));
        }

        let now = env.clock.now();
        if scheduled_at <= now {
            return Err(EngineError::validation(format!(
                "Booking date {} must be in the future",
                scheduled_at.to_rfc3339()
            )));
        }

        let service = env
            .catalog
            .service(&service_id)
            .ok_or_else(|| EngineError::not_found("Service", service_id))?;
        if !service.is_active {
            return Err(EngineError::validation(format!(
                "Service {} is not currently offered",
                service.name
            )));
        }

        state.owned_pet(&pet_id, &owner_id)?;
        env.hours.check(scheduled_at)?;

        let window = TimeWindow::starting_at(scheduled_at, service.duration_minutes)?;
        if let Some(existing) = find_conflict(&window, state.bookings_of_pet(&pet_id)) {
            return Err(EngineError::Conflict {
                conflicting: existing.id,
            });
        }
        if state.bookings.contains_key(&booking_id) {
            return Err(EngineError::InvalidState(format!(
                "Booking {booking_id} already exists"
            )));
        }

        Ok(ScheduleEvent::BookingCreated(Booking {
            id: booking_id,
            pet_id,
            service_id,
            owner_id,
            scheduled_at,
            duration_minutes: service.duration_minutes,
            status: BookingStatus::Pending,
            total_price: service.price,
            notes,
            created_at: now,
            updated_at: now,
        }))
    }

    fn transition(
        state: &ScheduleState,
        booking_id: BookingId,
        requester: Option<OwnerId>,
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<ScheduleEvent, EngineError> {
        let current = match requester {
            Some(owner) => state.owned_booking(&booking_id, &owner)?,
            None => state
                .booking(&booking_id)
                .ok_or_else(|| EngineError::not_found("Booking", booking_id))?,
        };

        if !current.status.can_transition_to(next) {
            return Err(EngineError::InvalidState(format!(
                "Booking {booking_id} is {} and cannot become {next}",
                current.status
            )));
        }
        if next == BookingStatus::Completed && now < current.scheduled_at {
            return Err(EngineError::TooEarly {
                booking_id,
                scheduled_at: current.scheduled_at,
            });
        }

        let mut booking = current.clone();
        booking.status = next;
        booking.updated_at = now;
        Ok(ScheduleEvent::BookingStatusChanged {
            booking,
            from: current.status,
        })
    }
}

impl Reducer for ScheduleReducer {
    type State = ScheduleState;
    type Action = ScheduleAction;
    type Event = ScheduleEvent;
    type Error = EngineError;
    type Environment = ScheduleEnvironment;
    type Key = ScheduleKey;

    fn lock_keys(&self, action: &ScheduleAction) -> SmallVec<[ScheduleKey; 4]> {
        match action {
            ScheduleAction::RegisterPet { pet_id, .. }
            | ScheduleAction::RemovePet { pet_id, .. }
            | ScheduleAction::CreateBooking { pet_id, .. } => smallvec![ScheduleKey::Pet(*pet_id)],
            ScheduleAction::CancelBooking { booking_id, .. }
            | ScheduleAction::ConfirmBooking { booking_id }
            | ScheduleAction::CompleteBooking { booking_id } => {
                smallvec![ScheduleKey::Booking(*booking_id)]
            }
        }
    }

    fn decide(
        &self,
        state: &ScheduleState,
        action: ScheduleAction,
        env: &ScheduleEnvironment,
    ) -> Result<ScheduleEvent, EngineError> {
        match action {
            ScheduleAction::RegisterPet {
                pet_id,
                owner_id,
                pet,
            } => Self::register_pet(state, pet_id, owner_id, pet, env.clock.now()),
            ScheduleAction::RemovePet { pet_id, requester } => {
                Self::remove_pet(state, pet_id, requester)
            }
            ScheduleAction::CreateBooking {
                booking_id,
                owner_id,
                pet_id,
                service_id,
                scheduled_at,
                notes,
            } => Self::create_booking(
                state,
                env,
                booking_id,
                owner_id,
                pet_id,
                service_id,
                scheduled_at,
                notes,
            ),
            ScheduleAction::CancelBooking {
                booking_id,
                requester,
            } => Self::transition(
                state,
                booking_id,
                Some(requester),
                BookingStatus::Cancelled,
                env.clock.now(),
            ),
            ScheduleAction::ConfirmBooking { booking_id } => Self::transition(
                state,
                booking_id,
                None,
                BookingStatus::Confirmed,
                env.clock.now(),
            ),
            ScheduleAction::CompleteBooking { booking_id } => Self::transition(
                state,
                booking_id,
                None,
                BookingStatus::Completed,
                env.clock.now(),
            ),
        }
    }

    fn apply(&self, state: &mut ScheduleState, event: &ScheduleEvent) {
        match event {
            ScheduleEvent::PetRegistered(pet) => {
                state.pets.insert(pet.id, pet.clone());
            }
            ScheduleEvent::PetRemoved { pet_id } => {
                state.pets.remove(pet_id);
            }
            ScheduleEvent::BookingCreated(booking) => {
                state.by_pet.entry(booking.pet_id).or_default().push(booking.id);
                state.bookings.insert(booking.id, booking.clone());
            }
            ScheduleEvent::BookingStatusChanged { booking, .. } => {
                state.bookings.insert(booking.id, booking.clone());
            }
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::types::{Money, Service, ServiceCategory, Species};
    use chrono::{NaiveTime, TimeZone};
    use chrono_tz::Tz;
    use dogspa_testing::{FixedClock, ReducerTest, test_time};

    fn service(active: bool) -> Service {
        Service {
            id: ServiceId::new(),
            name: if active { "Bath" } else { "Vet check" }.to_string(),
            description: String::new(),
            category: ServiceCategory::Bath,
            price: Money::from_cents(1500),
            duration_minutes: 60,
            is_active: active,
        }
    }

    struct Fixture {
        env: ScheduleEnvironment,
        bath: Service,
        vet: Service,
        owner: OwnerId,
        pet: Pet,
    }

    fn fixture() -> Fixture {
        let bath = service(true);
        let vet = service(false);
        let hours = BusinessHours::new(
            Tz::UTC,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
        .unwrap();
        let env = ScheduleEnvironment::new(
            Arc::new(FixedClock::new(test_time())),
            Arc::new(InMemoryCatalog::new([bath.clone(), vet.clone()])),
            hours,
        );
        let owner = OwnerId::new();
        let pet = Pet {
            id: PetId::new(),
            owner_id: owner,
            name: "Firulais".to_string(),
            species: Species::Dog,
            breed: None,
            age_years: Some(3),
            weight_kg: Some(12.5),
            special_notes: None,
            created_at: test_time(),
        };
        Fixture {
            env,
            bath,
            vet,
            owner,
            pet,
        }
    }

    fn state_with(pet: &Pet, bookings: &[Booking]) -> ScheduleState {
        let mut state = ScheduleState::new();
        let reducer = ScheduleReducer;
        reducer.apply(&mut state, &ScheduleEvent::PetRegistered(pet.clone()));
        for booking in bookings {
            reducer.apply(&mut state, &ScheduleEvent::BookingCreated(booking.clone()));
        }
        state
    }

    /// 2 January 2025 at `h:m` UTC, one day after the test clock.
    fn tomorrow(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, h, m, 0).unwrap()
    }

    fn booking_for(f: &Fixture, at: DateTime<Utc>, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(),
            pet_id: f.pet.id,
            service_id: f.bath.id,
            owner_id: f.owner,
            scheduled_at: at,
            duration_minutes: 60,
            status,
            total_price: f.bath.price,
            notes: None,
            created_at: test_time(),
            updated_at: test_time(),
        }
    }

    fn create(f: &Fixture, at: DateTime<Utc>) -> ScheduleAction {
        ScheduleAction::CreateBooking {
            booking_id: BookingId::new(),
            owner_id: f.owner,
            pet_id: f.pet.id,
            service_id: f.bath.id,
            scheduled_at: at,
            notes: Some("  Sensitive skin  ".to_string()),
        }
    }

    #[test]
    fn create_booking_snapshots_price_and_starts_pending() {
        let f = fixture();
        let price = f.bath.price;
        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(state_with(&f.pet, &[]))
            .when_action(create(&f, tomorrow(10, 0)))
            .then_event(move |event| {
                let booking = event.booking().unwrap();
                assert_eq!(booking.status, BookingStatus::Pending);
                assert_eq!(booking.total_price, price);
                assert_eq!(booking.duration_minutes, 60);
                assert_eq!(booking.notes.as_deref(), Some("Sensitive skin"));
            })
            .then_state(|state| assert_eq!(state.active_booking_count(), 1))
            .run();
    }

    #[test]
    fn business_hour_boundaries() {
        let f = fixture();
        for (h, m, ok) in [(8, 59, false), (9, 0, true), (17, 59, true), (18, 0, false)] {
            let state = state_with(&f.pet, &[]);
            let result = ScheduleReducer.decide(&state, create(&f, tomorrow(h, m)), &f.env);
            if ok {
                assert!(result.is_ok(), "{h}:{m} should be accepted");
            } else {
                assert!(
                    matches!(result, Err(EngineError::OutOfHours { .. })),
                    "{h}:{m} should be out of hours"
                );
            }
        }
    }

    #[test]
    fn past_or_present_start_rejected() {
        let f = fixture();
        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(state_with(&f.pet, &[]))
            .when_action(create(&f, test_time()))
            .then_error(|err| assert!(matches!(err, EngineError::Validation(_))))
            .then_state(|state| assert_eq!(state.active_booking_count(), 0))
            .run();
    }

    #[test]
    fn overlapping_booking_conflicts() {
        let f = fixture();
        let existing = booking_for(&f, tomorrow(10, 0), BookingStatus::Confirmed);
        let existing_id = existing.id;
        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(state_with(&f.pet, &[existing]))
            .when_action(create(&f, tomorrow(10, 30)))
            .then_error(move |err| {
                assert_eq!(
                    err,
                    &EngineError::Conflict {
                        conflicting: existing_id
                    }
                );
            })
            .run();
    }

    #[test]
    fn back_to_back_and_cancelled_slots_are_free() {
        let f = fixture();
        let before = booking_for(&f, tomorrow(9, 0), BookingStatus::Pending);
        let cancelled = booking_for(&f, tomorrow(10, 0), BookingStatus::Cancelled);
        let state = state_with(&f.pet, &[before, cancelled]);
        assert!(ScheduleReducer.decide(&state, create(&f, tomorrow(10, 0)), &f.env).is_ok());
    }

    #[test]
    fn check_order_reports_validation_before_ownership() {
        let f = fixture();
        let stranger = OwnerId::new();
        let state = state_with(&f.pet, &[]);

        let inactive = ScheduleAction::CreateBooking {
            booking_id: BookingId::new(),
            owner_id: stranger,
            pet_id: f.pet.id,
            service_id: f.vet.id,
            scheduled_at: tomorrow(10, 0),
            notes: None,
        };
        assert!(matches!(
            ScheduleReducer.decide(&state, inactive, &f.env),
            Err(EngineError::Validation(_))
        ));

        let foreign_pet = ScheduleAction::CreateBooking {
            booking_id: BookingId::new(),
            owner_id: stranger,
            pet_id: f.pet.id,
            service_id: f.bath.id,
            scheduled_at: tomorrow(7, 0),
            notes: None,
        };
        assert!(matches!(
            ScheduleReducer.decide(&state, foreign_pet, &f.env),
            Err(EngineError::Forbidden(_))
        ));

        let long_notes = ScheduleAction::CreateBooking {
            booking_id: BookingId::new(),
            owner_id: f.owner,
            pet_id: PetId::new(),
            service_id: ServiceId::new(),
            scheduled_at: test_time(),
            notes: Some("x".repeat(MAX_NOTES_CHARS + 1)),
        };
        assert!(matches!(
            ScheduleReducer.decide(&state, long_notes, &f.env),
            Err(EngineError::Validation(msg)) if msg.contains("Notes")
        ));
    }

    #[test]
    fn unknown_service_and_pet_not_found() {
        let f = fixture();
        let state = state_with(&f.pet, &[]);
        let unknown_service = ScheduleAction::CreateBooking {
            booking_id: BookingId::new(),
            owner_id: f.owner,
            pet_id: f.pet.id,
            service_id: ServiceId::new(),
            scheduled_at: tomorrow(10, 0),
            notes: None,
        };
        assert!(matches!(
            ScheduleReducer.decide(&state, unknown_service, &f.env),
            Err(EngineError::NotFound { resource: "Service", .. })
        ));

        let unknown_pet = ScheduleAction::CreateBooking {
            booking_id: BookingId::new(),
            owner_id: f.owner,
            pet_id: PetId::new(),
            service_id: f.bath.id,
            scheduled_at: tomorrow(10, 0),
            notes: None,
        };
        assert!(matches!(
            ScheduleReducer.decide(&state, unknown_pet, &f.env),
            Err(EngineError::NotFound { resource: "Pet", .. })
        ));
    }

    #[test]
    fn cancel_requires_owner() {
        let f = fixture();
        let booking = booking_for(&f, tomorrow(10, 0), BookingStatus::Pending);
        let booking_id = booking.id;
        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(state_with(&f.pet, &[booking]))
            .when_action(ScheduleAction::CancelBooking {
                booking_id,
                requester: OwnerId::new(),
            })
            .then_error(|err| assert!(matches!(err, EngineError::Forbidden(_))))
            .then_state(move |state| {
                assert_eq!(
                    state.booking(&booking_id).unwrap().status,
                    BookingStatus::Pending
                );
            })
            .run();
    }

    #[test]
    fn cancelling_twice_is_invalid_and_changes_nothing() {
        let f = fixture();
        let booking = booking_for(&f, tomorrow(10, 0), BookingStatus::Cancelled);
        let booking_id = booking.id;
        let before = booking.clone();
        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(state_with(&f.pet, &[booking]))
            .when_action(ScheduleAction::CancelBooking {
                booking_id,
                requester: f.owner,
            })
            .then_error(|err| assert!(matches!(err, EngineError::InvalidState(_))))
            .then_state(move |state| assert_eq!(state.booking(&booking_id), Some(&before)))
            .run();
    }

    #[test]
    fn confirm_then_complete_follows_state_machine() {
        let f = fixture();
        let past = Utc.with_ymd_and_hms(2024, 12, 31, 10, 0, 0).unwrap();
        let pending = booking_for(&f, past, BookingStatus::Pending);
        let id = pending.id;
        let mut state = state_with(&f.pet, &[pending]);

        let complete_early = ScheduleReducer.decide(
            &state,
            ScheduleAction::CompleteBooking { booking_id: id },
            &f.env,
        );
        assert!(matches!(complete_early, Err(EngineError::InvalidState(_))));

        let event = ScheduleReducer
            .reduce(&mut state, ScheduleAction::ConfirmBooking { booking_id: id }, &f.env)
            .unwrap();
        assert!(matches!(
            event,
            ScheduleEvent::BookingStatusChanged {
                from: BookingStatus::Pending,
                ..
            }
        ));

        ScheduleReducer
            .reduce(&mut state, ScheduleAction::CompleteBooking { booking_id: id }, &f.env)
            .unwrap();
        assert_eq!(state.booking(&id).unwrap().status, BookingStatus::Completed);

        let again = ScheduleReducer.decide(
            &state,
            ScheduleAction::ConfirmBooking { booking_id: id },
            &f.env,
        );
        assert!(matches!(again, Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn complete_before_start_is_too_early() {
        let f = fixture();
        let confirmed = booking_for(&f, tomorrow(10, 0), BookingStatus::Confirmed);
        let id = confirmed.id;
        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(state_with(&f.pet, &[confirmed]))
            .when_action(ScheduleAction::CompleteBooking { booking_id: id })
            .then_error(move |err| {
                assert!(matches!(err, EngineError::TooEarly { booking_id, .. } if *booking_id == id));
            })
            .run();
    }

    #[test]
    fn register_pet_trims_and_validates_name() {
        let f = fixture();
        let owner = f.owner;
        let new_pet = |name: &str| NewPet {
            name: name.to_string(),
            species: Species::Cat,
            breed: Some("  ".to_string()),
            age_years: None,
            weight_kg: None,
            special_notes: None,
        };

        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(ScheduleState::new())
            .when_action(ScheduleAction::RegisterPet {
                pet_id: PetId::new(),
                owner_id: owner,
                pet: new_pet("  Michi "),
            })
            .then_event(|event| {
                assert!(matches!(
                    event,
                    ScheduleEvent::PetRegistered(pet) if pet.name == "Michi" && pet.breed.is_none()
                ));
            })
            .then_state(move |state| assert_eq!(state.pets_of(&owner).len(), 1))
            .run();

        let too_long = "a".repeat(MAX_PET_NAME_CHARS + 1);
        for bad in ["   ", too_long.as_str()] {
            let result = ScheduleReducer.decide(
                &ScheduleState::new(),
                ScheduleAction::RegisterPet {
                    pet_id: PetId::new(),
                    owner_id: owner,
                    pet: new_pet(bad),
                },
                &f.env,
            );
            assert!(matches!(result, Err(EngineError::Validation(_))));
        }
    }

    #[test]
    fn pet_with_active_booking_cannot_be_removed() {
        let f = fixture();
        let active = booking_for(&f, tomorrow(10, 0), BookingStatus::Confirmed);
        let state = state_with(&f.pet, &[active]);
        let result = ScheduleReducer.decide(
            &state,
            ScheduleAction::RemovePet {
                pet_id: f.pet.id,
                requester: f.owner,
            },
            &f.env,
        );
        assert!(matches!(result, Err(EngineError::InvalidState(_))));

        let done = booking_for(&f, tomorrow(10, 0), BookingStatus::Completed);
        let pet_id = f.pet.id;
        let owner = f.owner;
        ReducerTest::new(ScheduleReducer)
            .with_env(f.env.clone())
            .given_state(state_with(&f.pet, &[done]))
            .when_action(ScheduleAction::RemovePet {
                pet_id,
                requester: owner,
            })
            .then_state(move |state| {
                assert!(state.pet(&pet_id).is_none());
                assert_eq!(state.bookings_of(&owner).len(), 1);
            })
            .run();
    }

    #[test]
    fn owner_bookings_listed_latest_first() {
        let f = fixture();
        let early = booking_for(&f, tomorrow(9, 0), BookingStatus::Pending);
        let late = booking_for(&f, tomorrow(15, 0), BookingStatus::Pending);
        let state = state_with(&f.pet, &[early.clone(), late.clone()]);
        let ids: Vec<BookingId> = state.bookings_of(&f.owner).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);
        assert!(state.bookings_of(&OwnerId::new()).is_empty());
    }

    #[test]
    fn lock_keys_follow_pet_and_booking() {
        let f = fixture();
        let keys = ScheduleReducer.lock_keys(&create(&f, tomorrow(10, 0)));
        assert_eq!(keys.as_slice(), &[ScheduleKey::Pet(f.pet.id)]);

        let booking_id = BookingId::new();
        let keys = ScheduleReducer.lock_keys(&ScheduleAction::ConfirmBooking { booking_id });
        assert_eq!(keys.as_slice(), &[ScheduleKey::Booking(booking_id)]);
    }
}
