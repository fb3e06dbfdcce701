//! Engine facade.
//!
//! [`SpaEngine`] is the single entry point for the presentation layer. It
//! generates identifiers, routes each operation to the schedule or
//! inventory store, and records metrics. Business rules live in the
//! aggregates.

use crate::aggregates::{
    InventoryAction, InventoryEnvironment, InventoryEvent, InventoryReducer, InventoryState,
    ScheduleAction, ScheduleEnvironment, ScheduleEvent, ScheduleReducer, ScheduleState,
};
use crate::availability::{Availability, BusinessHours, TimeWindow, check_availability};
use crate::cart::{CartEvent, CartSummary, consolidate, summarize};
use crate::catalog::{CatalogError, CatalogSeed, InMemoryCatalog, ServiceCatalog};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::metrics;
use crate::types::{
    Booking, BookingId, CartLine, NewPet, OwnerId, Pet, PetId, Product, ProductId, Sale, SaleId,
    Service, ServiceId,
};
use chrono::{DateTime, Utc};
use dogspa_core::environment::{Clock, SystemClock};
use dogspa_runtime::{Store, StoreConfig};
use std::sync::Arc;

/// Booking and order engine.
pub struct SpaEngine {
    catalog: Arc<InMemoryCatalog>,
    schedule: Store<ScheduleReducer>,
    inventory: Store<InventoryReducer>,
    hours: BusinessHours,
}

impl SpaEngine {
    /// Build an engine from a catalog seed.
    #[must_use]
    pub fn new(seed: CatalogSeed, clock: Arc<dyn Clock>, config: &EngineConfig) -> Self {
        let (catalog, products) = seed.into_parts();
        let catalog = Arc::new(catalog);
        let hours = config.business_hours;

        let schedule = Store::with_config(
            ScheduleState::new(),
            ScheduleReducer::new(),
            ScheduleEnvironment::new(
                Arc::clone(&clock),
                Arc::clone(&catalog) as Arc<dyn ServiceCatalog>,
                hours,
            ),
            StoreConfig::named("schedule").with_lock_timeout(config.lock_timeout),
        );
        let inventory = Store::with_config(
            InventoryState::new(products),
            InventoryReducer::new(),
            InventoryEnvironment::new(clock),
            StoreConfig::named("inventory").with_lock_timeout(config.lock_timeout),
        );

        Self {
            catalog,
            schedule,
            inventory,
            hours,
        }
    }

    /// Build an engine on the system clock, seeding from the configured
    /// catalog file or the built-in demo catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the seed cannot be loaded.
    pub fn from_config(config: &EngineConfig) -> std::result::Result<Self, CatalogError> {
        let seed = match &config.catalog_path {
            Some(path) => CatalogSeed::load(path)?,
            None => CatalogSeed::demo()?,
        };
        tracing::info!(
            services = seed.services.len(),
            products = seed.products.len(),
            source = config
                .catalog_path
                .as_ref()
                .map_or_else(|| "demo".to_string(), |p| p.display().to_string()),
            "Catalog loaded"
        );
        Ok(Self::new(seed, Arc::new(SystemClock), config))
    }

    /// Facility opening hours
    #[must_use]
    pub const fn business_hours(&self) -> &BusinessHours {
        &self.hours
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Every service, ordered by name
    #[must_use]
    pub fn list_services(&self) -> Vec<Service> {
        self.catalog.services()
    }

    /// Service by ID.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if unknown.
    pub fn get_service(&self, id: &ServiceId) -> Result<Service> {
        self.catalog
            .service(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("Service", id))
    }

    /// Every product with current stock, ordered by name
    pub async fn list_products(&self) -> Vec<Product> {
        self.inventory.state(InventoryState::products).await
    }

    /// Product by ID with current stock.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if unknown.
    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        self.inventory
            .state(|s| s.product(id).cloned())
            .await
            .ok_or_else(|| EngineError::not_found("Product", id))
    }

    // ========================================================================
    // Pets
    // ========================================================================

    /// Register a pet for `owner_id`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for a blank or overlong name.
    #[tracing::instrument(skip(self, pet), fields(owner = %owner_id))]
    pub async fn register_pet(&self, owner_id: OwnerId, pet: NewPet) -> Result<Pet> {
        let event = self
            .schedule
            .send(ScheduleAction::RegisterPet {
                pet_id: PetId::new(),
                owner_id,
                pet,
            })
            .await?;
        match event {
            ScheduleEvent::PetRegistered(pet) => {
                metrics::record_pet_registered();
                tracing::info!(pet_id = %pet.id, "Pet registered");
                Ok(pet)
            }
            other => Err(unexpected(&other)),
        }
    }

    /// An owner's pets
    pub async fn list_pets(&self, owner_id: &OwnerId) -> Vec<Pet> {
        self.schedule.state(|s| s.pets_of(owner_id)).await
    }

    /// Remove a pet that has no active bookings.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`], [`EngineError::Forbidden`], or
    /// [`EngineError::InvalidState`] while a booking holds a slot.
    #[tracing::instrument(skip(self), fields(owner = %owner_id))]
    pub async fn remove_pet(&self, owner_id: OwnerId, pet_id: PetId) -> Result<()> {
        self.schedule
            .send(ScheduleAction::RemovePet {
                pet_id,
                requester: owner_id,
            })
            .await?;
        tracing::info!("Pet removed");
        Ok(())
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Book `service_id` for `pet_id` starting at `scheduled_at`.
    ///
    /// # Errors
    ///
    /// Checked in order: [`EngineError::Validation`] (notes, past date,
    /// inactive service), [`EngineError::NotFound`], [`EngineError::Forbidden`],
    /// [`EngineError::OutOfHours`], [`EngineError::Conflict`], and
    /// [`EngineError::Timeout`].
    #[tracing::instrument(skip(self, notes), fields(owner = %owner_id))]
    pub async fn create_booking(
        &self,
        owner_id: OwnerId,
        pet_id: PetId,
        service_id: ServiceId,
        scheduled_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Booking> {
        let event = self
            .schedule
            .send(ScheduleAction::CreateBooking {
                booking_id: BookingId::new(),
                owner_id,
                pet_id,
                service_id,
                scheduled_at,
                notes,
            })
            .await?;
        let booking = into_booking(event)?;
        metrics::record_booking(booking.status);
        tracing::info!(booking_id = %booking.id, "Booking created");
        Ok(booking)
    }

    /// Owner cancels a booking.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`], [`EngineError::Forbidden`], or
    /// [`EngineError::InvalidState`] if already terminal.
    #[tracing::instrument(skip(self), fields(owner = %owner_id))]
    pub async fn cancel_booking(&self, owner_id: OwnerId, booking_id: BookingId) -> Result<Booking> {
        self.transition_booking(ScheduleAction::CancelBooking {
            booking_id,
            requester: owner_id,
        })
        .await
    }

    /// Facility confirms a pending booking.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] or [`EngineError::InvalidState`].
    #[tracing::instrument(skip(self))]
    pub async fn confirm_booking(&self, booking_id: BookingId) -> Result<Booking> {
        self.transition_booking(ScheduleAction::ConfirmBooking { booking_id })
            .await
    }

    /// Facility completes a confirmed booking whose start has passed.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`], [`EngineError::InvalidState`], or
    /// [`EngineError::TooEarly`].
    #[tracing::instrument(skip(self))]
    pub async fn complete_booking(&self, booking_id: BookingId) -> Result<Booking> {
        self.transition_booking(ScheduleAction::CompleteBooking { booking_id })
            .await
    }

    async fn transition_booking(&self, action: ScheduleAction) -> Result<Booking> {
        let booking = into_booking(self.schedule.send(action).await?)?;
        metrics::record_booking(booking.status);
        tracing::info!(booking_id = %booking.id, status = %booking.status, "Booking updated");
        Ok(booking)
    }

    /// One of the caller's bookings.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] or [`EngineError::Forbidden`].
    pub async fn get_booking(&self, owner_id: &OwnerId, booking_id: &BookingId) -> Result<Booking> {
        self.schedule
            .state(|s| s.owned_booking(booking_id, owner_id).cloned())
            .await
    }

    /// The caller's bookings, latest appointment first
    pub async fn list_bookings(&self, owner_id: &OwnerId) -> Vec<Booking> {
        self.schedule.state(|s| s.bookings_of(owner_id)).await
    }

    /// Probe a slot without booking it. Advisory only.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`], [`EngineError::Forbidden`], or
    /// [`EngineError::Validation`] for an inactive service or a window
    /// ending past the representable range.
    pub async fn check_availability(
        &self,
        owner_id: &OwnerId,
        pet_id: &PetId,
        service_id: &ServiceId,
        start: DateTime<Utc>,
    ) -> Result<Availability> {
        let service = self.get_service(service_id)?;
        if !service.is_active {
            return Err(EngineError::validation(format!(
                "Service {} is not currently offered",
                service.name
            )));
        }
        let window = TimeWindow::starting_at(start, service.duration_minutes)?;
        let hours = self.hours;
        self.schedule
            .state(|s| -> Result<Availability> {
                s.owned_pet(pet_id, owner_id)?;
                Ok(check_availability(&hours, window, s.bookings_of_pet(pet_id)))
            })
            .await
    }

    // ========================================================================
    // Cart & sales
    // ========================================================================

    /// Consolidate cart events against current stock and price the result.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] if the total overflows.
    pub async fn preview_cart(&self, events: &[CartEvent]) -> Result<CartSummary> {
        self.inventory
            .state(|s| {
                let cart = consolidate(events, s.product_map());
                summarize(&cart, s.product_map())
            })
            .await
    }

    /// Turn cart lines into a confirmed sale, reserving stock atomically.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`], [`EngineError::NotFound`],
    /// [`EngineError::InsufficientStock`] naming the first short product,
    /// or [`EngineError::Timeout`].
    #[tracing::instrument(skip(self, lines), fields(owner = %owner_id, line_count = lines.len()))]
    pub async fn checkout(&self, owner_id: OwnerId, lines: Vec<CartLine>) -> Result<Sale> {
        let result = self
            .inventory
            .send(InventoryAction::Checkout {
                sale_id: SaleId::new(),
                owner_id,
                lines,
            })
            .await;

        match result {
            Ok(InventoryEvent::SaleCommitted(sale)) => {
                let units = sale.items.iter().map(|i| i.quantity).sum();
                metrics::record_checkout_committed(sale.total_amount, units);
                tracing::info!(sale_id = %sale.id, total = %sale.total_amount, "Sale committed");
                Ok(sale)
            }
            Ok(other) => Err(unexpected(&other)),
            Err(err) => {
                metrics::record_checkout_rejected(&err);
                Err(err)
            }
        }
    }

    /// The caller's sales, newest first
    pub async fn list_sales(&self, owner_id: &OwnerId) -> Vec<Sale> {
        self.inventory.state(|s| s.sales_of(owner_id)).await
    }

    /// Mark a sale as handed over.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] or [`EngineError::InvalidState`].
    #[tracing::instrument(skip(self))]
    pub async fn complete_sale(&self, sale_id: SaleId) -> Result<Sale> {
        self.transition_sale(InventoryAction::CompleteSale { sale_id })
            .await
    }

    /// Owner cancels a sale; its quantities return to stock.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`], [`EngineError::Forbidden`], or
    /// [`EngineError::InvalidState`].
    #[tracing::instrument(skip(self), fields(owner = %owner_id))]
    pub async fn cancel_sale(&self, owner_id: OwnerId, sale_id: SaleId) -> Result<Sale> {
        self.transition_sale(InventoryAction::CancelSale {
            sale_id,
            requester: owner_id,
        })
        .await
    }

    async fn transition_sale(&self, action: InventoryAction) -> Result<Sale> {
        let sale = match self.inventory.send(action).await? {
            InventoryEvent::SaleStatusChanged { sale, .. } => sale,
            other => return Err(unexpected(&other)),
        };
        metrics::record_sale(sale.status);
        tracing::info!(sale_id = %sale.id, status = %sale.status, "Sale updated");
        Ok(sale)
    }
}

fn into_booking(event: ScheduleEvent) -> Result<Booking> {
    match event {
        ScheduleEvent::BookingCreated(booking)
        | ScheduleEvent::BookingStatusChanged { booking, .. } => Ok(booking),
        other => Err(unexpected(&other)),
    }
}

fn unexpected(event: &impl std::fmt::Debug) -> EngineError {
    tracing::error!(?event, "Unexpected event for operation");
    EngineError::InvalidState(format!("Unexpected event: {event:?}"))
}
