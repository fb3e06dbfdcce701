//! Domain types for the DogSpa engine.
//!
//! Identifiers, money, catalog entries, pets, bookings, and sales. Wire
//! format is camelCase JSON; statuses and categories are fixed enumerations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Identity of a pet owner (the authenticated caller)
    OwnerId
);
define_id!(
    /// Unique identifier for a pet
    PetId
);
define_id!(
    /// Unique identifier for a bookable service
    ServiceId
);
define_id!(
    /// Unique identifier for a booking
    BookingId
);
define_id!(
    /// Unique identifier for a product
    ProductId
);
define_id!(
    /// Unique identifier for a sale
    SaleId
);

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in minor units (cents) of the single shop currency.
///
/// Serialized as a fixed-point string with two fraction digits (`"25.50"`).
/// Deserializes from that string form or from a JSON number; amounts with
/// more than two fraction digits are rejected, never rounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

/// Error parsing a money amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid money amount '{0}': expected a non-negative decimal with at most two fraction digits")]
pub struct ParseMoneyError(String);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Create from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checked addition
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication by a quantity
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(u64::from(quantity)).map(Self)
    }

    /// Convert an exact decimal amount.
    ///
    /// Returns `None` for negative amounts, more than two fraction digits,
    /// or amounts that do not fit in cents.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        if amount.is_sign_negative() || amount.scale() > 2 {
            return None;
        }
        amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_u64())
            .map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseMoneyError(s.to_string()));
        }
        Decimal::from_str_exact(trimmed)
            .ok()
            .and_then(Self::from_decimal)
            .ok_or_else(|| ParseMoneyError(s.to_string()))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl serde::de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative decimal amount")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Money, E> {
                v.checked_mul(100)
                    .map(Money)
                    .ok_or_else(|| E::custom("money amount overflows"))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Money, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom("money amount must not be negative"))
                    .and_then(|v| self.visit_u64(v))
            }

            // Shortest round-trip text of the number, so `10.005` stays
            // three fraction digits instead of being rounded to cents
            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Money, E> {
                if !v.is_finite() {
                    return Err(E::custom("money amount must be finite"));
                }
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Category of a bookable service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    /// Full grooming
    Grooming,
    /// Bath only
    Bath,
    /// Haircut
    Haircut,
    /// Nail trimming
    NailCare,
    /// Veterinary check
    Veterinary,
    /// Training session
    Training,
    /// Anything else
    Other,
}

/// Category of a retail product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    /// Food
    Food,
    /// Treats and snacks
    Treats,
    /// Shampoo, brushes, and other hygiene items
    Hygiene,
    /// Collars, leashes, beds
    Accessories,
    /// Toys
    Toys,
    /// Supplements and health care
    Health,
    /// Anything else
    Other,
}

/// A bookable service offering
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service ID
    pub id: ServiceId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Category
    pub category: ServiceCategory,
    /// Price charged per booking
    pub price: Money,
    /// Length of one appointment
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
    /// Whether new bookings are accepted
    pub is_active: bool,
}

/// A purchasable stock item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Category
    pub category: ProductCategory,
    /// Unit price
    pub price: Money,
    /// Units on hand
    pub stock: u32,
    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Whether the product can be sold
    pub is_active: bool,
}

// ============================================================================
// Pets
// ============================================================================

/// Species of a pet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    /// Dog
    #[serde(alias = "perro")]
    Dog,
    /// Cat
    #[serde(alias = "gato")]
    Cat,
    /// Any other animal
    #[serde(alias = "otro")]
    Other,
}

/// A registered pet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Pet ID
    pub id: PetId,
    /// Owner
    pub owner_id: OwnerId,
    /// Name
    pub name: String,
    /// Species
    pub species: Species,
    /// Breed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    /// Age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<u8>,
    /// Weight in kilograms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Care notes for the groomer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_notes: Option<String>,
    /// When the pet was registered
    pub created_at: DateTime<Utc>,
}

/// Pet registration request
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
    /// Name
    pub name: String,
    /// Species
    pub species: Species,
    /// Breed
    #[serde(default)]
    pub breed: Option<String>,
    /// Age in years
    #[serde(default, alias = "age")]
    pub age_years: Option<u8>,
    /// Weight in kilograms
    #[serde(default, alias = "weight")]
    pub weight_kg: Option<f64>,
    /// Care notes
    #[serde(default)]
    pub special_notes: Option<String>,
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking lifecycle status
///
/// `PENDING → {CONFIRMED, CANCELLED}`, `CONFIRMED → {COMPLETED, CANCELLED}`.
/// `COMPLETED` and `CANCELLED` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Requested, awaiting facility confirmation
    Pending,
    /// Confirmed by the facility
    Confirmed,
    /// Cancelled by owner or facility
    Cancelled,
    /// Service delivered
    Completed,
}

impl BookingStatus {
    /// No further transitions allowed
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Whether a booking in this status occupies its time slot
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether `self → next` is an allowed transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

/// A service appointment for a pet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Pet being serviced
    pub pet_id: PetId,
    /// Service booked
    pub service_id: ServiceId,
    /// Owner who made the booking
    pub owner_id: OwnerId,
    /// Start instant
    #[serde(rename = "date")]
    pub scheduled_at: DateTime<Utc>,
    /// Service duration at booking time
    pub duration_minutes: u32,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Service price at booking time
    pub total_price: Money,
    /// Owner notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Exclusive end of the booked slot
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

// ============================================================================
// Sales
// ============================================================================

/// Sale lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Awaiting confirmation
    Pending,
    /// Stock reserved and totals fixed
    Confirmed,
    /// Cancelled; stock returned
    Cancelled,
    /// Handed over to the customer
    Completed,
}

impl SaleStatus {
    /// No further transitions allowed
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

/// One requested product and quantity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product
    pub product_id: ProductId,
    /// Units requested
    pub quantity: u32,
}

/// A line of a committed sale
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Owning sale
    pub sale_id: SaleId,
    /// Product sold
    pub product_id: ProductId,
    /// Units sold
    pub quantity: u32,
    /// Price per unit at sale time
    pub unit_price: Money,
    /// `unit_price × quantity`
    pub total_price: Money,
}

/// A committed order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Sale ID
    pub id: SaleId,
    /// Buyer
    pub owner_id: OwnerId,
    /// Lines in cart order
    pub items: Vec<SaleItem>,
    /// Sum of item totals
    pub total_amount: Money,
    /// Lifecycle status
    pub status: SaleStatus,
    /// Commit time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_parses_fixed_point() {
        assert_eq!("25.50".parse::<Money>().unwrap(), Money::from_cents(2550));
        assert_eq!("25.5".parse::<Money>().unwrap(), Money::from_cents(2550));
        assert_eq!("7".parse::<Money>().unwrap(), Money::from_cents(700));
        assert_eq!("0.05".parse::<Money>().unwrap(), Money::from_cents(5));
    }

    #[test]
    fn money_rejects_bad_input() {
        for bad in ["", "-1.00", "1.005", "abc", "1.x", ".50"] {
            assert!(bad.parse::<Money>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn money_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_cents(1005)).unwrap();
        assert_eq!(json, "\"10.05\"");
    }

    #[test]
    fn money_deserializes_from_numbers() {
        let m: Money = serde_json::from_str("10.5").unwrap();
        assert_eq!(m.cents(), 1050);
        let m: Money = serde_json::from_str("3").unwrap();
        assert_eq!(m.cents(), 300);
        assert!(serde_json::from_str::<Money>("-2").is_err());
        assert!(serde_json::from_str::<Money>("-0.5").is_err());
    }

    #[test]
    fn sub_cent_amounts_rejected_in_any_encoding() {
        for json in ["10.005", "\"10.005\"", "1.015", "\"1.015\"", "\"10.500\""] {
            assert!(
                serde_json::from_str::<Money>(json).is_err(),
                "{json} should not deserialize"
            );
        }
        let m: Money = serde_json::from_str("\"10.01\"").unwrap();
        assert_eq!(m, serde_json::from_str::<Money>("10.01").unwrap());
    }

    #[test]
    fn huge_amounts_rejected() {
        assert!("184467440737095516.16".parse::<Money>().is_err());
        assert!(serde_json::from_str::<Money>("1e30").is_err());
        assert_eq!(
            "184467440737095516.15".parse::<Money>().unwrap(),
            Money::from_cents(u64::MAX)
        );
    }

    #[test]
    fn money_checked_arithmetic() {
        assert_eq!(
            Money::from_cents(1000).checked_mul(2).unwrap(),
            Money::from_cents(2000)
        );
        assert!(Money::from_cents(u64::MAX).checked_add(Money::from_cents(1)).is_none());
        assert!(Money::from_cents(u64::MAX).checked_mul(2).is_none());
    }

    #[test]
    fn booking_transitions() {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending};
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
        for terminal in [Cancelled, Completed] {
            assert!(terminal.is_terminal());
            for next in [Pending, Confirmed, Cancelled, Completed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn species_accepts_spanish_labels() {
        let s: Species = serde_json::from_str("\"perro\"").unwrap();
        assert_eq!(s, Species::Dog);
        let s: Species = serde_json::from_str("\"gato\"").unwrap();
        assert_eq!(s, Species::Cat);
        assert_eq!(serde_json::to_string(&Species::Other).unwrap(), "\"other\"");
    }

    #[test]
    fn service_accepts_legacy_duration_field() {
        let json = r#"{
            "id": "6f1c3a52-3a8e-4b8e-9a57-0d4c1f0b7a11",
            "name": "Bath",
            "category": "BATH",
            "price": "15.00",
            "duration": 45,
            "isActive": true
        }"#;
        let service: Service = serde_json::from_str(json).unwrap();
        assert_eq!(service.duration_minutes, 45);
        assert_eq!(service.price.cents(), 1500);
    }
}
