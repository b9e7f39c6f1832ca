//! # Domain Types
//!
//! Core domain types used throughout clipshop.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Booking      │   │     Order       │   │    Product      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  barber_id      │   │  user_id        │   │  price_cents    │        │
//! │  │  date + slot    │   │  status         │   │  stock          │        │
//! │  │  status         │   │  items (owned)  │   └─────────────────┘        │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    TimeSlot     │   │    Service      │   │      User       │        │
//! │  │  shared, static │   │  price+duration │   │  role check only│        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a UUID v4 string, immutable once created.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// User & Role
// =============================================================================

/// Role attribute distinguishing admins and barbers from plain clients.
///
/// User identity itself is owned by the external auth collaborator; the core
/// only performs role checks against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    /// A barber. Only users with this role can be assigned to a booking.
    Worker,
    Client,
}

/// A resolved user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[inline]
    pub fn is_barber(&self) -> bool {
        self.role == Role::Worker
    }
}

// =============================================================================
// Catalog: Service, TimeSlot, Product
// =============================================================================

/// A bookable service (haircut, shave, ...) with a price and a duration.
///
/// Immutable once referenced by a booking except via explicit admin edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
}

impl Service {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A fixed wall-clock interval from the shared slot enumeration.
///
/// Slots carry no date: the same small set applies to every barber on every
/// working day. Times are stored and exchanged as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TimeSlot {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimeSlot {
    /// Parses the slot's start as a time-of-day.
    pub fn start(&self) -> Result<NaiveTime, ValidationError> {
        parse_slot_time("start_time", &self.start_time)
    }

    /// Parses the slot's end as a time-of-day.
    pub fn end(&self) -> Result<NaiveTime, ValidationError> {
        parse_slot_time("end_time", &self.end_time)
    }
}

/// Parses an `HH:MM` wall-clock string.
pub fn parse_slot_time(field: &str, value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be HH:MM".to_string(),
    })
}

/// A product available in the storefront.
///
/// `stock` is a non-negative unit count; it is mutated only by admin edits
/// and by order lifecycle transitions (decrement on commit, restore on
/// cancel).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    /// Reference to an uploaded image; upload handling is external.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A scheduled shop event (promotion, community night) shown on the
/// storefront calendar.
///
/// Events carry a single start instant as a date plus an `HH:MM` time, and
/// an optional image reference whose upload handling is external.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Parses the event's start as a time-of-day.
    pub fn start(&self) -> Result<NaiveTime, ValidationError> {
        parse_slot_time("time", &self.time)
    }
}

// =============================================================================
// Booking
// =============================================================================

/// Booking status. There is no pending state: creation is immediate
/// confirmation, and CANCELLED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A scheduled appointment: one barber, one date, one slot, one customer.
///
/// ## Invariant
/// No two non-cancelled bookings may share the same
/// (barber_id, date, time_slot_id) triple. The store enforces this with a
/// partial unique index; the availability engine pre-checks it for a
/// friendly error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub barber_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub time_slot_id: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order & OrderItem
// =============================================================================

/// Order status state machine.
///
/// ```text
/// PENDING ──pay──► COMPLETED ──cancel──► CANCELLED
///    │                                      ▲
///    └──────────────cancel──────────────────┘
/// ```
/// COMPLETED can only move to CANCELLED; CANCELLED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// COMPLETED and CANCELLED permit no transitions except
    /// COMPLETED → CANCELLED.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// A storefront order. Owns its items; the total price is always derived
/// from them, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item in an order.
///
/// `unit_price_cents` is frozen at creation time: later product price edits
/// never change an existing line. (order_id, product_id) is unique per
/// order; duplicate requests merge into quantity instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl OrderItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line subtotal: `unit_price * quantity`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// Derived order total: the sum of line subtotals. This is the only
/// definition of an order's price anywhere in the system.
pub fn order_total(items: &[OrderItem]) -> Money {
    items.iter().map(OrderItem::subtotal).sum()
}

// =============================================================================
// Order Lines (creation requests)
// =============================================================================

/// A requested order line: which product, how many units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderLine {
            product_id: product_id.into(),
            quantity,
        }
    }

    /// Validates and merges requested lines.
    ///
    /// Ordering the same product twice in one request merges into a single
    /// line with the summed quantity. A non-positive quantity on any line is
    /// malformed input, not a no-op. An empty request is also rejected.
    pub fn merge(lines: &[OrderLine]) -> Result<Vec<OrderLine>, ValidationError> {
        if lines.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }

        let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                });
            }
            match merged.iter_mut().find(|m| m.product_id == line.product_id) {
                Some(existing) => existing.quantity += line.quantity,
                None => merged.push(line.clone()),
            }
        }
        Ok(merged)
    }
}

// =============================================================================
// Card Details (simulated payment)
// =============================================================================

/// Card fields presented at payment time.
///
/// Payment is simulated: the fields are format-checked and the order status
/// flips, nothing is charged and nothing is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    /// 16 digits, optionally grouped with spaces or hyphens.
    pub number: String,
    /// `MM/YY` expiry.
    pub expiry: String,
    /// 3-digit verification code.
    pub cvc: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
