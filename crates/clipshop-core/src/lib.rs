//! # clipshop-core: Pure Business Logic for clipshop
//!
//! This crate is the **heart** of the booking and storefront backend. It
//! contains all business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        clipshop Architecture                            │
//! │                                                                         │
//! │  HTTP transport / auth / serialization glue (external collaborators)    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ clipshop-core (THIS CRATE) ★                    │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │ validation│  │    dto    │    │    │
//! │  │   │  Booking  │  │   Money   │  │   rules   │  │ wire maps │    │    │
//! │  │   │   Order   │  │ FixedPt   │  │   cards   │  │           │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                  clipshop-db (Storage Layer)                    │    │
//! │  │      SQLite queries, migrations, availability + stock ledger    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Booking, Order, Product, TimeSlot, ...)
//! - [`money`] - Fixed-point money (integer cents, decimal-string wire form)
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input and business rule validation
//! - [`dto`] - Wire representations of the core entities
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are cents (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dto;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use clipshop_core::Money` instead of
// `use clipshop_core::money::Money`.

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
