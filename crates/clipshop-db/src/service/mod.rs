//! # Service Layer
//!
//! Lifecycle orchestration on top of the repositories: request validation,
//! ownership and role checks, conflict translation, post-commit
//! notifications, and wire-DTO assembly.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Service Layer                                   │
//! │                                                                         │
//! │  booking   - availability reads + booking lifecycle + confirmation     │
//! │  order     - order lifecycle, simulated payment, stock outcomes        │
//! │  catalog   - admin CRUD with validation and announcements              │
//! │  earnings  - admin-only revenue reporting                              │
//! │  event     - public event listings, admin-gated edits                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method takes the resolved requesting [`User`](clipshop_core::User);
//! token resolution happens outside this crate.

pub mod booking;
pub mod catalog;
pub mod earnings;
pub mod event;
pub mod order;

pub use booking::{BookingRequest, BookingService};
pub use catalog::CatalogService;
pub use earnings::EarningsService;
pub use event::EventService;
pub use order::OrderService;
