//! # clipshop-db
//!
//! Storage and lifecycle layer for clipshop: SQLite persistence, the
//! availability engine, the order stock ledger, earnings aggregation and
//! the notification port.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          clipshop-db                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                 │
//! │  │   service/   │──►│ repository/  │──►│    pool      │                 │
//! │  │  lifecycle   │   │  SQL per     │   │  SQLite WAL  │                 │
//! │  │  + checks    │   │  aggregate   │   │  + migrate   │                 │
//! │  └──────┬───────┘   └──────────────┘   └──────────────┘                 │
//! │         │                                                               │
//! │         └──► notify (post-commit, fire-and-forget)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Correctness under concurrency is delegated to the store: the partial
//! unique booking index and conditional stock updates decide every race.
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("clipshop.db")).await?;
//! let notifier = match NotifierConfig::from_env() {
//!     Some(config) => Notifier::spawn(config),
//!     None => Notifier::null(),
//! };
//! let bookings = BookingService::new(db.clone(), notifier.clone());
//! ```

pub mod error;
pub mod migrations;
pub mod notify;
pub mod pool;
pub mod repository;
pub mod service;

pub use error::{DbError, DbResult};
pub use notify::{Notification, Notifier, NotifierConfig};
pub use pool::{Database, DbConfig};
pub use repository::{
    AvailableDay, BookingRepository, CatalogRepository, DailySeries, EarningsRepository,
    EarningsSummary, EventRepository, EventUpdate, NewBooking, NewEvent, NewProduct, NewService,
    OrderRepository, ProductUpdate, UserRepository, WindowTotals,
};
pub use service::{
    BookingRequest, BookingService, CatalogService, EarningsService, EventService, OrderService,
};
