//! # Repository Layer
//!
//! Data access implementations. Each repository owns the SQL for one
//! aggregate and nothing else touches the tables.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Repository Layer                                 │
//! │                                                                         │
//! │  user      - role lookups for barbers/admins                            │
//! │  catalog   - services, time slots, products (admin CRUD)                │
//! │  booking   - availability engine + booking rows                         │
//! │  order     - orders, line items, stock ledger transactions              │
//! │  earnings  - read-only revenue aggregation                              │
//! │  event     - scheduled shop events (announcements)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod booking;
pub mod catalog;
pub mod earnings;
pub mod event;
pub mod order;
pub mod user;

pub use booking::{AvailableDay, BookingRepository, NewBooking};
pub use catalog::{CatalogRepository, NewProduct, NewService, ProductUpdate};
pub use earnings::{DailySeries, EarningsRepository, EarningsSummary, WindowTotals};
pub use event::{EventRepository, EventUpdate, NewEvent};
pub use order::OrderRepository;
pub use user::UserRepository;
