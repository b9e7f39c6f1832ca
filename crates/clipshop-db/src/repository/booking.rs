//! # Booking Repository
//!
//! Storage primitives for bookings plus the availability read path.
//!
//! ## Availability Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Availability Computation                            │
//! │                                                                         │
//! │  all time_slots                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  minus slots with a non-cancelled booking for (barber, date)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  minus slots already started, when date is today                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Sunday or unknown barber ⇒ empty                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pre-check in the service layer uses the same predicate, but the
//! authoritative guard is the partial unique index on
//! `(barber_id, date, time_slot_id)`: a lost race surfaces here as a
//! `UniqueViolation` on insert, never as a duplicate row.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use clipshop_core::{Booking, BookingStatus, TimeSlot};

/// Days covered by the booking calendar, today inclusive.
pub const AVAILABILITY_WINDOW_DAYS: i64 = 14;

/// Fields of a new booking row.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub barber_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub time_slot_id: String,
}

/// One day of the booking calendar with its free slots.
#[derive(Debug, Clone)]
pub struct AvailableDay {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// Repository for booking rows and availability queries.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Slot ids claimed by non-cancelled bookings for (barber, date).
    ///
    /// `exclude_booking` removes one booking from consideration so an edit
    /// can keep (or swap back to) its own slot.
    pub async fn taken_slot_ids(
        &self,
        barber_id: &str,
        date: NaiveDate,
        exclude_booking: Option<&str>,
    ) -> DbResult<Vec<String>> {
        let taken = sqlx::query_scalar::<_, String>(
            r#"
            SELECT time_slot_id
            FROM bookings
            WHERE barber_id = ?1
              AND date = ?2
              AND status <> 'cancelled'
              AND (?3 IS NULL OR id <> ?3)
            "#,
        )
        .bind(barber_id)
        .bind(date)
        .bind(exclude_booking)
        .fetch_all(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Free slots for a barber on a date, as of `now`.
    ///
    /// ## Behavior
    /// * Sundays are non-working: always empty
    /// * Unknown id, or a user without the worker role: empty, not an error
    /// * When `date` is today, slots whose start has already passed are gone
    pub async fn available_slots(
        &self,
        barber_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> DbResult<Vec<TimeSlot>> {
        if date.weekday() == Weekday::Sun {
            return Ok(Vec::new());
        }

        let is_barber = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE id = ?1 AND role = 'worker'",
        )
        .bind(barber_id)
        .fetch_one(&self.pool)
        .await?;

        if is_barber == 0 {
            return Ok(Vec::new());
        }

        let free = sqlx::query_as::<_, TimeSlot>(
            r#"
            SELECT ts.id, ts.start_time, ts.end_time
            FROM time_slots ts
            WHERE ts.id NOT IN (
                SELECT time_slot_id FROM bookings
                WHERE barber_id = ?1 AND date = ?2 AND status <> 'cancelled'
            )
            ORDER BY ts.start_time
            "#,
        )
        .bind(barber_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        if date != now.date() {
            return Ok(free);
        }

        // Today: a slot that has already started cannot be booked.
        let mut remaining = Vec::with_capacity(free.len());
        for slot in free {
            let start = slot
                .start()
                .map_err(|e| DbError::Internal(e.to_string()))?;
            if start > now.time() {
                remaining.push(slot);
            }
        }
        Ok(remaining)
    }

    /// The booking calendar: the next [`AVAILABILITY_WINDOW_DAYS`] days from
    /// today inclusive, Sundays omitted, each with its free slots.
    ///
    /// Unlike [`available_slots`](Self::available_slots), an unknown or
    /// non-worker barber is an error here: the whole calendar is meaningless
    /// without one.
    pub async fn available_dates(
        &self,
        barber_id: &str,
        now: NaiveDateTime,
    ) -> DbResult<Vec<AvailableDay>> {
        let is_barber = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE id = ?1 AND role = 'worker'",
        )
        .bind(barber_id)
        .fetch_one(&self.pool)
        .await?;

        if is_barber == 0 {
            return Err(DbError::not_found("Barber", barber_id));
        }

        let mut days = Vec::new();
        for offset in 0..AVAILABILITY_WINDOW_DAYS {
            let date = now.date() + chrono::Duration::days(offset);
            if date.weekday() == Weekday::Sun {
                continue;
            }
            let slots = self.available_slots(barber_id, date, now).await?;
            days.push(AvailableDay { date, slots });
        }

        Ok(days)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Inserts a confirmed booking.
    ///
    /// No pre-check here: a concurrent claim of the same (barber, date, slot)
    /// triple surfaces as `DbError::UniqueViolation` on the partial index and
    /// the caller translates it to a conflict.
    pub async fn insert(&self, new: NewBooking) -> DbResult<Booking> {
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            barber_id: new.barber_id,
            service_id: new.service_id,
            date: new.date,
            time_slot_id: new.time_slot_id,
            status: BookingStatus::Confirmed,
            created_at: chrono::Utc::now(),
        };

        debug!(
            id = %booking.id,
            barber = %booking.barber_id,
            date = %booking.date,
            slot = %booking.time_slot_id,
            "Inserting booking"
        );

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, barber_id, service_id, date, time_slot_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.user_id)
        .bind(&booking.barber_id)
        .bind(&booking.service_id)
        .bind(booking.date)
        .bind(&booking.time_slot_id)
        .bind(booking.status)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Gets a booking by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, barber_id, service_id, date, time_slot_id, status, created_at
            FROM bookings
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Lists a user's bookings, most recent appointment first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, barber_id, service_id, date, time_slot_id, status, created_at
            FROM bookings
            WHERE user_id = ?1
            ORDER BY date DESC, time_slot_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Lists every booking (admin view).
    pub async fn list_all(&self) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, barber_id, service_id, date, time_slot_id, status, created_at
            FROM bookings
            ORDER BY date DESC, time_slot_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Rewrites a booking's appointment fields.
    ///
    /// Same uniqueness story as [`insert`](Self::insert): moving onto a slot
    /// someone else claims concurrently fails on the index.
    pub async fn reschedule(
        &self,
        id: &str,
        barber_id: &str,
        service_id: &str,
        date: NaiveDate,
        time_slot_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET barber_id = ?2, service_id = ?3, date = ?4, time_slot_id = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(barber_id)
        .bind(service_id)
        .bind(date)
        .bind(time_slot_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }

    /// Sets a booking's status.
    pub async fn set_status(&self, id: &str, status: BookingStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }

    /// Hard-deletes a booking row.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
