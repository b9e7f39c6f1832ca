//! # Booking Service
//!
//! Booking lifecycle: create, edit, cancel, delete, plus the availability
//! read paths. Sits above the repositories and owns the rules that span
//! them: reference validation, ownership checks, conflict translation and
//! the post-commit confirmation notification.
//!
//! ## Lifecycle
//! ```text
//! create ──► CONFIRMED ──cancel──► CANCELLED (terminal)
//!                │
//!                └──edit──► CONFIRMED (new barber/date/slot)
//! ```
//! There is no pending state: creation is immediate confirmation.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use tracing::{info, warn};

use crate::error::DbError;
use crate::notify::{Notification, Notifier};
use crate::pool::Database;
use crate::repository::booking::AvailableDay;
use clipshop_core::dto::BookingDto;
use clipshop_core::{Booking, BookingStatus, CoreError, CoreResult, TimeSlot, User};

/// The appointment fields of a create or edit request.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub barber_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub time_slot_id: String,
}

/// Booking lifecycle service.
#[derive(Debug, Clone)]
pub struct BookingService {
    db: Database,
    notifier: Notifier,
}

impl BookingService {
    /// Creates a new BookingService.
    pub fn new(db: Database, notifier: Notifier) -> Self {
        BookingService { db, notifier }
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Free slots for a barber on a date, as of the real clock.
    pub async fn available_slots(
        &self,
        barber_id: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<TimeSlot>> {
        self.available_slots_as_of(barber_id, date, Utc::now().naive_utc())
            .await
    }

    /// Free slots with an explicit clock, for callers that control time.
    pub async fn available_slots_as_of(
        &self,
        barber_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> CoreResult<Vec<TimeSlot>> {
        let slots = self
            .db
            .bookings()
            .available_slots(barber_id, date, now)
            .await?;
        Ok(slots)
    }

    /// The 14-day booking calendar for a barber.
    pub async fn available_dates(&self, barber_id: &str) -> CoreResult<Vec<AvailableDay>> {
        self.available_dates_as_of(barber_id, Utc::now().naive_utc())
            .await
    }

    /// The booking calendar with an explicit clock.
    pub async fn available_dates_as_of(
        &self,
        barber_id: &str,
        now: NaiveDateTime,
    ) -> CoreResult<Vec<AvailableDay>> {
        self.db
            .bookings()
            .available_dates(barber_id, now)
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => CoreError::not_found("Barber", barber_id),
                other => other.into(),
            })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Books an appointment for `user` and queues the confirmation email
    /// once the row is committed.
    pub async fn create(&self, user: &User, req: BookingRequest) -> CoreResult<BookingDto> {
        self.create_as_of(user, req, Utc::now().naive_utc()).await
    }

    /// [`create`](Self::create) with an explicit clock.
    pub async fn create_as_of(
        &self,
        user: &User,
        req: BookingRequest,
        now: NaiveDateTime,
    ) -> CoreResult<BookingDto> {
        let (service, slot) = self.check_request(&req, None, now).await?;

        let booking = self
            .db
            .bookings()
            .insert(crate::repository::booking::NewBooking {
                user_id: user.id.clone(),
                barber_id: req.barber_id.clone(),
                service_id: req.service_id.clone(),
                date: req.date,
                time_slot_id: req.time_slot_id.clone(),
            })
            .await
            .map_err(slot_race_to_conflict)?;

        info!(id = %booking.id, user = %user.id, "Booking confirmed");

        // Only after the insert committed. Delivery failure cannot undo a
        // booking, so it is queued fire-and-forget.
        self.notifier.send(Notification::BookingConfirmation {
            email: user.email.clone(),
            service: service.name.clone(),
            date: booking.date,
            slot: slot.start_time.clone(),
        });

        Ok(BookingDto::from_parts(&booking, &service, &slot))
    }

    /// Moves a booking to a new barber/service/date/slot.
    ///
    /// The booking's own claim is excluded from the availability check, so
    /// keeping (or swapping back to) its current slot is always allowed.
    pub async fn edit(
        &self,
        requester: &User,
        booking_id: &str,
        req: BookingRequest,
    ) -> CoreResult<BookingDto> {
        self.edit_as_of(requester, booking_id, req, Utc::now().naive_utc())
            .await
    }

    /// [`edit`](Self::edit) with an explicit clock.
    pub async fn edit_as_of(
        &self,
        requester: &User,
        booking_id: &str,
        req: BookingRequest,
        now: NaiveDateTime,
    ) -> CoreResult<BookingDto> {
        let booking = self.fetch_owned(requester, booking_id).await?;

        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::conflict("cannot edit a cancelled booking"));
        }

        let (service, slot) = self.check_request(&req, Some(booking_id), now).await?;

        self.db
            .bookings()
            .reschedule(
                booking_id,
                &req.barber_id,
                &req.service_id,
                req.date,
                &req.time_slot_id,
            )
            .await
            .map_err(slot_race_to_conflict)?;

        let updated = self
            .db
            .bookings()
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", booking_id))?;

        Ok(BookingDto::from_parts(&updated, &service, &slot))
    }

    /// Marks a booking CANCELLED, releasing its slot. Terminal.
    pub async fn cancel(&self, requester: &User, booking_id: &str) -> CoreResult<()> {
        let booking = self.fetch_owned(requester, booking_id).await?;

        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::conflict("booking is already cancelled"));
        }

        self.db
            .bookings()
            .set_status(booking_id, BookingStatus::Cancelled)
            .await?;

        info!(id = %booking_id, "Booking cancelled");
        Ok(())
    }

    /// Hard-deletes a booking row.
    pub async fn delete(&self, requester: &User, booking_id: &str) -> CoreResult<()> {
        self.fetch_owned(requester, booking_id).await?;
        self.db.bookings().delete(booking_id).await?;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets one booking, visible to its owner and admins.
    pub async fn get(&self, requester: &User, booking_id: &str) -> CoreResult<BookingDto> {
        let booking = self.fetch_owned(requester, booking_id).await?;
        self.assemble(&booking).await
    }

    /// A user's own bookings, most recent first.
    pub async fn list_for_user(&self, user: &User) -> CoreResult<Vec<BookingDto>> {
        let bookings = self.db.bookings().list_for_user(&user.id).await?;
        let mut dtos = Vec::with_capacity(bookings.len());
        for booking in &bookings {
            dtos.push(self.assemble(booking).await?);
        }
        Ok(dtos)
    }

    /// Every booking in the system. Admin only.
    pub async fn list_all(&self, requester: &User) -> CoreResult<Vec<BookingDto>> {
        if !requester.is_admin() {
            return Err(CoreError::forbidden("only admins may list all bookings"));
        }

        let bookings = self.db.bookings().list_all().await?;
        let mut dtos = Vec::with_capacity(bookings.len());
        for booking in &bookings {
            dtos.push(self.assemble(booking).await?);
        }
        Ok(dtos)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Validates a create/edit request's references and the slot's
    /// availability, returning the resolved service and slot.
    async fn check_request(
        &self,
        req: &BookingRequest,
        exclude_booking: Option<&str>,
        now: NaiveDateTime,
    ) -> CoreResult<(clipshop_core::Service, TimeSlot)> {
        if self
            .db
            .users()
            .get_barber(&req.barber_id)
            .await?
            .is_none()
        {
            return Err(CoreError::not_found("Barber", &req.barber_id));
        }

        let service = self
            .db
            .catalog()
            .get_service(&req.service_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Service", &req.service_id))?;

        let slot = self
            .db
            .catalog()
            .get_time_slot(&req.time_slot_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Time slot", &req.time_slot_id))?;

        if req.date < now.date() {
            return Err(CoreError::conflict("cannot book a past date"));
        }

        // Sunday and the already-started-today rule come along with the
        // availability computation.
        let free = self
            .db
            .bookings()
            .available_slots(&req.barber_id, req.date, now)
            .await?;
        let slot_free = free.iter().any(|s| s.id == slot.id);

        // An edit keeping its own slot is not a conflict with itself.
        let own_claim = match exclude_booking {
            Some(id) => {
                let taken = self
                    .db
                    .bookings()
                    .taken_slot_ids(&req.barber_id, req.date, None)
                    .await?;
                let taken_without_self = self
                    .db
                    .bookings()
                    .taken_slot_ids(&req.barber_id, req.date, Some(id))
                    .await?;
                taken.contains(&req.time_slot_id) && !taken_without_self.contains(&req.time_slot_id)
            }
            None => false,
        };

        if !slot_free && !own_claim {
            return Err(CoreError::conflict("time slot is not available"));
        }

        Ok((service, slot))
    }

    /// Fetches a booking and enforces owner-or-admin access.
    async fn fetch_owned(&self, requester: &User, booking_id: &str) -> CoreResult<Booking> {
        let booking = self
            .db
            .bookings()
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", booking_id))?;

        if booking.user_id != requester.id && !requester.is_admin() {
            warn!(
                booking = %booking_id,
                requester = %requester.id,
                "Rejected booking access"
            );
            return Err(CoreError::forbidden("not your booking"));
        }

        Ok(booking)
    }

    /// Resolves a booking's service and slot into the wire form.
    async fn assemble(&self, booking: &Booking) -> CoreResult<BookingDto> {
        let service = self
            .db
            .catalog()
            .get_service(&booking.service_id)
            .await?
            .ok_or_else(|| {
                CoreError::Storage(format!("booking {} references missing service", booking.id))
            })?;
        let slot = self
            .db
            .catalog()
            .get_time_slot(&booking.time_slot_id)
            .await?
            .ok_or_else(|| {
                CoreError::Storage(format!("booking {} references missing slot", booking.id))
            })?;

        Ok(BookingDto::from_parts(booking, &service, &slot))
    }
}

/// A unique-index hit on the bookings table is a lost race for the slot,
/// which callers see as an ordinary conflict.
fn slot_race_to_conflict(err: DbError) -> CoreError {
    if err.is_unique_violation_on("bookings") {
        CoreError::conflict("time slot is not available")
    } else {
        err.into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::NewService;
    use clipshop_core::Role;

    /// Monday 2026-03-02 at 08:00.
    fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    struct Fixture {
        svc: BookingService,
        admin: User,
        client: User,
        other: User,
        barber_id: String,
        service_id: String,
        slot_ids: Vec<String>,
    }

    async fn setup(notifier: Notifier) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let admin = db
            .users()
            .insert("boss", "boss@clipshop.test", Role::Admin)
            .await
            .unwrap();
        let barber = db
            .users()
            .insert("fig", "fig@clipshop.test", Role::Worker)
            .await
            .unwrap();
        let client = db
            .users()
            .insert("ana", "ana@clipshop.test", Role::Client)
            .await
            .unwrap();
        let other = db
            .users()
            .insert("bob", "bob@clipshop.test", Role::Client)
            .await
            .unwrap();

        let service = db
            .catalog()
            .create_service(NewService {
                name: "Haircut".to_string(),
                description: None,
                price_cents: 2000,
                duration_minutes: 30,
            })
            .await
            .unwrap();

        let mut slot_ids = Vec::new();
        for (start, end) in [("09:00", "09:30"), ("09:30", "10:00")] {
            slot_ids.push(db.catalog().create_time_slot(start, end).await.unwrap().id);
        }

        Fixture {
            svc: BookingService::new(db, notifier),
            admin,
            client,
            other,
            barber_id: barber.id,
            service_id: service.id,
            slot_ids,
        }
    }

    fn request(f: &Fixture, date: NaiveDate, slot: usize) -> BookingRequest {
        BookingRequest {
            barber_id: f.barber_id.clone(),
            service_id: f.service_id.clone(),
            date,
            time_slot_id: f.slot_ids[slot].clone(),
        }
    }

    #[tokio::test]
    async fn test_create_confirms_and_notifies() {
        let (notifier, mut rx) = Notifier::capture();
        let f = setup(notifier).await;
        let now = monday_morning();
        let date = now.date() + chrono::Duration::days(1);

        let dto = f
            .svc
            .create_as_of(&f.client, request(&f, date, 0), now)
            .await
            .unwrap();

        assert_eq!(dto.status, BookingStatus::Confirmed);
        assert_eq!(dto.service.price.to_string(), "20.00");

        match rx.recv().await.unwrap() {
            Notification::BookingConfirmation { email, slot, .. } => {
                assert_eq!(email, "ana@clipshop.test");
                assert_eq!(slot, "09:00");
            }
            other => panic!("expected booking confirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_conflicts_on_taken_slot() {
        let f = setup(Notifier::null()).await;
        let now = monday_morning();
        let date = now.date() + chrono::Duration::days(1);

        f.svc
            .create_as_of(&f.client, request(&f, date, 0), now)
            .await
            .unwrap();

        let err = f
            .svc
            .create_as_of(&f.other, request(&f, date, 0), now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_references_and_past_dates() {
        let f = setup(Notifier::null()).await;
        let now = monday_morning();
        let date = now.date() + chrono::Duration::days(1);

        let mut bad_barber = request(&f, date, 0);
        bad_barber.barber_id = f.client.id.clone();
        let err = f
            .svc
            .create_as_of(&f.client, bad_barber, now)
            .await
            .unwrap_err();
        // A non-worker id is indistinguishable from a missing barber.
        assert!(matches!(err, CoreError::NotFound { entity: "Barber", .. }));

        let mut bad_service = request(&f, date, 0);
        bad_service.service_id = "ghost".to_string();
        let err = f
            .svc
            .create_as_of(&f.client, bad_service, now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "Service", .. }));

        let yesterday = request(&f, now.date() - chrono::Duration::days(1), 0);
        let err = f
            .svc
            .create_as_of(&f.client, yesterday, now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_edit_keeps_own_slot_and_respects_others() {
        let f = setup(Notifier::null()).await;
        let now = monday_morning();
        let date = now.date() + chrono::Duration::days(1);

        let mine = f
            .svc
            .create_as_of(&f.client, request(&f, date, 0), now)
            .await
            .unwrap();
        f.svc
            .create_as_of(&f.other, request(&f, date, 1), now)
            .await
            .unwrap();

        // Re-claiming its own slot (service change only) is fine.
        let edited = f
            .svc
            .edit_as_of(&f.client, &mine.id, request(&f, date, 0), now)
            .await
            .unwrap();
        assert_eq!(edited.time_slot.start_time, "09:00");

        // Moving onto someone else's slot is not.
        let err = f
            .svc
            .edit_as_of(&f.client, &mine.id, request(&f, date, 1), now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cancel_is_owner_or_admin_and_terminal() {
        let f = setup(Notifier::null()).await;
        let now = monday_morning();
        let date = now.date() + chrono::Duration::days(1);

        let booking = f
            .svc
            .create_as_of(&f.client, request(&f, date, 0), now)
            .await
            .unwrap();

        let err = f.svc.cancel(&f.other, &booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        f.svc.cancel(&f.client, &booking.id).await.unwrap();
        let err = f.svc.cancel(&f.client, &booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        // The slot is free again for someone else.
        f.svc
            .create_as_of(&f.other, request(&f, date, 0), now)
            .await
            .unwrap();

        // A cancelled booking cannot be rescheduled back onto the calendar.
        let err = f
            .svc
            .edit_as_of(&f.client, &booking.id, request(&f, date, 1), now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_listing_scopes() {
        let f = setup(Notifier::null()).await;
        let now = monday_morning();
        let date = now.date() + chrono::Duration::days(1);

        f.svc
            .create_as_of(&f.client, request(&f, date, 0), now)
            .await
            .unwrap();
        f.svc
            .create_as_of(&f.other, request(&f, date, 1), now)
            .await
            .unwrap();

        assert_eq!(f.svc.list_for_user(&f.client).await.unwrap().len(), 1);
        assert_eq!(f.svc.list_all(&f.admin).await.unwrap().len(), 2);

        let err = f.svc.list_all(&f.client).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_concurrent_reserves_have_one_winner() {
        let f = setup(Notifier::null()).await;
        let now = monday_morning();
        let date = now.date() + chrono::Duration::days(1);

        // Both tasks target the same (barber, date, slot). Whatever the
        // interleaving, the unique index lets exactly one through.
        let (a, b) = tokio::join!(
            f.svc.create_as_of(&f.client, request(&f, date, 0), now),
            f.svc.create_as_of(&f.other, request(&f, date, 0), now),
        );

        assert_eq!(
            [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
            1,
            "exactly one reservation must win"
        );
    }
}
