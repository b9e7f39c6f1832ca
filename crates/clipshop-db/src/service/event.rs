//! # Event Service
//!
//! Shop event management. Listing and detail are public; any signed-in
//! user may add an event, but editing and deleting are admin operations.

use tracing::info;

use crate::error::DbError;
use crate::notify::{Notification, Notifier};
use crate::pool::Database;
use crate::repository::event::{EventUpdate, NewEvent};
use clipshop_core::validation::validate_name;
use clipshop_core::{parse_slot_time, CoreError, CoreResult, Event, User};

/// Event management service.
#[derive(Debug, Clone)]
pub struct EventService {
    db: Database,
    notifier: Notifier,
}

impl EventService {
    /// Creates a new EventService.
    pub fn new(db: Database, notifier: Notifier) -> Self {
        EventService { db, notifier }
    }

    /// Creates an event and announces it to the admin chat.
    pub async fn create(&self, _requester: &User, new: NewEvent) -> CoreResult<Event> {
        validate_name(&new.name)?;
        parse_slot_time("time", &new.time)?;

        let event = self.db.events().create(new).await?;

        info!(id = %event.id, name = %event.name, "Event created");
        self.notifier.send(Notification::AdminEvent {
            text: format!("new event: {} on {}", event.name, event.date),
        });

        Ok(event)
    }

    /// Applies a partial update. Admin only.
    pub async fn update(
        &self,
        requester: &User,
        event_id: &str,
        update: EventUpdate,
    ) -> CoreResult<Event> {
        require_admin(requester)?;
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(time) = &update.time {
            parse_slot_time("time", time)?;
        }

        self.db
            .events()
            .update(event_id, update)
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => CoreError::not_found("Event", event_id),
                other => other.into(),
            })
    }

    /// Deletes an event. Admin only.
    pub async fn delete(&self, requester: &User, event_id: &str) -> CoreResult<()> {
        require_admin(requester)?;
        self.db
            .events()
            .delete(event_id)
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => CoreError::not_found("Event", event_id),
                other => other.into(),
            })
    }

    /// Gets one event. Public.
    pub async fn get(&self, event_id: &str) -> CoreResult<Event> {
        self.db
            .events()
            .get(event_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Event", event_id))
    }

    /// Lists all events in calendar order. Public.
    pub async fn list(&self) -> CoreResult<Vec<Event>> {
        Ok(self.db.events().list().await?)
    }
}

fn require_admin(requester: &User) -> CoreResult<()> {
    if !requester.is_admin() {
        return Err(CoreError::forbidden("only admins may manage events"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use clipshop_core::Role;

    fn open_night() -> NewEvent {
        NewEvent {
            name: "Open night".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
            time: "19:00".to_string(),
            location: "The shop".to_string(),
            image: None,
        }
    }

    async fn setup(notifier: Notifier) -> (EventService, User, User) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db
            .users()
            .insert("boss", "boss@clipshop.test", Role::Admin)
            .await
            .unwrap();
        let client = db
            .users()
            .insert("ana", "ana@clipshop.test", Role::Client)
            .await
            .unwrap();
        (EventService::new(db, notifier), admin, client)
    }

    #[tokio::test]
    async fn test_create_announces_and_any_user_may_add() {
        let (notifier, mut rx) = Notifier::capture();
        let (svc, _, client) = setup(notifier).await;

        let event = svc.create(&client, open_night()).await.unwrap();
        assert_eq!(svc.list().await.unwrap().len(), 1);
        assert_eq!(svc.get(&event.id).await.unwrap().name, "Open night");

        match rx.recv().await.unwrap() {
            Notification::AdminEvent { text } => assert!(text.contains("Open night")),
            other => panic!("expected admin event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (svc, _, client) = setup(Notifier::null()).await;

        let mut blank = open_night();
        blank.name = "  ".to_string();
        let err = svc.create(&client, blank).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut bad_time = open_night();
        bad_time.time = "7pm".to_string();
        let err = svc.create(&client, bad_time).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_and_delete_are_admin_only() {
        let (svc, admin, client) = setup(Notifier::null()).await;
        let event = svc.create(&client, open_night()).await.unwrap();

        let move_it = EventUpdate {
            location: Some("Main square".to_string()),
            ..Default::default()
        };
        let err = svc
            .update(&client, &event.id, move_it.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let moved = svc.update(&admin, &event.id, move_it).await.unwrap();
        assert_eq!(moved.location, "Main square");

        let err = svc.delete(&client, &event.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        svc.delete(&admin, &event.id).await.unwrap();
        let err = svc.get(&event.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "Event", .. }));
    }
}
