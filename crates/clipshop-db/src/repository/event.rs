//! # Event Repository
//!
//! CRUD for scheduled shop events. Events are announcements, not bookable
//! resources: they never participate in availability or earnings.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use clipshop_core::Event;

/// Fields of a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub image: Option<String>,
}

/// Partial event update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub image: Option<Option<String>>,
}

/// Repository for event rows.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    /// Creates a new EventRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EventRepository { pool }
    }

    /// Inserts an event.
    pub async fn create(&self, new: NewEvent) -> DbResult<Event> {
        let event = Event {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            date: new.date,
            time: new.time,
            location: new.location,
            image: new.image,
            created_at: Utc::now(),
        };

        debug!(id = %event.id, name = %event.name, date = %event.date, "Creating event");

        sqlx::query(
            r#"
            INSERT INTO events (id, name, description, date, time, location, image, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(&event.image)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    /// Gets an event by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, description, date, time, location, image, created_at
            FROM events
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Lists all events in calendar order.
    pub async fn list(&self) -> DbResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, description, date, time, location, image, created_at
            FROM events
            ORDER BY date, time
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Applies a partial update to an event.
    pub async fn update(&self, id: &str, update: EventUpdate) -> DbResult<Event> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Event", id))?;

        let name = update.name.unwrap_or(current.name);
        let description = update.description.unwrap_or(current.description);
        let date = update.date.unwrap_or(current.date);
        let time = update.time.unwrap_or(current.time);
        let location = update.location.unwrap_or(current.location);
        let image = update.image.unwrap_or(current.image);

        debug!(id = %id, %date, "Updating event");

        sqlx::query(
            r#"
            UPDATE events
            SET name = ?2, description = ?3, date = ?4, time = ?5, location = ?6, image = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&description)
        .bind(date)
        .bind(&time)
        .bind(&location)
        .bind(&image)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Event", id))
    }

    /// Hard-deletes an event.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Event", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
