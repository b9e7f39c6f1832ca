//! # User Repository
//!
//! Minimal user storage. Identity, credentials and token resolution are
//! owned by the external auth collaborator; the core keeps just enough to
//! check roles and satisfy foreign keys.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use clipshop_core::{Role, User};

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user with the given role.
    pub async fn insert(&self, username: &str, email: &str, role: Role) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        };

        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, role, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by id, requiring the worker role.
    ///
    /// ## Returns
    /// * `Ok(Some(user))` - user exists and is a barber
    /// * `Ok(None)` - user missing OR present without the worker role;
    ///   callers treat both as "barber not found"
    pub async fn get_barber(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, role, created_at
            FROM users
            WHERE id = ?1 AND role = 'worker'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all barbers.
    pub async fn list_barbers(&self) -> DbResult<Vec<User>> {
        let barbers = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, role, created_at
            FROM users
            WHERE role = 'worker'
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(barbers)
    }

    /// Deletes a user. Bookings and orders cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
