//! # Catalog Repository
//!
//! CRUD for the three catalog entities: services, time slots and products.
//!
//! ## Notes
//! - Service and product prices are stored as integer cents.
//! - Time slots are the shared enumeration every barber works from; they
//!   carry no date and are created once by an admin.
//! - Product stock is adjusted here only by direct admin edits. Lifecycle
//!   adjustments (decrement on order, restore on cancel) live in the order
//!   repository because they must share a transaction with the order rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use clipshop_core::{Product, Service, TimeSlot};

/// Fields of a new service.
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i64,
}

/// Fields of a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub image: Option<String>,
}

/// Partial product update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub image: Option<Option<String>>,
}

/// Repository for catalog entities.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// Inserts a service.
    pub async fn create_service(&self, new: NewService) -> DbResult<Service> {
        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            price_cents: new.price_cents,
            duration_minutes: new.duration_minutes,
            created_at: Utc::now(),
        };

        debug!(id = %service.id, name = %service.name, "Creating service");

        sqlx::query(
            r#"
            INSERT INTO services (id, name, description, price_cents, duration_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;

        Ok(service)
    }

    /// Gets a service by id.
    pub async fn get_service(&self, id: &str) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, description, price_cents, duration_minutes, created_at
            FROM services
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Lists all services, ordered by name.
    pub async fn list_services(&self) -> DbResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, description, price_cents, duration_minutes, created_at
            FROM services
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Updates a service's price and duration.
    ///
    /// Existing bookings are unaffected; earnings windows read the service
    /// price at aggregation time, so edits apply retroactively there.
    pub async fn update_service(
        &self,
        id: &str,
        price_cents: i64,
        duration_minutes: i64,
    ) -> DbResult<Service> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET price_cents = ?2, duration_minutes = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(price_cents)
        .bind(duration_minutes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        self.get_service(id)
            .await?
            .ok_or_else(|| DbError::not_found("Service", id))
    }

    /// Deletes a service. Bookings referencing it cascade.
    pub async fn delete_service(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM services WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        Ok(())
    }

    // =========================================================================
    // Time Slots
    // =========================================================================

    /// Inserts a time slot. Duplicate (start, end) pairs are rejected by the
    /// unique constraint.
    pub async fn create_time_slot(&self, start_time: &str, end_time: &str) -> DbResult<TimeSlot> {
        let slot = TimeSlot {
            id: Uuid::new_v4().to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        };

        debug!(id = %slot.id, start = %slot.start_time, "Creating time slot");

        sqlx::query(
            r#"
            INSERT INTO time_slots (id, start_time, end_time)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&slot.id)
        .bind(&slot.start_time)
        .bind(&slot.end_time)
        .execute(&self.pool)
        .await?;

        Ok(slot)
    }

    /// Gets a time slot by id.
    pub async fn get_time_slot(&self, id: &str) -> DbResult<Option<TimeSlot>> {
        let slot = sqlx::query_as::<_, TimeSlot>(
            "SELECT id, start_time, end_time FROM time_slots WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(slot)
    }

    /// Lists all time slots ordered by start time.
    ///
    /// `HH:MM` strings sort lexicographically in time order.
    pub async fn list_time_slots(&self) -> DbResult<Vec<TimeSlot>> {
        let slots = sqlx::query_as::<_, TimeSlot>(
            "SELECT id, start_time, end_time FROM time_slots ORDER BY start_time",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Inserts a product.
    pub async fn create_product(&self, new: NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            price_cents: new.price_cents,
            stock: new.stock,
            image: new.image,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, stock = product.stock, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, image, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.image)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by id.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, image, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, ordered by name.
    pub async fn list_products(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, image, created_at, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a partial update to a product.
    ///
    /// Price edits here do NOT touch existing order lines; those keep the
    /// unit price frozen at order time.
    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> DbResult<Product> {
        let current = self
            .get_product(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let name = update.name.unwrap_or(current.name);
        let description = update.description.unwrap_or(current.description);
        let price_cents = update.price_cents.unwrap_or(current.price_cents);
        let stock = update.stock.unwrap_or(current.stock);
        let image = update.image.unwrap_or(current.image);

        debug!(id = %id, stock, price_cents, "Updating product");

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, description = ?3, price_cents = ?4, stock = ?5,
                image = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&description)
        .bind(price_cents)
        .bind(stock)
        .bind(&image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_product(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Order lines referencing it cascade.
    pub async fn delete_product(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn haircut() -> NewService {
        NewService {
            name: "Haircut".to_string(),
            description: Some("Classic cut".to_string()),
            price_cents: 2000,
            duration_minutes: 30,
        }
    }

    fn pomade(stock: i64) -> NewProduct {
        NewProduct {
            name: "Pomade".to_string(),
            description: None,
            price_cents: 1250,
            stock,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_service_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let service = catalog.create_service(haircut()).await.unwrap();
        assert_eq!(service.price().to_string(), "20.00");

        let updated = catalog
            .update_service(&service.id, 2500, 45)
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 2500);
        assert_eq!(updated.duration_minutes, 45);

        catalog.delete_service(&service.id).await.unwrap();
        assert!(catalog.get_service(&service.id).await.unwrap().is_none());

        let err = catalog.delete_service(&service.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_time_slots_sorted_and_unique() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        catalog.create_time_slot("10:00", "10:30").await.unwrap();
        catalog.create_time_slot("09:00", "09:30").await.unwrap();

        let slots = catalog.list_time_slots().await.unwrap();
        assert_eq!(slots[0].start_time, "09:00");
        assert_eq!(slots[1].start_time, "10:00");

        let err = catalog.create_time_slot("09:00", "09:30").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_product_partial_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let product = catalog.create_product(pomade(10)).await.unwrap();

        let updated = catalog
            .update_product(
                &product.id,
                ProductUpdate {
                    stock: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stock, 7);
        // Untouched fields keep their values.
        assert_eq!(updated.name, "Pomade");
        assert_eq!(updated.price_cents, 1250);
    }
}
