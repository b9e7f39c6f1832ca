//! # Catalog Service
//!
//! Admin management of services, time slots and products: role checks and
//! input validation in front of the catalog repository.
//!
//! Service durations are minutes internally; input also accepts the
//! ISO-8601 `PT1H30M` form, which many booking clients emit.

use tracing::info;

use crate::notify::{Notification, Notifier};
use crate::pool::Database;
use crate::repository::catalog::{NewProduct, NewService, ProductUpdate};
use clipshop_core::validation::{
    parse_iso_duration_minutes, validate_name, validate_price_cents, validate_stock,
};
use clipshop_core::{CoreError, CoreResult, Money, Product, Service, TimeSlot, User, ValidationError};

/// Catalog management service.
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
    notifier: Notifier,
}

impl CatalogService {
    /// Creates a new CatalogService.
    pub fn new(db: Database, notifier: Notifier) -> Self {
        CatalogService { db, notifier }
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// Creates a bookable service. `duration` accepts whole minutes
    /// (`"45"`) or an ISO-8601 duration (`"PT1H30M"`).
    pub async fn create_service(
        &self,
        requester: &User,
        name: &str,
        description: Option<String>,
        price: Money,
        duration: &str,
    ) -> CoreResult<Service> {
        require_admin(requester)?;
        validate_name(name)?;
        validate_price_cents(price.cents())?;
        let duration_minutes = parse_duration(duration)?;

        let service = self
            .db
            .catalog()
            .create_service(NewService {
                name: name.to_string(),
                description,
                price_cents: price.cents(),
                duration_minutes,
            })
            .await?;

        info!(id = %service.id, name = %service.name, "Service created");
        Ok(service)
    }

    /// Updates a service's price and duration.
    pub async fn update_service(
        &self,
        requester: &User,
        service_id: &str,
        price: Money,
        duration: &str,
    ) -> CoreResult<Service> {
        require_admin(requester)?;
        validate_price_cents(price.cents())?;
        let duration_minutes = parse_duration(duration)?;

        self.db
            .catalog()
            .update_service(service_id, price.cents(), duration_minutes)
            .await
            .map_err(|e| match e {
                crate::error::DbError::NotFound { .. } => {
                    CoreError::not_found("Service", service_id)
                }
                other => other.into(),
            })
    }

    /// Deletes a service. Admin only.
    pub async fn delete_service(&self, requester: &User, service_id: &str) -> CoreResult<()> {
        require_admin(requester)?;
        self.db
            .catalog()
            .delete_service(service_id)
            .await
            .map_err(|e| match e {
                crate::error::DbError::NotFound { .. } => {
                    CoreError::not_found("Service", service_id)
                }
                other => other.into(),
            })
    }

    /// Lists all services. Public.
    pub async fn list_services(&self) -> CoreResult<Vec<Service>> {
        Ok(self.db.catalog().list_services().await?)
    }

    // =========================================================================
    // Time Slots
    // =========================================================================

    /// Adds a slot to the shared enumeration. Admin only; a duplicate
    /// interval is a conflict.
    pub async fn create_time_slot(
        &self,
        requester: &User,
        start_time: &str,
        end_time: &str,
    ) -> CoreResult<TimeSlot> {
        require_admin(requester)?;
        clipshop_core::parse_slot_time("start_time", start_time)?;
        clipshop_core::parse_slot_time("end_time", end_time)?;

        self.db
            .catalog()
            .create_time_slot(start_time, end_time)
            .await
            .map_err(|e| match e {
                crate::error::DbError::UniqueViolation { .. } => {
                    CoreError::conflict("time slot already exists")
                }
                other => other.into(),
            })
    }

    /// Lists the slot enumeration in time order. Public.
    pub async fn list_time_slots(&self) -> CoreResult<Vec<TimeSlot>> {
        Ok(self.db.catalog().list_time_slots().await?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product and announces it to the admin chat.
    pub async fn create_product(
        &self,
        requester: &User,
        name: &str,
        description: Option<String>,
        price: Money,
        stock: i64,
        image: Option<String>,
    ) -> CoreResult<Product> {
        require_admin(requester)?;
        validate_name(name)?;
        validate_price_cents(price.cents())?;
        validate_stock(stock)?;

        let product = self
            .db
            .catalog()
            .create_product(NewProduct {
                name: name.to_string(),
                description,
                price_cents: price.cents(),
                stock,
                image,
            })
            .await?;

        info!(id = %product.id, name = %product.name, "Product created");
        self.notifier.send(Notification::AdminEvent {
            text: format!("new product in store: {}", product.name),
        });

        Ok(product)
    }

    /// Applies a partial product update. Admin only.
    pub async fn update_product(
        &self,
        requester: &User,
        product_id: &str,
        update: ProductUpdate,
    ) -> CoreResult<Product> {
        require_admin(requester)?;
        if let Some(price_cents) = update.price_cents {
            validate_price_cents(price_cents)?;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
        }

        self.db
            .catalog()
            .update_product(product_id, update)
            .await
            .map_err(|e| match e {
                crate::error::DbError::NotFound { .. } => {
                    CoreError::not_found("Product", product_id)
                }
                other => other.into(),
            })
    }

    /// Deletes a product. Admin only; existing order lines cascade away.
    pub async fn delete_product(&self, requester: &User, product_id: &str) -> CoreResult<()> {
        require_admin(requester)?;
        self.db
            .catalog()
            .delete_product(product_id)
            .await
            .map_err(|e| match e {
                crate::error::DbError::NotFound { .. } => {
                    CoreError::not_found("Product", product_id)
                }
                other => other.into(),
            })
    }

    /// Lists all products. Public.
    pub async fn list_products(&self) -> CoreResult<Vec<Product>> {
        Ok(self.db.catalog().list_products().await?)
    }
}

fn require_admin(requester: &User) -> CoreResult<()> {
    if !requester.is_admin() {
        return Err(CoreError::forbidden("only admins may manage the catalog"));
    }
    Ok(())
}

/// Minutes from either a bare integer or an ISO-8601 `PT…` duration.
fn parse_duration(input: &str) -> Result<i64, ValidationError> {
    if input.starts_with("PT") {
        return parse_iso_duration_minutes(input);
    }
    let minutes: i64 = input.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "duration".to_string(),
        reason: "must be minutes or an ISO-8601 duration".to_string(),
    })?;
    if minutes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration".to_string(),
        });
    }
    Ok(minutes)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use clipshop_core::Role;

    async fn setup() -> (CatalogService, User, User) {
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
        (CatalogService::new(db, Notifier::null()), admin, client)
    }

    #[tokio::test]
    async fn test_service_duration_forms() {
        let (svc, admin, client) = setup().await;

        let minutes = svc
            .create_service(&admin, "Haircut", None, Money::from_cents(2000), "45")
            .await
            .unwrap();
        assert_eq!(minutes.duration_minutes, 45);

        let iso = svc
            .create_service(&admin, "Full works", None, Money::from_cents(5000), "PT1H30M")
            .await
            .unwrap();
        assert_eq!(iso.duration_minutes, 90);

        let err = svc
            .create_service(&admin, "Bad", None, Money::from_cents(100), "soon")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = svc
            .create_service(&client, "Sneaky", None, Money::from_cents(100), "30")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_time_slot_validation_and_conflict() {
        let (svc, admin, _) = setup().await;

        svc.create_time_slot(&admin, "09:00", "09:30").await.unwrap();

        let err = svc
            .create_time_slot(&admin, "09:00", "09:30")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let err = svc.create_time_slot(&admin, "9am", "10am").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_product_announcement() {
        let (notifier, mut rx) = Notifier::capture();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db
            .users()
            .insert("boss", "boss@clipshop.test", Role::Admin)
            .await
            .unwrap();
        let svc = CatalogService::new(db, notifier);

        svc.create_product(&admin, "Pomade", None, Money::from_cents(1250), 10, None)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            Notification::AdminEvent { text } => assert!(text.contains("Pomade")),
            other => panic!("expected admin event, got {other:?}"),
        }
    }
}
