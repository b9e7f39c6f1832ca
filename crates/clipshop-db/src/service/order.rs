//! # Order Service
//!
//! Storefront order lifecycle above the transactional stock ledger:
//! input validation, ownership checks, the simulated payment step, and
//! wire-form assembly with derived totals.
//!
//! ## Lifecycle
//! ```text
//! create ──► PENDING ──pay──► COMPLETED ──cancel──► CANCELLED
//!               │                                      ▲
//!               └──────────────cancel──────────────────┘
//! ```

use chrono::Utc;
use tracing::{info, warn};

use crate::error::DbError;
use crate::notify::{Notification, Notifier};
use crate::pool::Database;
use clipshop_core::dto::OrderDto;
use clipshop_core::validation::{validate_card, validate_quantity};
use clipshop_core::{CardDetails, CoreError, CoreResult, Order, OrderLine, User};

/// Order lifecycle service.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
    notifier: Notifier,
}

impl OrderService {
    /// Creates a new OrderService.
    pub fn new(db: Database, notifier: Notifier) -> Self {
        OrderService { db, notifier }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Creates a PENDING order from the requested lines.
    ///
    /// Duplicate product lines merge, quantities are validated, and the
    /// stock decrement plus row inserts happen in one transaction; any
    /// missing product or shortfall leaves nothing behind.
    pub async fn create(&self, user: &User, lines: &[OrderLine]) -> CoreResult<OrderDto> {
        let merged = OrderLine::merge(lines)?;
        for line in &merged {
            validate_quantity(line.quantity)?;
        }

        let (order, items) = self
            .db
            .orders()
            .create(&user.id, &merged)
            .await
            .map_err(product_not_found)?;

        info!(id = %order.id, user = %user.id, lines = items.len(), "Order created");

        self.notifier.send(Notification::AdminEvent {
            text: format!("new order {} by {}", order.id, user.username),
        });

        Ok(OrderDto::from_parts(&order, &items))
    }

    /// Adds units of a product to one of the user's PENDING orders.
    pub async fn add_item(
        &self,
        user: &User,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> CoreResult<OrderDto> {
        validate_quantity(quantity)?;
        self.fetch_owned(user, order_id).await?;

        self.db
            .orders()
            .add_item(order_id, product_id, quantity)
            .await
            .map_err(product_not_found)?;

        self.assemble_by_id(order_id).await
    }

    /// Simulated payment: validates the card format and expiry, then flips
    /// PENDING → COMPLETED. Nothing is charged and nothing is stored.
    pub async fn pay(&self, user: &User, order_id: &str, card: &CardDetails) -> CoreResult<OrderDto> {
        self.fetch_owned(user, order_id).await?;
        validate_card(card, Utc::now().date_naive())?;

        self.db.orders().mark_completed(order_id).await?;

        info!(id = %order_id, "Order paid");
        self.assemble_by_id(order_id).await
    }

    /// Cancels a PENDING or COMPLETED order, restoring stock for every
    /// line in the same transaction. Terminal.
    pub async fn cancel(&self, user: &User, order_id: &str) -> CoreResult<OrderDto> {
        self.fetch_owned(user, order_id).await?;

        self.db.orders().cancel(order_id).await?;

        info!(id = %order_id, "Order cancelled, stock restored");
        self.assemble_by_id(order_id).await
    }

    /// Admin-only hard removal. Items cascade away and stock stays as it
    /// is; cancel first if the units should return to the shelf.
    pub async fn delete(&self, requester: &User, order_id: &str) -> CoreResult<()> {
        if !requester.is_admin() {
            return Err(CoreError::forbidden("only admins may delete orders"));
        }

        self.db
            .orders()
            .delete(order_id)
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => CoreError::not_found("Order", order_id),
                other => other.into(),
            })?;

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets one order with its derived total, visible to its owner and
    /// admins.
    pub async fn get(&self, requester: &User, order_id: &str) -> CoreResult<OrderDto> {
        let order = self.fetch_owned(requester, order_id).await?;
        self.assemble(&order).await
    }

    /// A user's own orders, newest first.
    pub async fn list_for_user(&self, user: &User) -> CoreResult<Vec<OrderDto>> {
        let orders = self.db.orders().list_for_user(&user.id).await?;
        let mut dtos = Vec::with_capacity(orders.len());
        for order in &orders {
            dtos.push(self.assemble(order).await?);
        }
        Ok(dtos)
    }

    /// Every order in the system. Admin only.
    pub async fn list_all(&self, requester: &User) -> CoreResult<Vec<OrderDto>> {
        if !requester.is_admin() {
            return Err(CoreError::forbidden("only admins may list all orders"));
        }

        let orders = self.db.orders().list_all().await?;
        let mut dtos = Vec::with_capacity(orders.len());
        for order in &orders {
            dtos.push(self.assemble(order).await?);
        }
        Ok(dtos)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Fetches an order and enforces owner-or-admin access.
    async fn fetch_owned(&self, requester: &User, order_id: &str) -> CoreResult<Order> {
        let order = self
            .db
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        if order.user_id != requester.id && !requester.is_admin() {
            warn!(order = %order_id, requester = %requester.id, "Rejected order access");
            return Err(CoreError::forbidden("not your order"));
        }

        Ok(order)
    }

    async fn assemble(&self, order: &Order) -> CoreResult<OrderDto> {
        let items = self.db.orders().items(&order.id).await?;
        Ok(OrderDto::from_parts(order, &items))
    }

    async fn assemble_by_id(&self, order_id: &str) -> CoreResult<OrderDto> {
        let order = self
            .db
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;
        self.assemble(&order).await
    }
}

/// Repository NotFound during order mutation means a referenced product
/// (or the order itself) vanished; surface the entity the repo named.
fn product_not_found(err: DbError) -> CoreError {
    match err {
        DbError::NotFound { entity, id } if entity == "Product" => CoreError::NotFound {
            entity: "Product",
            id,
        },
        DbError::NotFound { entity, id } if entity == "Order" => CoreError::NotFound {
            entity: "Order",
            id,
        },
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::NewProduct;
    use clipshop_core::{OrderStatus, Role};

    struct Fixture {
        db: Database,
        svc: OrderService,
        admin: User,
        client: User,
        other: User,
        pomade: String,
        razor: String,
    }

    async fn setup() -> Fixture {
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
        let other = db
            .users()
            .insert("bob", "bob@clipshop.test", Role::Client)
            .await
            .unwrap();

        let pomade = db
            .catalog()
            .create_product(NewProduct {
                name: "Pomade".to_string(),
                description: None,
                price_cents: 1250,
                stock: 10,
                image: None,
            })
            .await
            .unwrap();
        let razor = db
            .catalog()
            .create_product(NewProduct {
                name: "Razor".to_string(),
                description: None,
                price_cents: 800,
                stock: 1,
                image: None,
            })
            .await
            .unwrap();

        Fixture {
            svc: OrderService::new(db.clone(), Notifier::null()),
            db,
            admin,
            client,
            other,
            pomade: pomade.id,
            razor: razor.id,
        }
    }

    fn card() -> CardDetails {
        CardDetails {
            number: "4242 4242 4242 4242".to_string(),
            expiry: "12/39".to_string(),
            cvc: "123".to_string(),
        }
    }

    async fn stock_of(f: &Fixture, product_id: &str) -> i64 {
        f.db.catalog()
            .get_product(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_create_merges_lines_and_derives_price() {
        let f = setup().await;

        let lines = vec![
            OrderLine::new(&f.pomade, 1),
            OrderLine::new(&f.razor, 1),
            OrderLine::new(&f.pomade, 2),
        ];
        let dto = f.svc.create(&f.client, &lines).await.unwrap();

        assert_eq!(dto.status, OrderStatus::Pending);
        assert_eq!(dto.items.len(), 2);
        // 3 * 12.50 + 1 * 8.00
        assert_eq!(dto.price.to_string(), "45.50");
        assert_eq!(stock_of(&f, &f.pomade).await, 7);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let f = setup().await;

        let err = f.svc.create(&f.client, &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = f
            .svc
            .create(&f.client, &[OrderLine::new(&f.pomade, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = f
            .svc
            .create(&f.client, &[OrderLine::new("ghost", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "Product", .. }));
    }

    #[tokio::test]
    async fn test_insufficient_stock_surfaces_numbers() {
        let f = setup().await;

        let err = f
            .svc
            .create(&f.client, &[OrderLine::new(&f.razor, 3)])
            .await
            .unwrap_err();

        match err {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Razor");
                assert_eq!(available, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pay_validates_card_and_state() {
        let f = setup().await;

        let order = f
            .svc
            .create(&f.client, &[OrderLine::new(&f.pomade, 1)])
            .await
            .unwrap();

        let mut expired = card();
        expired.expiry = "01/20".to_string();
        let err = f.svc.pay(&f.client, &order.id, &expired).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let paid = f.svc.pay(&f.client, &order.id, &card()).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Completed);

        // Paying twice is a state conflict.
        let err = f.svc.pay(&f.client, &order.id, &card()).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_even_after_payment() {
        let f = setup().await;

        let order = f
            .svc
            .create(&f.client, &[OrderLine::new(&f.pomade, 4)])
            .await
            .unwrap();
        f.svc.pay(&f.client, &order.id, &card()).await.unwrap();

        let cancelled = f.svc.cancel(&f.client, &order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&f, &f.pomade).await, 10);

        let err = f.svc.cancel(&f.client, &order.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ownership_and_admin_rules() {
        let f = setup().await;

        let order = f
            .svc
            .create(&f.client, &[OrderLine::new(&f.pomade, 1)])
            .await
            .unwrap();

        let err = f.svc.get(&f.other, &order.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
        // Admins see everything.
        f.svc.get(&f.admin, &order.id).await.unwrap();

        let err = f.svc.delete(&f.client, &order.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
        f.svc.delete(&f.admin, &order.id).await.unwrap();

        let err = f.svc.get(&f.admin, &order.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        // Delete is not cancel: the unit stays sold.
        assert_eq!(stock_of(&f, &f.pomade).await, 9);
    }

    #[tokio::test]
    async fn test_add_item_flow() {
        let f = setup().await;

        let order = f
            .svc
            .create(&f.client, &[OrderLine::new(&f.pomade, 1)])
            .await
            .unwrap();

        let updated = f
            .svc
            .add_item(&f.client, &order.id, &f.pomade, 2)
            .await
            .unwrap();
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].quantity, 3);

        f.svc.pay(&f.client, &order.id, &card()).await.unwrap();
        let err = f
            .svc
            .add_item(&f.client, &order.id, &f.pomade, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_racing_orders_for_last_unit() {
        let f = setup().await;

        // One razor on the shelf, two buyers. The lines outlive the join
        // since the futures borrow them until both complete.
        let lines_a = [OrderLine::new(&f.razor, 1)];
        let lines_b = [OrderLine::new(&f.razor, 1)];
        let (a, b) = tokio::join!(
            f.svc.create(&f.client, &lines_a),
            f.svc.create(&f.other, &lines_b),
        );

        assert_eq!(
            [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
            1,
            "exactly one order must win the last unit"
        );
        assert_eq!(stock_of(&f, &f.razor).await, 0);
    }
}
