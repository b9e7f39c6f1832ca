//! # Order Repository
//!
//! Order rows, line items, and the stock ledger.
//!
//! ## Transaction Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Every multi-row mutation is ONE transaction             │
//! │                                                                         │
//! │  create:    decrement stock per line → insert order → insert items      │
//! │  add_item:  check PENDING → decrement stock → upsert line               │
//! │  cancel:    check state → restore stock per line → mark CANCELLED       │
//! │                                                                         │
//! │  Any failed step rolls back every prior step. There is no partial       │
//! │  order and no lost or conjured stock unit.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is conditional
//! (`... SET stock = stock - ? WHERE id = ? AND stock >= ?`), so two racing
//! orders for the last unit resolve inside SQLite: one matches the row, the
//! other matches nothing and fails with the shortfall.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use clipshop_core::{Order, OrderItem, OrderLine, OrderStatus};

/// Repository for orders and their line items.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates an order from already-merged lines.
    ///
    /// Lines must come out of [`OrderLine::merge`]: one line per product,
    /// positive quantities. Per line, stock is decremented conditionally and
    /// the current product price is frozen into the item. Any missing product
    /// or shortfall aborts the whole order.
    pub async fn create(&self, user_id: &str, lines: &[OrderLine]) -> DbResult<(Order, Vec<OrderItem>)> {
        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, user = %user_id, lines = lines.len(), "Creating order");

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let unit_price_cents =
                take_stock(&mut tx, &line.product_id, line.quantity).await?;

            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price_cents,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok((order, items))
    }

    /// Adds units of a product to a PENDING order.
    ///
    /// An existing line for the product absorbs the quantity and keeps its
    /// original frozen unit price; a new line freezes the current price.
    pub async fn add_item(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<OrderItem> {
        let mut tx = self.pool.begin().await?;

        let status = fetch_status(&mut tx, order_id).await?;
        if status != OrderStatus::Pending {
            return Err(DbError::InvalidState(format!(
                "order {order_id} is no longer pending"
            )));
        }

        let unit_price_cents = take_stock(&mut tx, product_id, quantity).await?;

        debug!(order = %order_id, product = %product_id, quantity, "Adding order item");

        // Upsert: a duplicate product merges into the existing line. The DO
        // UPDATE arm leaves unit_price_cents alone, preserving the price
        // frozen when the line was first created.
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (order_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price_cents)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET updated_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(item)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// PENDING → COMPLETED. Any other starting state is rejected.
    pub async fn mark_completed(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let status = fetch_status(&mut tx, order_id).await?;
        if status != OrderStatus::Pending {
            return Err(DbError::InvalidState(format!(
                "order {order_id} cannot be paid from its current state"
            )));
        }

        sqlx::query("UPDATE orders SET status = 'completed', updated_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(order = %order_id, "Order completed");
        Ok(())
    }

    /// PENDING or COMPLETED → CANCELLED, restoring stock for every line in
    /// the same transaction. Cancelling twice is rejected.
    pub async fn cancel(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let status = fetch_status(&mut tx, order_id).await?;
        if status == OrderStatus::Cancelled {
            return Err(DbError::InvalidState(format!(
                "order {order_id} is already cancelled"
            )));
        }

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE orders SET status = 'cancelled', updated_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(order = %order_id, restored_lines = items.len(), "Order cancelled");
        Ok(())
    }

    /// Hard-deletes an order; items cascade. Stock is NOT restored, so this
    /// is reserved for administrative cleanup, not for cancellation.
    pub async fn delete(&self, order_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order by id.
    pub async fn get(&self, order_id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order's line items.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY product_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists every order (admin view), newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, created_at, updated_at
            FROM orders
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

/// Current status of an order, inside the caller's transaction.
async fn fetch_status(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
) -> DbResult<OrderStatus> {
    sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))
}

/// Conditionally decrements stock and returns the product's current price
/// in cents, which the caller freezes into the line item.
///
/// The UPDATE only matches when enough stock remains; zero rows affected
/// means a shortfall (the product row was just read, so it exists).
async fn take_stock(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    quantity: i64,
) -> DbResult<i64> {
    let row = sqlx::query_as::<_, (String, i64, i64)>(
        "SELECT name, price_cents, stock FROM products WHERE id = ?1",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    let (name, price_cents, available) = match row {
        Some(row) => row,
        None => return Err(DbError::not_found("Product", product_id)),
    };

    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1 AND stock >= ?2",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InsufficientStock {
            product: name,
            available,
            requested: quantity,
        });
    }

    Ok(price_cents)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::{NewProduct, ProductUpdate};
    use clipshop_core::{order_total, Role};

    async fn setup() -> (Database, String, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = db
            .users()
            .insert("ana", "ana@clipshop.test", Role::Client)
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
                stock: 2,
                image: None,
            })
            .await
            .unwrap();

        (db, user.id, pomade.id, razor.id)
    }

    async fn stock_of(db: &Database, product_id: &str) -> i64 {
        db.catalog()
            .get_product(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_create_decrements_stock_and_derives_total() {
        let (db, user, pomade, razor) = setup().await;

        let lines = vec![OrderLine::new(&pomade, 2), OrderLine::new(&razor, 1)];
        let (order, items) = db.orders().create(&user, &lines).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(stock_of(&db, &pomade).await, 8);
        assert_eq!(stock_of(&db, &razor).await, 1);
        // 2 * 12.50 + 1 * 8.00
        assert_eq!(order_total(&items).to_string(), "33.00");
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_whole_order() {
        let (db, user, pomade, razor) = setup().await;

        // First line would succeed; second asks for more razors than exist.
        let lines = vec![OrderLine::new(&pomade, 2), OrderLine::new(&razor, 5)];
        let err = db.orders().create(&user, &lines).await.unwrap_err();

        match err {
            DbError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Razor");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The pomade decrement was rolled back and no order exists.
        assert_eq!(stock_of(&db, &pomade).await, 10);
        assert!(db.orders().list_for_user(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let (db, user, pomade, _) = setup().await;

        let lines = vec![OrderLine::new(&pomade, 1), OrderLine::new("ghost", 1)];
        let err = db.orders().create(&user, &lines).await.unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(stock_of(&db, &pomade).await, 10);
    }

    #[tokio::test]
    async fn test_add_item_merges_and_keeps_frozen_price() {
        let (db, user, pomade, _) = setup().await;
        let orders = db.orders();

        let (order, _) = orders
            .create(&user, &[OrderLine::new(&pomade, 1)])
            .await
            .unwrap();

        // The catalog price changes after the line was created.
        db.catalog()
            .update_product(
                &pomade,
                ProductUpdate {
                    price_cents: Some(9999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let item = orders.add_item(&order.id, &pomade, 2).await.unwrap();

        // Merged into one line; unit price stays what it was at creation.
        assert_eq!(item.quantity, 3);
        assert_eq!(item.unit_price_cents, 1250);
        assert_eq!(orders.items(&order.id).await.unwrap().len(), 1);
        assert_eq!(stock_of(&db, &pomade).await, 7);
    }

    #[tokio::test]
    async fn test_add_item_rejected_on_terminal_order() {
        let (db, user, pomade, _) = setup().await;
        let orders = db.orders();

        let (order, _) = orders
            .create(&user, &[OrderLine::new(&pomade, 1)])
            .await
            .unwrap();
        orders.mark_completed(&order.id).await.unwrap();

        let err = orders.add_item(&order.id, &pomade, 1).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState(_)));
        // Nothing moved.
        assert_eq!(stock_of(&db, &pomade).await, 9);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_is_terminal() {
        let (db, user, pomade, razor) = setup().await;
        let orders = db.orders();

        let lines = vec![OrderLine::new(&pomade, 3), OrderLine::new(&razor, 2)];
        let (order, _) = orders.create(&user, &lines).await.unwrap();
        assert_eq!(stock_of(&db, &razor).await, 0);

        orders.cancel(&order.id).await.unwrap();

        assert_eq!(stock_of(&db, &pomade).await, 10);
        assert_eq!(stock_of(&db, &razor).await, 2);

        let err = orders.cancel(&order.id).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState(_)));
        // Double cancel must not restore twice.
        assert_eq!(stock_of(&db, &razor).await, 2);
    }

    #[tokio::test]
    async fn test_completed_order_can_still_cancel_but_not_pay() {
        let (db, user, pomade, _) = setup().await;
        let orders = db.orders();

        let (order, _) = orders
            .create(&user, &[OrderLine::new(&pomade, 1)])
            .await
            .unwrap();

        orders.mark_completed(&order.id).await.unwrap();
        let err = orders.mark_completed(&order.id).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState(_)));

        orders.cancel(&order.id).await.unwrap();
        assert_eq!(stock_of(&db, &pomade).await, 10);
    }

    #[tokio::test]
    async fn test_delete_cascades_without_restoring_stock() {
        let (db, user, pomade, _) = setup().await;
        let orders = db.orders();

        let (order, _) = orders
            .create(&user, &[OrderLine::new(&pomade, 4)])
            .await
            .unwrap();

        orders.delete(&order.id).await.unwrap();

        assert!(orders.get(&order.id).await.unwrap().is_none());
        assert!(orders.items(&order.id).await.unwrap().is_empty());
        assert_eq!(stock_of(&db, &pomade).await, 6);
    }
}
