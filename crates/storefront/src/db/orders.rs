//! Order repository.
//!
//! Orders are immutable snapshots of a cart at checkout time; only the
//! status (and payment timestamp) change afterwards.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sweet_delights_core::{
    DeliveryProvider, Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem};

/// Database row for an order.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: String,
    item_total: Money,
    promo_discount: Money,
    promo_code: Option<String>,
    delivery_provider: String,
    delivery_cost: Money,
    certificate_code: Option<String>,
    certificate_applied: Money,
    payable_total: Money,
    recipient_name: String,
    recipient_phone: String,
    city: String,
    address: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

/// Database row for an order line.
#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    product_id: ProductId,
    title: String,
    unit_price: Money,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            title: row.title,
            unit_price: row.unit_price,
            quantity: row.quantity,
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;
        let delivery_provider: DeliveryProvider = self
            .delivery_provider
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status,
            items,
            item_total: self.item_total,
            promo_discount: self.promo_discount,
            promo_code: self.promo_code,
            delivery_provider,
            delivery_cost: self.delivery_cost,
            certificate_code: self.certificate_code,
            certificate_applied: self.certificate_applied,
            payable_total: self.payable_total,
            recipient_name: self.recipient_name,
            recipient_phone: self.recipient_phone,
            city: self.city,
            address: self.address,
            created_at: self.created_at,
            paid_at: self.paid_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, item_total, promo_discount, promo_code, \
     delivery_provider, delivery_cost, certificate_code, certificate_applied, payable_total, \
     recipient_name, recipient_phone, city, address, created_at, paid_at";

/// A line of an order being created.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: i32,
}

/// An order being created at checkout.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub item_total: Money,
    pub promo_discount: Money,
    pub promo_code: Option<String>,
    pub delivery_provider: DeliveryProvider,
    pub delivery_cost: Money,
    pub certificate_code: Option<String>,
    pub certificate_applied: Money,
    pub payable_total: Money,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub city: String,
    pub address: String,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, new_order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (user_id, status, item_total, promo_discount, promo_code, \
                 delivery_provider, delivery_cost, certificate_code, certificate_applied, \
                 payable_total, recipient_name, recipient_phone, city, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_order.user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(new_order.item_total)
        .bind(new_order.promo_discount)
        .bind(new_order.promo_code.as_deref())
        .bind(new_order.delivery_provider.as_str())
        .bind(new_order.delivery_cost)
        .bind(new_order.certificate_code.as_deref())
        .bind(new_order.certificate_applied)
        .bind(new_order.payable_total)
        .bind(&new_order.recipient_name)
        .bind(&new_order.recipient_phone)
        .bind(&new_order.city)
        .bind(&new_order.address)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new_order.items.len());
        for item in &new_order.items {
            let item_row: OrderItemRow = sqlx::query_as(
                "INSERT INTO order_items (order_id, product_id, title, unit_price, quantity) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, product_id, title, unit_price, quantity",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.title)
            .bind(item.unit_price)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::from(item_row));
        }

        tx.commit().await?;

        row.into_order(items)
    }

    async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, product_id, title, unit_price, quantity \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.items(row.id).await?;
        Ok(Some(row.into_order(items)?))
    }

    /// Get an order owned by a specific user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        match self.get_by_id(id).await? {
            Some(order) if order.user_id == user_id => Ok(Some(order)),
            _ => Ok(None),
        }
    }

    /// List a user's orders, newest first, lines included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items(row.id).await?;
            orders.push(row.into_order(items)?);
        }

        Ok(orders)
    }

    /// List recent orders across all users. Admin view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items(row.id).await?;
            orders.push(row.into_order(items)?);
        }

        Ok(orders)
    }

    /// Mark a pending order paid. Idempotent against double callbacks:
    /// a second confirmation finds no pending row and reports `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is not pending.
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_paid(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, paid_at = NOW() WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(OrderStatus::Paid.as_str())
        .bind(OrderStatus::Pending.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing order from a non-pending one
            let exists: Option<(OrderId,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
            return Err(exists.map_or(RepositoryError::NotFound, |_| {
                RepositoryError::Conflict("order is not pending".to_owned())
            }));
        }

        Ok(())
    }

    /// Move an order from `current` to `next` status. The caller checks
    /// the transition is legal; the WHERE clause makes it race-safe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is not in `current`.
    pub async fn transition_status(
        &self,
        id: OrderId,
        current: OrderStatus,
        next: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(current.as_str())
            .bind(next.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "order is not {}",
                current.as_str()
            )));
        }

        Ok(())
    }
}
