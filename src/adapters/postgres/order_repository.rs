//! PostgreSQL implementation of OrderRepository.
//!
//! Orders live in `orders`, their frozen line items in `order_items`.
//! Items are written once at creation; `update` only touches the order row
//! and guards it with the `version` column.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, Money, OrderId, OrderNumber, ProductId, Timestamp, UserId,
};
use crate::domain::order::{NewOrder, Order, OrderItem, OrderPaymentStatus, OrderStatus};
use crate::ports::OrderRepository;

use super::{corrupt, db_error};

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(
        &self,
        order_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<OrderItem>>, DomainError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT order_id, product_id, product_name, quantity, unit_price, subtotal
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load order items", e))?;

        let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped.entry(order_id).or_default().push(row.try_into()?);
        }
        Ok(grouped)
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        items: &[OrderItem],
    ) -> Result<(), DomainError> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, product_id, product_name, quantity, unit_price, subtotal
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order_id)
            .bind(position as i32)
            .bind(item.product_id.value())
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.unit_price.minor_units())
            .bind(item.subtotal.minor_units())
            .execute(&mut **tx)
            .await
            .map_err(|e| db_error("Failed to save order item", e))?;
        }
        Ok(())
    }
}

/// Database row representation of an order (without items).
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    user_id: String,
    contact_email: Option<String>,
    status: String,
    payment_status: String,
    total_amount: i64,
    shipping_cost: i64,
    currency: String,
    delivery_address_id: Option<i64>,
    payment_method: Option<String>,
    notes: Option<String>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, DomainError> {
        Ok(Order {
            id: OrderId::new(self.id).map_err(corrupt)?,
            order_number: OrderNumber::parse(self.order_number).map_err(corrupt)?,
            user_id: UserId::new(self.user_id).map_err(corrupt)?,
            contact_email: self.contact_email,
            status: self.status.parse::<OrderStatus>().map_err(corrupt)?,
            payment_status: self
                .payment_status
                .parse::<OrderPaymentStatus>()
                .map_err(corrupt)?,
            total_amount: Money::try_new("total_amount", self.total_amount).map_err(corrupt)?,
            shipping_cost: Money::try_new("shipping_cost", self.shipping_cost).map_err(corrupt)?,
            currency: self.currency.parse::<Currency>().map_err(corrupt)?,
            delivery_address_id: self.delivery_address_id,
            payment_method: self.payment_method,
            notes: self.notes,
            items,
            version: self.version,
            created_at: Timestamp::from_datetime(self.created_at),
            updated_at: Timestamp::from_datetime(self.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i64,
    product_id: i64,
    product_name: String,
    quantity: i32,
    unit_price: i64,
    subtotal: i64,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DomainError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .map_err(|_| DomainError::database(format!("Invalid quantity: {}", row.quantity)))?;
        Ok(OrderItem {
            product_id: ProductId::new(row.product_id).map_err(corrupt)?,
            product_name: row.product_name,
            quantity,
            unit_price: Money::try_new("unit_price", row.unit_price).map_err(corrupt)?,
            subtotal: Money::try_new("subtotal", row.subtotal).map_err(corrupt)?,
        })
    }
}

const ORDER_COLUMNS: &str = r#"
    id, order_number, user_id, contact_email, status, payment_status,
    total_amount, shipping_cost, currency, delivery_address_id, payment_method,
    notes, version, created_at, updated_at
"#;

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO orders (
                order_number, user_id, contact_email, status, payment_status,
                total_amount, shipping_cost, currency, delivery_address_id, notes,
                version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1, $11, $11)
            RETURNING id
            "#,
        )
        .bind(order.order_number.as_str())
        .bind(order.user_id.as_str())
        .bind(&order.contact_email)
        .bind(OrderStatus::Pending.as_str())
        .bind(OrderPaymentStatus::Pending.as_str())
        .bind(order.total_amount.minor_units())
        .bind(order.shipping_cost.minor_units())
        .bind(order.currency.as_str())
        .bind(order.delivery_address_id)
        .bind(&order.notes)
        .bind(order.created_at.as_datetime())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to save order", e))?;

        Self::insert_items(&mut tx, id, &order.items).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit order", e))?;

        Ok(order.into_order(OrderId::new(id).map_err(corrupt)?))
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
                .bind(id.value())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch order", e))?;

        match row {
            Some(row) => {
                let mut items = self.load_items(&[row.id]).await?;
                let items = items.remove(&row.id).unwrap_or_default();
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch orders", e))?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect()
    }

    async fn update(&self, order: &Order) -> Result<Order, DomainError> {
        let updated: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE orders SET
                status = $3,
                payment_status = $4,
                payment_method = $5,
                updated_at = $6,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(order.id.value())
        .bind(order.version)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.payment_method)
        .bind(order.updated_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update order", e))?;

        match updated {
            Some((version,)) => {
                let mut stored = order.clone();
                stored.version = version;
                Ok(stored)
            }
            None => {
                let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
                    .bind(order.id.value())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| db_error("Failed to fetch order", e))?;
                if exists.is_none() {
                    return Err(DomainError::new(ErrorCode::OrderNotFound, "Order not found")
                        .with_detail("order_id", order.id.to_string()));
                }
                Err(DomainError::conflict(format!(
                    "Order {} was modified concurrently",
                    order.id
                ))
                .with_detail("expected_version", order.version.to_string()))
            }
        }
    }
}
