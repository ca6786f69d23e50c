use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use shared::{DocumentStore, Order, OrderRepository, OrderStatus, PaymentUpdate, StoreError};
use tracing::warn;

use crate::models::{DbDocument, DbOrder};
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

async fn connect(pool: &DbPool) -> Result<PooledConnection<'_, AsyncPgConnection>, StoreError> {
    pool.get()
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))
}

fn into_order(row: DbOrder) -> Result<Order, StoreError> {
    Order::try_from(row).map_err(backend)
}

/// Converts every row that parses; the others are logged and skipped.
fn readable_orders(rows: Vec<DbOrder>) -> Vec<Order> {
    rows.into_iter()
        .filter_map(|row| {
            let order_id = row.order_id.clone();
            match Order::try_from(row) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!("Skipping unreadable order {}: {:#}", order_id, e);
                    None
                }
            }
        })
        .collect()
}

/// The `orders` table.
pub struct PgOrderRepository {
    pool: DbPool,
}

impl PgOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let mut conn = connect(&self.pool).await?;
        let rows = orders::table
            .order(orders::placed_at.desc())
            .load::<DbOrder>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(readable_orders(rows))
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = connect(&self.pool).await?;
        let row = orders::table
            .filter(orders::order_id.eq(order_id))
            .first::<DbOrder>(&mut conn)
            .await
            .optional()
            .map_err(backend)?;
        row.map(into_order).transpose()
    }

    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut conn = connect(&self.pool).await?;
        let row = DbOrder::try_from(order).map_err(backend)?;
        diesel::insert_into(orders::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = connect(&self.pool).await?;
        let row = diesel::update(orders::table.filter(orders::order_id.eq(order_id)))
            .set(orders::status.eq(status.as_str()))
            .get_result::<DbOrder>(&mut conn)
            .await
            .optional()
            .map_err(backend)?;
        row.map(into_order).transpose()
    }

    async fn update_payment(
        &self,
        order_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = connect(&self.pool).await?;
        let target = orders::table.filter(orders::order_id.eq(order_id));
        let row = match &update.payment_method {
            Some(method) => {
                diesel::update(target)
                    .set((
                        orders::is_paid.eq(update.is_paid),
                        orders::payment_method.eq(method),
                    ))
                    .get_result::<DbOrder>(&mut conn)
                    .await
            }
            None => {
                diesel::update(target)
                    .set(orders::is_paid.eq(update.is_paid))
                    .get_result::<DbOrder>(&mut conn)
                    .await
            }
        }
        .optional()
        .map_err(backend)?;
        row.map(into_order).transpose()
    }

    async fn delete(&self, order_id: &str) -> Result<bool, StoreError> {
        let mut conn = connect(&self.pool).await?;
        let deleted = diesel::delete(orders::table.filter(orders::order_id.eq(order_id)))
            .execute(&mut conn)
            .await
            .map_err(backend)?;
        Ok(deleted > 0)
    }
}

/// JSON documents keyed by name in the `documents` table.
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let mut conn = connect(&self.pool).await?;
        documents::table
            .filter(documents::key.eq(key))
            .select(documents::value)
            .first::<serde_json::Value>(&mut conn)
            .await
            .optional()
            .map_err(backend)
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let mut conn = connect(&self.pool).await?;
        let doc = DbDocument {
            key: key.to_string(),
            value,
            updated_at: Utc::now(),
        };
        diesel::insert_into(documents::table)
            .values(&doc)
            .on_conflict(documents::key)
            .do_update()
            .set(&doc)
            .execute(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
