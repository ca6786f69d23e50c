use crate::models::{Order, OrderStatus, PaymentStatus};
use crate::store::{self, DocumentStore, StoreError, ORDERS_KEY};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub is_paid: bool,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl PaymentUpdate {
    pub fn apply(&self, order: &mut Order) {
        order.payment_status = PaymentStatus::from_paid(self.is_paid);
        if let Some(method) = &self.payment_method {
            order.payment_method = method.clone();
        }
    }
}

/// Persistence port for orders. `list` is ordered newest first.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Order>, StoreError>;
    async fn get(&self, order_id: &str) -> Result<Option<Order>, StoreError>;
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;
    async fn update_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
    ) -> Result<Option<Order>, StoreError>;
    async fn update_payment(
        &self,
        order_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Option<Order>, StoreError>;
    async fn delete(&self, order_id: &str) -> Result<bool, StoreError>;
}

/// Orders kept as one JSON array under `restaurantOrders`.
pub struct DocumentOrderRepository {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl DocumentOrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<Order>, StoreError> {
        match self.store.get(ORDERS_KEY).await? {
            Some(value) => serde_json::from_value(value).map_err(|source| StoreError::Malformed {
                key: ORDERS_KEY.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn modify(
        &self,
        order_id: &str,
        f: impl FnOnce(&mut Order),
    ) -> Result<Option<Order>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut orders = self.read_all().await?;
        let Some(order) = orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(None);
        };
        f(order);
        let updated = order.clone();
        store::save(self.store.as_ref(), ORDERS_KEY, &orders).await?;
        Ok(Some(updated))
    }
}

#[async_trait]
impl OrderRepository for DocumentOrderRepository {
    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders = self.read_all().await?;
        orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(orders)
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.read_all().await?.into_iter().find(|o| o.id == order_id))
    }

    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut orders = self.read_all().await?;
        orders.push(order.clone());
        store::save(self.store.as_ref(), ORDERS_KEY, &orders).await
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        self.modify(order_id, |order| order.status = status.clone())
            .await
    }

    async fn update_payment(
        &self,
        order_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Option<Order>, StoreError> {
        self.modify(order_id, |order| update.apply(order)).await
    }

    async fn delete(&self, order_id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut orders = self.read_all().await?;
        let before = orders.len();
        orders.retain(|o| o.id != order_id);
        if orders.len() == before {
            return Ok(false);
        }
        store::save(self.store.as_ref(), ORDERS_KEY, &orders).await?;
        Ok(true)
    }
}
