use crate::models::{Order, OrderItem, OrderStatus, OrderType, PaymentStatus};
use crate::store::{DocumentStore, MemoryStore, StoreError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

pub fn item(id: &str, name: &str, price: f64, quantity: u32, category: Option<&str>) -> OrderItem {
    OrderItem {
        id: id.to_string(),
        name: name.to_string(),
        price,
        quantity,
        category: category.map(str::to_string),
        selected_variant: None,
        variants: Vec::new(),
    }
}

pub fn order(id: &str, status: &str, items: Vec<OrderItem>) -> Order {
    let mut order = Order {
        id: id.to_string(),
        items,
        status: OrderStatus::from(status),
        total: 0.0,
        payment_status: PaymentStatus::Pending,
        payment_method: "cash".to_string(),
        table: None,
        timestamp: Utc.with_ymd_and_hms(2024, 3, 15, 13, 30, 0).unwrap(),
        customer_name: "Test Customer".to_string(),
        customer_phone: None,
        order_type: OrderType::DineIn,
        delivery_address: None,
    };
    order.total = order.items_total();
    order
}

/// Every call fails, standing in for a missing backend.
pub struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Err(StoreError::Unavailable("no backend".to_string()))
    }

    async fn set(&self, _key: &str, _value: serde_json::Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("no backend".to_string()))
    }
}

/// A `MemoryStore` whose next `get` fails once `fail_next_read` is called.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_read: AtomicBool,
}

impl FlakyStore {
    pub fn fail_next_read(&self) {
        self.fail_read.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        if self.fail_read.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("read timed out".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }
}
