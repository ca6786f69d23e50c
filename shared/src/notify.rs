use crate::export::format_currency;
use crate::models::Order;
use crate::store::{self, DocumentStore, StoreError, NOTIFICATIONS_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const NOTIFICATION_LIMIT: usize = 50;

/// One-way announcement of a placed order. Implementations must not block the
/// caller and never report delivery failures back.
pub trait Notifier: Send + Sync {
    fn notify(&self, order: &Order);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotification {
    pub id: Uuid,
    pub order_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl AdminNotification {
    pub fn for_order(order: &Order) -> Self {
        let mut message = format!(
            "New {} order from {}: {} item(s), {}",
            order.order_type.as_str(),
            order.customer_name,
            order.items.iter().map(|i| i.quantity).sum::<u32>(),
            format_currency(order.items_total()),
        );
        if let Some(table) = &order.table {
            message.push_str(&format!(" at table {}", table));
        }
        Self {
            id: Uuid::new_v4(),
            order_id: order.id.clone(),
            message,
            created_at: Utc::now(),
            read: false,
        }
    }
}

/// The admin inbox under `adminNotifications`, newest first and capped.
pub struct NotificationLog {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl NotificationLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Vec<AdminNotification> {
        store::load(self.store.as_ref(), NOTIFICATIONS_KEY)
            .await
            .unwrap_or_default()
    }

    pub async fn unread_count(&self) -> usize {
        self.list().await.iter().filter(|n| !n.read).count()
    }

    async fn load_for_update(&self) -> Result<Vec<AdminNotification>, StoreError> {
        Ok(store::load_for_update(self.store.as_ref(), NOTIFICATIONS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn record(&self, notification: AdminNotification) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut inbox = self.load_for_update().await?;
        inbox.insert(0, notification);
        inbox.truncate(NOTIFICATION_LIMIT);
        store::save(self.store.as_ref(), NOTIFICATIONS_KEY, &inbox).await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut inbox = self.load_for_update().await?;
        let Some(entry) = inbox.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        entry.read = true;
        store::save(self.store.as_ref(), NOTIFICATIONS_KEY, &inbox).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{item, order, FlakyStore};

    #[test]
    fn message_summarises_the_order() {
        let mut placed = order(
            "a",
            "pending",
            vec![item("1", "Tea", 20.0, 2, None), item("2", "Naan", 30.0, 1, None)],
        );
        placed.table = Some("m3".to_string());

        let notification = AdminNotification::for_order(&placed);
        assert_eq!(
            notification.message,
            "New dineIn order from Test Customer: 3 item(s), ₹70.00 at table m3"
        );
        assert!(!notification.read);
    }

    #[tokio::test]
    async fn inbox_is_newest_first_and_capped() {
        let log = NotificationLog::new(Arc::new(MemoryStore::new()));
        for n in 0..(NOTIFICATION_LIMIT + 5) {
            let placed = order(&format!("order{}", n), "pending", vec![]);
            log.record(AdminNotification::for_order(&placed)).await.unwrap();
        }

        let inbox = log.list().await;
        assert_eq!(inbox.len(), NOTIFICATION_LIMIT);
        assert_eq!(inbox[0].order_id, format!("order{}", NOTIFICATION_LIMIT + 4));
    }

    #[tokio::test]
    async fn mark_read_updates_unread_count() {
        let log = NotificationLog::new(Arc::new(MemoryStore::new()));
        let notification = AdminNotification::for_order(&order("a", "pending", vec![]));
        let id = notification.id;
        log.record(notification).await.unwrap();
        assert_eq!(log.unread_count().await, 1);

        assert!(log.mark_read(id).await.unwrap());
        assert_eq!(log.unread_count().await, 0);
        assert!(!log.mark_read(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn failed_read_does_not_truncate_the_inbox() {
        let store = Arc::new(FlakyStore::default());
        let log = NotificationLog::new(store.clone());
        for id in ["a", "b"] {
            log.record(AdminNotification::for_order(&order(id, "pending", vec![])))
                .await
                .unwrap();
        }

        store.fail_next_read();
        let result = log
            .record(AdminNotification::for_order(&order("c", "pending", vec![])))
            .await;
        assert!(result.is_err());

        let inbox = log.list().await;
        assert_eq!(
            inbox.iter().map(|n| n.order_id.as_str()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );
    }
}
