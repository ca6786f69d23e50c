use anyhow::Result;
use shared::stats::{self, OrderStats, RevenueReport, StatsScope};
use shared::{
    orders_to_csv, AdminNotification, DocumentStore, NotificationLog, Notifier, Order,
    OrderRepository, OrderStatus, PaymentUpdate, Reconciler, TableRegistry,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs every order mutation through the order store first and then brings
/// the table registry in line with it.
pub struct BackOffice {
    orders: Arc<dyn OrderRepository>,
    tables: Arc<TableRegistry>,
    reconciler: Reconciler,
    notifier: Arc<dyn Notifier>,
    inbox: NotificationLog,
}

impl BackOffice {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        documents: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tables = Arc::new(TableRegistry::new(documents.clone()));
        Self {
            orders,
            reconciler: Reconciler::new(tables.clone()),
            tables,
            notifier,
            inbox: NotificationLog::new(documents),
        }
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    pub fn inbox(&self) -> &NotificationLog {
        &self.inbox
    }

    pub async fn place_order(&self, order: Order) -> Result<Order> {
        self.orders.insert(&order).await?;
        info!("Order {} placed ({} items)", order.id, order.items.len());

        if self.reconciler.reconcile_new_order(&order).await? {
            info!("Order {} seated at table {:?}", order.id, order.table);
        }

        if let Err(e) = self.inbox.record(AdminNotification::for_order(&order)).await {
            warn!("Failed to record admin notification for {}: {}", order.id, e);
        }
        self.notifier.notify(&order);

        Ok(order)
    }

    pub async fn list_orders(&self) -> Vec<Order> {
        match self.orders.list().await {
            Ok(orders) => orders,
            Err(e) => {
                error!("Failed to list orders: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get_order(&self, order_id: &str) -> Option<Order> {
        match self.orders.get(order_id).await {
            Ok(order) => order,
            Err(e) => {
                error!("Failed to load order {}: {}", order_id, e);
                None
            }
        }
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let Some(order) = self.orders.update_status(order_id, &status).await? else {
            return Ok(None);
        };
        info!("Order {} is now {}", order_id, status);
        self.reconciler
            .update_table_for_order_status(order_id, &status)
            .await?;
        Ok(Some(order))
    }

    pub async fn update_payment(
        &self,
        order_id: &str,
        update: PaymentUpdate,
    ) -> Result<Option<Order>> {
        let order = self.orders.update_payment(order_id, &update).await?;
        if order.is_some() {
            info!("Order {} payment updated (paid: {})", order_id, update.is_paid);
        }
        Ok(order)
    }

    /// Deleting an order also releases any table still holding it.
    pub async fn delete_order(&self, order_id: &str) -> Result<bool> {
        if !self.orders.delete(order_id).await? {
            return Ok(false);
        }
        info!("Order {} deleted", order_id);
        self.reconciler
            .update_table_for_order_status(order_id, &OrderStatus::Cancelled)
            .await?;
        Ok(true)
    }

    pub async fn order_stats(&self, scope: StatsScope) -> OrderStats {
        stats::order_stats(&self.list_orders().await, scope)
    }

    pub async fn revenue_report(&self) -> RevenueReport {
        stats::revenue_report(&self.list_orders().await)
    }

    pub async fn export_csv(&self) -> String {
        orders_to_csv(&self.list_orders().await)
    }
}
