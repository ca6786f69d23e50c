pub mod export;
pub mod models;
pub mod notify;
pub mod orders;
pub mod reconcile;
pub mod stats;
pub mod store;
pub mod tables;

#[cfg(test)]
pub(crate) mod testing;

pub use export::{format_currency, orders_to_csv, CSV_HEADER};
pub use models::*;
pub use notify::{AdminNotification, NotificationLog, Notifier};
pub use orders::{DocumentOrderRepository, OrderRepository, PaymentUpdate};
pub use reconcile::{map_order_status_to_table_status, Reconciler, TableTransition};
pub use stats::{order_stats, revenue_report, OrderStats, RevenueReport, StatsScope};
pub use store::{DocumentStore, MemoryStore, StoreError};
pub use tables::{default_floor_plan, TableRegistry, TableSummary};
