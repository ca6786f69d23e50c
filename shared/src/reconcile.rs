use crate::models::{Order, OrderStatus, OrderType, TableStatus};
use crate::store::StoreError;
use crate::tables::TableRegistry;
use std::sync::Arc;
use tracing::{debug, info};

/// What an order status change means for the table holding that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableTransition {
    Set(TableStatus),
    /// Back to `available` with the order reference cleared.
    Release,
    Unchanged,
}

pub fn map_order_status_to_table_status(status: &OrderStatus) -> TableTransition {
    match status {
        OrderStatus::Pending => TableTransition::Set(TableStatus::Occupied),
        OrderStatus::Preparing => TableTransition::Set(TableStatus::Preparing),
        OrderStatus::Ready => TableTransition::Set(TableStatus::Ready),
        OrderStatus::Served | OrderStatus::Delivered => TableTransition::Set(TableStatus::Occupied),
        OrderStatus::Completed | OrderStatus::Cancelled => TableTransition::Release,
        OrderStatus::Confirmed | OrderStatus::Approved | OrderStatus::Other(_) => {
            TableTransition::Unchanged
        }
    }
}

/// Keeps table occupancy in step with the orders seated at them.
pub struct Reconciler {
    tables: Arc<TableRegistry>,
}

impl Reconciler {
    pub fn new(tables: Arc<TableRegistry>) -> Self {
        Self { tables }
    }

    /// Returns `false` when no table references `order_id`.
    pub async fn update_table_for_order_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
    ) -> Result<bool, StoreError> {
        let transition = map_order_status_to_table_status(status);
        let table_id = self
            .tables
            .mutate(|plan| {
                let table = plan
                    .iter_mut()
                    .find(|t| t.order_id.as_deref() == Some(order_id))?;
                match transition {
                    TableTransition::Set(next) => table.status = next,
                    TableTransition::Release => {
                        table.status = TableStatus::Available;
                        table.order_id = None;
                    }
                    TableTransition::Unchanged => {}
                }
                Some(table.id.clone())
            })
            .await?;

        match table_id {
            Some(table_id) => {
                info!(
                    "Table {} reconciled for order {} ({}): {:?}",
                    table_id, order_id, status, transition
                );
                Ok(true)
            }
            None => {
                debug!("No table holds order {}", order_id);
                Ok(false)
            }
        }
    }

    /// Seats a new dine-in order at the table it names. Returns `false` when
    /// the order is not dine-in or names no known table.
    pub async fn reconcile_new_order(&self, order: &Order) -> Result<bool, StoreError> {
        if order.order_type != OrderType::DineIn {
            return Ok(false);
        }
        let Some(table_id) = order.table.as_deref() else {
            return Ok(false);
        };
        let assigned = self.tables.assign_order_to_table(table_id, &order.id).await?;
        if assigned.is_none() {
            return Ok(false);
        }
        let transition = map_order_status_to_table_status(&order.status);
        if transition != TableTransition::Set(TableStatus::Occupied) {
            self.update_table_for_order_status(&order.id, &order.status)
                .await?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::order;
    use rstest::rstest;

    fn setup() -> (Arc<TableRegistry>, Reconciler) {
        let tables = Arc::new(TableRegistry::new(Arc::new(MemoryStore::new())));
        let reconciler = Reconciler::new(tables.clone());
        (tables, reconciler)
    }

    #[rstest]
    #[case("pending", TableTransition::Set(TableStatus::Occupied))]
    #[case("confirmed", TableTransition::Unchanged)]
    #[case("approved", TableTransition::Unchanged)]
    #[case("preparing", TableTransition::Set(TableStatus::Preparing))]
    #[case("ready", TableTransition::Set(TableStatus::Ready))]
    #[case("served", TableTransition::Set(TableStatus::Occupied))]
    #[case("delivered", TableTransition::Set(TableStatus::Occupied))]
    #[case("completed", TableTransition::Release)]
    #[case("cancelled", TableTransition::Release)]
    #[case("refunded", TableTransition::Unchanged)]
    fn order_status_maps_to_table_transition(
        #[case] status: &str,
        #[case] expected: TableTransition,
    ) {
        assert_eq!(map_order_status_to_table_status(&OrderStatus::from(status)), expected);
    }

    #[tokio::test]
    async fn completed_order_frees_its_table() {
        let (tables, reconciler) = setup();
        tables.assign_order_to_table("m1", "order1").await.unwrap();

        let found = reconciler
            .update_table_for_order_status("order1", &OrderStatus::Completed)
            .await
            .unwrap();
        assert!(found);

        let table = tables.get_table("m1").await.unwrap();
        assert_eq!(table.status, TableStatus::Available);
        assert_eq!(table.order_id, None);
    }

    #[tokio::test]
    async fn only_the_referencing_table_is_touched() {
        let (tables, reconciler) = setup();
        tables.assign_order_to_table("m1", "order1").await.unwrap();
        tables.assign_order_to_table("t2", "order2").await.unwrap();

        reconciler
            .update_table_for_order_status("order2", &OrderStatus::Cancelled)
            .await
            .unwrap();

        let m1 = tables.get_table("m1").await.unwrap();
        assert_eq!(m1.status, TableStatus::Occupied);
        assert_eq!(m1.order_id.as_deref(), Some("order1"));
        assert_eq!(tables.get_table("t2").await.unwrap().order_id, None);
    }

    #[tokio::test]
    async fn unreferenced_order_is_a_no_op() {
        let (tables, reconciler) = setup();
        let before = tables.floor_plan().await;
        let found = reconciler
            .update_table_for_order_status("ghost", &OrderStatus::Completed)
            .await
            .unwrap();
        assert!(!found);
        assert_eq!(tables.floor_plan().await, before);
    }

    #[tokio::test]
    async fn unknown_status_leaves_table_unchanged() {
        let (tables, reconciler) = setup();
        tables.assign_order_to_table("m4", "order4").await.unwrap();
        let found = reconciler
            .update_table_for_order_status("order4", &OrderStatus::from("on-hold"))
            .await
            .unwrap();
        assert!(found);
        let table = tables.get_table("m4").await.unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
        assert_eq!(table.order_id.as_deref(), Some("order4"));
    }

    #[tokio::test]
    async fn kitchen_progression_is_reflected_on_table() {
        let (tables, reconciler) = setup();
        tables.assign_order_to_table("t5", "order5").await.unwrap();

        for (status, expected) in [
            (OrderStatus::Preparing, TableStatus::Preparing),
            (OrderStatus::Ready, TableStatus::Ready),
            (OrderStatus::Served, TableStatus::Occupied),
        ] {
            reconciler
                .update_table_for_order_status("order5", &status)
                .await
                .unwrap();
            assert_eq!(tables.get_table("t5").await.unwrap().status, expected);
        }
    }

    #[tokio::test]
    async fn new_dine_in_order_is_seated() {
        let (tables, reconciler) = setup();
        let mut placed = order("order7", "pending", vec![]);
        placed.table = Some("m6".to_string());

        assert!(reconciler.reconcile_new_order(&placed).await.unwrap());
        let table = tables.find_table_by_order("order7").await.unwrap();
        assert_eq!(table.id, "m6");
        assert_eq!(table.status, TableStatus::Occupied);
    }

    #[tokio::test]
    async fn takeaway_and_unknown_tables_are_not_seated() {
        let (tables, reconciler) = setup();
        let mut takeaway = order("order8", "pending", vec![]);
        takeaway.order_type = OrderType::Takeaway;
        takeaway.table = Some("m1".to_string());
        assert!(!reconciler.reconcile_new_order(&takeaway).await.unwrap());

        let mut lost = order("order9", "pending", vec![]);
        lost.table = Some("rooftop".to_string());
        assert!(!reconciler.reconcile_new_order(&lost).await.unwrap());

        assert_eq!(tables.table_summary().await.occupied, 0);
    }

    #[tokio::test]
    async fn later_order_takes_over_a_shared_table() {
        let (tables, reconciler) = setup();
        for id in ["order1", "order2"] {
            let mut placed = order(id, "pending", vec![]);
            placed.table = Some("m2".to_string());
            assert!(reconciler.reconcile_new_order(&placed).await.unwrap());
        }

        let found = reconciler
            .update_table_for_order_status("order1", &OrderStatus::Completed)
            .await
            .unwrap();
        assert!(!found);
        let table = tables.get_table("m2").await.unwrap();
        assert_eq!(table.order_id.as_deref(), Some("order2"));
        assert_eq!(table.status, TableStatus::Occupied);
    }
}
