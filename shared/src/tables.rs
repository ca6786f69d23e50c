use crate::models::{FloorPlan, Location, Table, TableStatus};
use crate::store::{self, DocumentStore, StoreError, TABLES_KEY};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

const MAIN_FLOOR: [(&str, &str, u32, &str); 7] = [
    ("m1", "Table 1", 2, "Window"),
    ("m2", "Table 2", 2, "Window"),
    ("m3", "Table 3", 4, "Center"),
    ("m4", "Table 4", 4, "Center"),
    ("m5", "Table 5", 6, "Center"),
    ("m6", "Table 6", 4, "Corner"),
    ("m7", "Table 7", 8, "Family"),
];

const TOP_FLOOR: [(&str, &str, u32, &str); 8] = [
    ("t1", "Table 8", 2, "Balcony"),
    ("t2", "Table 9", 2, "Balcony"),
    ("t3", "Table 10", 4, "Balcony"),
    ("t4", "Table 11", 4, "Terrace"),
    ("t5", "Table 12", 4, "Terrace"),
    ("t6", "Table 13", 6, "Terrace"),
    ("t7", "Table 14", 6, "Private"),
    ("t8", "Table 15", 10, "Private"),
];

fn seed(floor: &[(&str, &str, u32, &str)], location: Location) -> Vec<Table> {
    floor
        .iter()
        .map(|&(id, name, capacity, section)| Table {
            id: id.to_string(),
            name: name.to_string(),
            capacity,
            status: TableStatus::Available,
            order_id: None,
            location,
            section: section.to_string(),
        })
        .collect()
}

pub fn default_floor_plan() -> FloorPlan {
    FloorPlan {
        main_floor: seed(&MAIN_FLOOR, Location::MainFloor),
        top_floor: seed(&TOP_FLOOR, Location::TopFloor),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub preparing: usize,
    pub ready: usize,
}

/// Table occupancy persisted as a single document. Every mutation reloads the
/// whole floor plan, applies the change and writes it back while holding
/// `write_lock`.
pub struct TableRegistry {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl TableRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn floor_plan(&self) -> FloorPlan {
        store::load(self.store.as_ref(), TABLES_KEY)
            .await
            .unwrap_or_else(default_floor_plan)
    }

    pub async fn get_all_tables(&self) -> Vec<Table> {
        self.floor_plan().await.iter().cloned().collect()
    }

    pub async fn get_table(&self, table_id: &str) -> Option<Table> {
        self.floor_plan().await.find(table_id).cloned()
    }

    pub async fn find_table_by_order(&self, order_id: &str) -> Option<Table> {
        self.floor_plan()
            .await
            .iter()
            .find(|t| t.order_id.as_deref() == Some(order_id))
            .cloned()
    }

    pub async fn available_tables(&self, min_capacity: u32) -> Vec<Table> {
        self.floor_plan()
            .await
            .iter()
            .filter(|t| t.status == TableStatus::Available && t.capacity >= min_capacity)
            .cloned()
            .collect()
    }

    pub async fn table_summary(&self) -> TableSummary {
        let plan = self.floor_plan().await;
        plan.iter().fold(TableSummary::default(), |mut summary, table| {
            summary.total += 1;
            match table.status {
                TableStatus::Available => summary.available += 1,
                TableStatus::Occupied => summary.occupied += 1,
                TableStatus::Reserved => summary.reserved += 1,
                TableStatus::Preparing => summary.preparing += 1,
                TableStatus::Ready => summary.ready += 1,
            }
            summary
        })
    }

    /// Sets `status` on a table. Any status may follow any other. Setting
    /// `available` always drops the order reference; otherwise `order_id`
    /// replaces it when given and the current one is kept when not.
    pub async fn update_table_status(
        &self,
        table_id: &str,
        status: TableStatus,
        order_id: Option<String>,
    ) -> Result<Option<Table>, StoreError> {
        self.mutate(|plan| {
            let table = plan.find_mut(table_id)?;
            table.status = status;
            if status == TableStatus::Available {
                table.order_id = None;
            } else if order_id.is_some() {
                table.order_id = order_id;
            }
            Some(table.clone())
        })
        .await
    }

    /// Seats `order_id` at the table, replacing any order it already held.
    pub async fn assign_order_to_table(
        &self,
        table_id: &str,
        order_id: &str,
    ) -> Result<Option<Table>, StoreError> {
        let assigned = self
            .mutate(|plan| {
                let table = plan.find_mut(table_id)?;
                let previous = table.order_id.replace(order_id.to_string());
                table.status = TableStatus::Occupied;
                Some((table.clone(), previous))
            })
            .await?;
        let Some((table, previous)) = assigned else {
            return Ok(None);
        };
        match previous {
            Some(previous) if previous != order_id => warn!(
                "Table {} reassigned from order {} to order {}",
                table_id, previous, order_id
            ),
            _ => info!("Assigned order {} to table {}", order_id, table_id),
        }
        Ok(Some(table))
    }

    pub async fn free_table(&self, table_id: &str) -> Result<Option<Table>, StoreError> {
        self.update_table_status(table_id, TableStatus::Available, None)
            .await
    }

    pub async fn reset_all_tables(&self) -> Result<Vec<Table>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let plan = default_floor_plan();
        store::save(self.store.as_ref(), TABLES_KEY, &plan).await?;
        info!("Reset all tables to the default floor plan");
        Ok(plan.iter().cloned().collect())
    }

    /// Applies `f` to the current floor plan and persists the result if it
    /// changed.
    pub(crate) async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut FloorPlan) -> R,
    ) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = store::load_for_update(self.store.as_ref(), TABLES_KEY)
            .await?
            .unwrap_or_else(default_floor_plan);
        let mut plan = before.clone();
        let result = f(&mut plan);
        if plan != before {
            store::save(self.store.as_ref(), TABLES_KEY, &plan).await?;
        }
        Ok(result)
    }
}
