use crate::models::Order;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

const TOP_SELLING_LIMIT: usize = 10;
const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StatsScope {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl StatsScope {
    pub fn contains(&self, order: &Order) -> bool {
        let year_matches = self.year.map_or(true, |y| order.timestamp.year() == y);
        let month_matches = self.month.map_or(true, |m| order.timestamp.month() == m);
        year_matches && month_matches
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTally {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub total_revenue: f64,
    pub average_order_value: f64,
    pub cancel_rate: f64,
    pub top_selling_items: Vec<ItemTally>,
    pub revenue_by_category: Vec<CategoryRevenue>,
}

/// Revenue figures over the completed orders in `scope`. Line items are the
/// only source of amounts; stored order totals are ignored.
pub fn order_stats(orders: &[Order], scope: StatsScope) -> OrderStats {
    let in_scope: Vec<&Order> = orders.iter().filter(|o| scope.contains(o)).collect();
    let completed: Vec<&Order> = in_scope.iter().copied().filter(|o| o.is_completed()).collect();

    for order in &completed {
        if let Some(drift) = order.total_drift() {
            warn!(
                "Order {} stored total {:.2} differs from its items by {:.2}",
                order.id, order.total, drift
            );
        }
    }

    let mut tally: HashMap<&str, ItemTally> = HashMap::new();
    for item in completed.iter().flat_map(|o| o.items.iter()) {
        let entry = tally.entry(item.id.as_str()).or_insert_with(|| ItemTally {
            id: item.id.clone(),
            name: item.name.clone(),
            category: item.category.clone().unwrap_or_else(|| UNCATEGORIZED.to_string()),
            quantity: 0,
            revenue: 0.0,
        });
        entry.quantity += u64::from(item.quantity);
        entry.revenue += item.line_total();
    }

    let mut items: Vec<ItemTally> = tally.into_values().collect();
    items.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.id.cmp(&b.id)));

    let mut by_category: HashMap<&str, f64> = HashMap::new();
    for item in &items {
        *by_category.entry(item.category.as_str()).or_default() += item.revenue;
    }
    let mut revenue_by_category: Vec<CategoryRevenue> = by_category
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue {
            category: category.to_string(),
            revenue,
        })
        .collect();
    revenue_by_category.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.category.cmp(&b.category))
    });

    let total_revenue: f64 = completed.iter().map(|o| o.items_total()).sum();
    let average_order_value = if completed.is_empty() {
        0.0
    } else {
        total_revenue / completed.len() as f64
    };
    let cancel_rate = if in_scope.is_empty() {
        0.0
    } else {
        (in_scope.len() - completed.len()) as f64 / in_scope.len() as f64 * 100.0
    };

    items.truncate(TOP_SELLING_LIMIT);

    OrderStats {
        total_orders: completed.len(),
        total_revenue,
        average_order_value,
        cancel_rate,
        top_selling_items: items,
        revenue_by_category,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBucket {
    pub total_revenue: f64,
    pub order_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRevenue {
    pub name: String,
    pub total_quantity: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RevenueReport {
    /// Keyed by `YYYY-MM-DD`.
    pub daily: BTreeMap<String, RevenueBucket>,
    /// Keyed by `YYYY-MM`.
    pub monthly: BTreeMap<String, RevenueBucket>,
    pub items: BTreeMap<String, ItemRevenue>,
}

/// Daily, monthly and per-item revenue rebuilt from the completed orders.
pub fn revenue_report(orders: &[Order]) -> RevenueReport {
    let mut report = RevenueReport::default();

    for order in orders.iter().filter(|o| o.is_completed()) {
        let revenue = order.items_total();
        let day = order.timestamp.format("%Y-%m-%d").to_string();
        let month = order.timestamp.format("%Y-%m").to_string();

        for key in [report.daily.entry(day), report.monthly.entry(month)] {
            let bucket = key.or_default();
            bucket.total_revenue += revenue;
            bucket.order_count += 1;
        }

        for item in &order.items {
            let entry = report.items.entry(item.id.clone()).or_default();
            if entry.name.is_empty() {
                entry.name = item.name.clone();
            }
            entry.total_quantity += u64::from(item.quantity);
            entry.total_revenue += item.line_total();
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, order};
    use chrono::{TimeZone, Utc};

    #[test]
    fn repeated_item_is_tallied_across_orders() {
        let orders = vec![
            order("a", "completed", vec![item("1", "Wazwan", 100.0, 2, Some("food"))]),
            order("b", "completed", vec![item("1", "Wazwan", 100.0, 1, Some("food"))]),
        ];

        let stats = order_stats(&orders, StatsScope::default());

        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_revenue, 300.0);
        assert_eq!(stats.average_order_value, 150.0);
        assert_eq!(stats.cancel_rate, 0.0);
        let top = &stats.top_selling_items[0];
        assert_eq!((top.id.as_str(), top.quantity, top.revenue), ("1", 3, 300.0));
        assert_eq!(
            stats.revenue_by_category,
            vec![CategoryRevenue {
                category: "food".to_string(),
                revenue: 300.0
            }]
        );
    }

    #[test]
    fn revenue_comes_from_items_not_stored_total() {
        let mut drifted = order("a", "completed", vec![item("1", "Kahwa", 40.0, 3, None)]);
        drifted.total = 999.0;

        let stats = order_stats(&[drifted], StatsScope::default());
        assert_eq!(stats.total_revenue, 120.0);
        assert_eq!(stats.revenue_by_category[0].category, UNCATEGORIZED);
    }

    #[test]
    fn only_completed_orders_count_towards_revenue() {
        let orders = vec![
            order("a", "completed", vec![item("1", "Tea", 20.0, 1, Some("drinks"))]),
            order("b", "cancelled", vec![item("2", "Kebab", 300.0, 1, Some("food"))]),
            order("c", "pending", vec![item("2", "Kebab", 300.0, 1, Some("food"))]),
            order("d", "completed", vec![item("3", "Naan", 30.0, 2, Some("food"))]),
        ];

        let stats = order_stats(&orders, StatsScope::default());
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_revenue, 80.0);
        assert_eq!(stats.cancel_rate, 50.0);
        assert!(stats.top_selling_items.iter().all(|i| i.id != "2"));
        assert_eq!(stats.revenue_by_category[0].category, "food");
    }

    #[test]
    fn empty_scope_has_no_cancel_rate() {
        let stats = order_stats(&[], StatsScope::default());
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.cancel_rate, 0.0);
        assert_eq!(stats.average_order_value, 0.0);
    }

    #[test]
    fn cancel_rate_stays_within_bounds() {
        let all_cancelled = vec![
            order("a", "cancelled", vec![]),
            order("b", "cancelled", vec![]),
        ];
        assert_eq!(order_stats(&all_cancelled, StatsScope::default()).cancel_rate, 100.0);
    }

    #[test]
    fn scope_filters_by_month_and_year() {
        let mut february = order("feb", "completed", vec![item("1", "Tea", 10.0, 1, None)]);
        february.timestamp = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();
        let mut last_year = order("old", "completed", vec![item("1", "Tea", 10.0, 5, None)]);
        last_year.timestamp = Utc.with_ymd_and_hms(2023, 3, 10, 9, 0, 0).unwrap();
        let march = order("mar", "completed", vec![item("1", "Tea", 10.0, 2, None)]);
        let orders = vec![february, last_year, march];

        let scope = StatsScope {
            month: Some(3),
            year: Some(2024),
        };
        assert_eq!(order_stats(&orders, scope).total_revenue, 20.0);

        let whole_year = StatsScope {
            month: None,
            year: Some(2024),
        };
        assert_eq!(order_stats(&orders, whole_year).total_revenue, 30.0);
    }

    #[test]
    fn top_selling_is_capped_and_sorted_by_revenue() {
        let items = (1..=12)
            .map(|n| item(&n.to_string(), "Dish", f64::from(n), 1, Some("food")))
            .collect();
        let stats = order_stats(&[order("a", "completed", items)], StatsScope::default());

        assert_eq!(stats.top_selling_items.len(), 10);
        assert_eq!(stats.top_selling_items[0].id, "12");
        assert_eq!(stats.top_selling_items[9].id, "3");
        assert_eq!(stats.revenue_by_category[0].revenue, 78.0);
    }

    #[test]
    fn revenue_report_buckets_by_day_month_and_item() {
        let mut earlier = order("a", "completed", vec![item("1", "Tea", 10.0, 2, None)]);
        earlier.timestamp = Utc.with_ymd_and_hms(2024, 3, 14, 18, 0, 0).unwrap();
        let orders = vec![
            earlier,
            order("b", "completed", vec![item("1", "Tea", 10.0, 1, None)]),
            order("c", "cancelled", vec![item("2", "Kebab", 300.0, 1, None)]),
        ];

        let report = revenue_report(&orders);

        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily["2024-03-15"].total_revenue, 10.0);
        assert_eq!(
            report.monthly["2024-03"],
            RevenueBucket {
                total_revenue: 30.0,
                order_count: 2
            }
        );
        assert_eq!(report.items["1"].total_quantity, 3);
        assert!(!report.items.contains_key("2"));
    }
}
