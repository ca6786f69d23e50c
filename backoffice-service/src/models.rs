use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::*;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct DbOrder {
    pub order_id: String,
    pub placed_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub order_type: String,
    pub table_number: Option<String>,
    pub delivery_address: Option<String>,
    pub payment_method: String,
    pub status: String,
    pub items: serde_json::Value,
    pub is_paid: bool,
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::documents, primary_key(key))]
pub struct DbDocument {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Order> for DbOrder {
    type Error = anyhow::Error;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: order.id.clone(),
            placed_at: order.timestamp,
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            order_type: order.order_type.as_str().to_string(),
            table_number: order.table.clone(),
            delivery_address: order.delivery_address.clone(),
            payment_method: order.payment_method.clone(),
            status: order.status.to_string(),
            items: serde_json::to_value(&order.items)?,
            is_paid: order.payment_status.is_paid(),
        })
    }
}

impl TryFrom<DbOrder> for Order {
    type Error = anyhow::Error;

    fn try_from(row: DbOrder) -> Result<Self, Self::Error> {
        let items: Vec<OrderItem> = serde_json::from_value(row.items)?;
        let order_type = OrderType::parse(&row.order_type).unwrap_or_else(|| {
            tracing::warn!(
                "Order {} has unknown order type {:?}, treating as dine-in",
                row.order_id,
                row.order_type
            );
            OrderType::DineIn
        });

        let mut order = Self {
            id: row.order_id,
            items,
            status: OrderStatus::from(row.status),
            total: 0.0,
            payment_status: PaymentStatus::from_paid(row.is_paid),
            payment_method: row.payment_method,
            table: row.table_number,
            timestamp: row.placed_at,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            order_type,
            delivery_address: row.delivery_address,
        };
        // The table keeps no total column.
        order.total = order.items_total();
        Ok(order)
    }
}
