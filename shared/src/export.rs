use crate::models::Order;

pub const CSV_HEADER: &str = "Order ID,Date,Total,Items,Status,Payment Method";

pub fn format_currency(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Line breaks become spaces so every order stays on one line.
fn single_line(value: &str) -> String {
    value.replace(&['\r', '\n'][..], " ")
}

fn needs_quoting(field: &str) -> bool {
    field.contains(&[',', '"'][..])
}

fn field(value: &str) -> String {
    let value = single_line(value);
    if needs_quoting(&value) {
        quote(&value)
    } else {
        value
    }
}

/// One header line plus one line per order, joined with `\n`.
pub fn orders_to_csv(orders: &[Order]) -> String {
    let mut lines = Vec::with_capacity(orders.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for order in orders {
        let items = order
            .items
            .iter()
            .map(|i| format!("{} x {}", i.quantity, single_line(&i.name)))
            .collect::<Vec<_>>()
            .join("; ");

        lines.push(
            [
                field(&order.id),
                order.timestamp.format("%Y-%m-%d").to_string(),
                format_currency(order.items_total()),
                quote(&items),
                field(order.status.as_str()),
                field(&order.payment_method),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}
