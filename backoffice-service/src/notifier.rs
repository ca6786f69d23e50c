use rdkafka::producer::{FutureProducer, FutureRecord};
use shared::{Notifier, Order};
use std::time::Duration;
use tracing::{error, info};

/// Publishes placed orders to a Kafka topic without waiting for the broker.
pub struct KafkaNotifier {
    producer: FutureProducer,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(producer: FutureProducer, topic: String) -> Self {
        Self { producer, topic }
    }
}

impl Notifier for KafkaNotifier {
    fn notify(&self, order: &Order) {
        let json = match serde_json::to_string(order) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize order {} for notification: {}", order.id, e);
                return;
            }
        };
        let producer = self.producer.clone();
        let topic = self.topic.clone();
        let key = order.id.clone();

        tokio::spawn(async move {
            let record = FutureRecord::to(&topic).payload(&json).key(&key);
            match producer.send(record, Duration::from_secs(5)).await {
                Ok(_) => info!("Published order notification {}", key),
                Err((e, _)) => error!("Failed to publish order notification {}: {}", key, e),
            }
        });
    }
}

/// Used when no broker is configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, order: &Order) {
        info!(
            "Order {} placed by {} ({} items)",
            order.id,
            order.customer_name,
            order.items.len()
        );
    }
}
