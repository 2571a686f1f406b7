use busline_shared::models::events::{
    BookingCancelledEvent, BookingConfirmedEvent, BOOKING_CANCELLED_TOPIC, BOOKING_CONFIRMED_TOPIC,
};
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Publishes booking lifecycle events after the corresponding commit.
///
/// Records are keyed by trip so every event for one trip lands on the same partition, in commit order.
#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn booking_confirmed(&self, event: &BookingConfirmedEvent) -> Result<(), KafkaError> {
        self.send_json(BOOKING_CONFIRMED_TOPIC, &event.trip_id.to_string(), event).await
    }

    pub async fn booking_cancelled(&self, event: &BookingCancelledEvent) -> Result<(), KafkaError> {
        self.send_json(BOOKING_CANCELLED_TOPIC, &event.trip_id.to_string(), event).await
    }

    async fn send_json<T: Serialize>(&self, topic: &str, key: &str, event: &T) -> Result<(), KafkaError> {
        let payload = match serde_json::to_vec(event) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Dropping {} event for {}: {}", topic, key, e);
                return Ok(());
            }
        };

        let record = FutureRecord::to(topic).key(key).payload(&payload);
        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                debug!("Published {} for trip {} (partition {}, offset {})", topic, key, delivery.partition, delivery.offset);
                Ok(())
            }
            Err((e, _msg)) => Err(e),
        }
    }
}
