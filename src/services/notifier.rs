//! Order event publishing.

use async_trait::async_trait;

use crate::domain::events::OrderEvent;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &OrderEvent) -> anyhow::Result<()>;
}

/// Used when no broker is configured.
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _event: &OrderEvent) -> anyhow::Result<()> { Ok(()) }
}

/// Publishes JSON events on `orders.<kind>`.
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self { Self { client } }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &OrderEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(event)?;
        self.client.publish(event.subject(), payload.into()).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::sync::Mutex;

    /// Captures published events for assertions.
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub events: Mutex<Vec<OrderEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: &OrderEvent) -> anyhow::Result<()> {
            self.events.lock().await.push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn test_event_subjects_and_payload() {
        use crate::domain::value_objects::OrderId;
        let event = OrderEvent::Deleted { order_id: OrderId::from_sequence(4), restored_items: 2 };
        assert_eq!(event.subject(), "orders.deleted");
        assert_eq!(event.order_id().as_str(), "F00004");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "deleted");
        assert_eq!(json["order_id"], "F00004");
    }
}
