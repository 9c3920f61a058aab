//! Domain event publishing.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::events::DomainEvent;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("nats publish failed: {0}")]
    Nats(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError>;
}

/// Publishes JSON-encoded events on their NATS subjects.
#[derive(Debug, Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self { Self { client } }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(event.subject().to_string(), payload.into())
            .await
            .map_err(|e| PublishError::Nats(e.to_string()))
    }
}

/// Used when no broker is configured.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        tracing::info!(subject = event.subject(), ?event, "domain event");
        Ok(())
    }
}

/// Publishes each event in order. Failures are logged; a lost event never fails the
/// request that raised it.
pub async fn emit(publisher: &dyn EventPublisher, events: impl IntoIterator<Item = DomainEvent>) {
    for event in events {
        if let Err(error) = publisher.publish(&event).await {
            tracing::warn!(subject = event.subject(), %error, "failed to publish domain event");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::recording::RecordingPublisher;
    use super::*;
    use crate::domain::events::OrderEvent;
    use uuid::Uuid;

    struct Failing;

    #[async_trait]
    impl EventPublisher for Failing {
        async fn publish(&self, _event: &DomainEvent) -> Result<(), PublishError> {
            Err(PublishError::Nats("connection closed".into()))
        }
    }

    fn paid() -> DomainEvent {
        DomainEvent::Order(OrderEvent::Paid { order_id: Uuid::nil(), payment_id: "pi_1".into() })
    }

    #[tokio::test]
    async fn emit_publishes_in_order() {
        let recorder = RecordingPublisher::default();
        emit(&recorder, [paid(), paid()]).await;
        assert_eq!(recorder.events().await.len(), 2);
    }

    #[tokio::test]
    async fn emit_swallows_publish_failures() {
        emit(&Failing, [paid()]).await;
        assert!(LogPublisher.publish(&paid()).await.is_ok());
    }
}
