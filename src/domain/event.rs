//! Domain event publishing.

use async_trait::async_trait;

use crate::domain::DomainError;

/// Marker for events raised by aggregates.
pub trait DomainEvent: Send + Sync + 'static {}

/// Publishes one kind of domain event, typically onto a messaging topic.
#[async_trait]
pub trait DomainEventPublisher<T: DomainEvent>: Send + Sync {
    async fn publish(&self, event: T) -> Result<(), DomainError>;
}
