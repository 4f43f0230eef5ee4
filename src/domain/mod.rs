//! Domain building blocks shared by the services.

pub mod entity;
pub mod event;
pub mod identifier;
pub mod money;
pub mod status;

use thiserror::Error;

pub use entity::{AggregateRoot, Entity};
pub use event::{DomainEvent, DomainEventPublisher};
pub use identifier::{CustomerId, Identifier, OrderId, ProductId, RestaurantId};
pub use money::Money;
pub use status::{OrderApprovalStatus, OrderStatus, PaymentStatus};

/// A broken business rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DomainError {
    message: String,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
