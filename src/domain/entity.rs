//! Entity and aggregate root.

use crate::domain::identifier::Identifier;

/// Anything with identity. Two entities are equal when their ids are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity<K> {
    id: Identifier<K>,
}

impl<K: Eq> Entity<K> {
    pub fn new(id: K) -> Self {
        Self {
            id: Identifier::new(id),
        }
    }

    pub fn id(&self) -> &K {
        self.id.value()
    }

    pub fn set_id(&mut self, id: K) {
        self.id.set_value(id);
    }
}

/// Consistency boundary for a cluster of entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRoot<K> {
    entity: Entity<K>,
}

impl<K: Eq> AggregateRoot<K> {
    pub fn new(id: K) -> Self {
        Self {
            entity: Entity::new(id),
        }
    }

    pub fn id(&self) -> &K {
        self.entity.id()
    }

    pub fn set_id(&mut self, id: K) {
        self.entity.set_id(id);
    }

    pub fn entity(&self) -> &Entity<K> {
        &self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderId;

    #[test]
    fn aggregate_identity_is_reassignable() {
        let first = OrderId::new();
        let second = OrderId::new();

        let mut order = AggregateRoot::new(first);
        assert_eq!(*order.id(), first);

        order.set_id(second);
        assert_eq!(*order.id(), second);
        assert_eq!(order.entity(), &Entity::new(second));
    }
}
