//! Named service registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An opaque registered service.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Mapping from service name to instance. Keys are unique; the last
/// registration under a name wins.
///
/// The registry itself is not synchronized; the container guards it.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceInstance>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `instance` under `name`, returning any instance it replaced.
    pub fn insert(&mut self, name: String, instance: ServiceInstance) -> Option<ServiceInstance> {
        self.services.insert(name, instance)
    }

    pub fn get(&self, name: &str) -> Option<ServiceInstance> {
        self.services.get(name).cloned()
    }

    /// Look up `name` and downcast to `T`. A type mismatch reads as absent.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name)?.downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.services.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct OrderRepository(&'static str);

    #[test]
    fn last_write_wins() {
        let mut registry = ServiceRegistry::new();
        assert!(registry
            .insert("orders".into(), Arc::new(OrderRepository("first")))
            .is_none());
        assert!(registry
            .insert("orders".into(), Arc::new(OrderRepository("second")))
            .is_some());

        assert_eq!(registry.len(), 1);
        let repo = registry.get_as::<OrderRepository>("orders").unwrap();
        assert_eq!(*repo, OrderRepository("second"));
    }

    #[test]
    fn type_mismatch_reads_as_absent() {
        let mut registry = ServiceRegistry::new();
        registry.insert("orders".into(), Arc::new(OrderRepository("only")));

        assert!(registry.contains("orders"));
        assert!(registry.get_as::<String>("orders").is_none());
        assert!(registry.get("payments").is_none());
    }
}
