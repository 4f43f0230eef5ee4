//! Identifiers.
//!
//! `Identifier<K>` holds the key; each domain identifier wraps one rather
//! than extending a shared base.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An equatable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier<K> {
    value: K,
}

impl<K: Eq> Identifier<K> {
    pub fn new(value: K) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &K {
        &self.value
    }

    pub fn set_value(&mut self, value: K) {
        self.value = value;
    }

    pub fn into_inner(self) -> K {
        self.value
    }
}

impl<K: fmt::Display> fmt::Display for Identifier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Identifier<Uuid>);

        impl $name {
            /// A fresh random identifier.
            pub fn new() -> Self {
                Self(Identifier::new(Uuid::new_v4()))
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(Identifier::new(id))
            }

            pub fn value(&self) -> Uuid {
                *self.0.value()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self::from_uuid(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_identifier!(OrderId);
uuid_identifier!(CustomerId);
uuid_identifier!(ProductId);
uuid_identifier!(RestaurantId);
