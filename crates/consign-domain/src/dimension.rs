//! Lookup tables items and payments are grouped by.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

macro_rules! named_dimension {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
        pub struct $name {
            pub id: Uuid,
            pub name: String,
        }

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    id: Uuid::new_v4(),
                    name: name.into(),
                }
            }
        }

        impl Identifiable for $name {
            fn id(&self) -> Uuid {
                self.id
            }
        }

        impl NamedEntity for $name {
            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

named_dimension!(
    /// Maker label attached to an item.
    Brand
);
named_dimension!(
    /// Product family (bags, watches, jewelry, ...).
    Category
);

/// Consignor who owns an item until it sells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Vendor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            phone: None,
        }
    }
}

/// Buyer paying for items, possibly over several installments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            phone: None,
        }
    }
}

impl Identifiable for Vendor {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Vendor {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Identifiable for Client {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Client {
    fn name(&self) -> &str {
        &self.name
    }
}
