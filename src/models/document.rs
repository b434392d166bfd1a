use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::collection::DefaultCollection;

/// A schema-less record inside a collection.
///
/// `id` and `createdAt` are reserved and managed by the server.
pub type Item = Map<String, Value>;

/// Reserved item field holding the server-assigned id.
pub const ID_FIELD: &str = "id";
/// Reserved item field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Returns the id of an item, if it has a string id.
pub fn item_id(item: &Item) -> Option<&str> {
    item.get(ID_FIELD).and_then(Value::as_str)
}

/// The whole persisted state: collection name -> ordered items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    collections: BTreeMap<String, Vec<Item>>,
}

impl Document {
    /// Creates a document holding the four default collections, all empty.
    pub fn new() -> Self {
        let mut document = Self::default();
        document.ensure_defaults();
        document
    }

    /// Builds a document from arbitrary JSON.
    ///
    /// Returns `None` if the top level is not an object. Entries that are not
    /// arrays, and array elements that are not objects, are dropped.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };

        let mut collections = BTreeMap::new();
        for (name, entry) in map {
            let Value::Array(values) = entry else {
                tracing::warn!("Dropping collection '{}': not an array", name);
                continue;
            };
            let total = values.len();
            let items: Vec<Item> = values
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(item) => Some(item),
                    _ => None,
                })
                .collect();
            if items.len() < total {
                tracing::warn!(
                    "Dropped {} non-object item(s) from collection '{}'",
                    total - items.len(),
                    name
                );
            }
            collections.insert(name, items);
        }

        Some(Self { collections })
    }

    /// Inserts an empty sequence for every missing default collection.
    pub fn ensure_defaults(&mut self) {
        for collection in DefaultCollection::ALL {
            self.collections
                .entry(collection.as_str().to_string())
                .or_default();
        }
    }

    pub fn collection(&self, name: &str) -> Option<&Vec<Item>> {
        self.collections.get(name)
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Vec<Item>> {
        self.collections.get_mut(name)
    }

    /// Returns the named collection, creating it if needed.
    pub fn collection_or_create(&mut self, name: &str) -> &mut Vec<Item> {
        self.collections.entry(name.to_string()).or_default()
    }

    /// Total number of items across all collections.
    pub fn item_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}
