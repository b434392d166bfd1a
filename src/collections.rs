//! CRUD over the collections of the JSON document.
//!
//! Every operation loads the full document, mutates it and saves it back.
//! A single async mutex serializes those cycles so concurrent requests
//! cannot overwrite each other's changes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{item_id, DefaultCollection, Document, Item, CREATED_AT_FIELD, ID_FIELD};
use crate::store::JsonStore;

/// Errors returned by collection operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Collection '{0}' does not exist")]
    UnknownCollection(String),
    #[error("Item '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },
    #[error("Failed to save data")]
    SaveFailed,
}

/// Millisecond-based id source.
///
/// Ids are the current Unix time in milliseconds, bumped past the last
/// issued id so that two creates in the same millisecond stay distinct.
#[derive(Debug, Default)]
struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    fn next(&mut self, now_millis: i64) -> String {
        let id = now_millis.max(self.last + 1);
        self.last = id;
        id.to_string()
    }
}

/// Formats a timestamp the way `createdAt` is stored.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Lowercases and trims the `name` of pantry items.
fn normalize(collection: &str, item: &mut Item) {
    if collection.parse::<DefaultCollection>() != Ok(DefaultCollection::Pantry) {
        return;
    }
    if let Some(Value::String(name)) = item.get_mut("name") {
        *name = name.trim().to_lowercase();
    }
}

/// Collection operations over a [`JsonStore`].
#[derive(Debug)]
pub struct CollectionService {
    store: JsonStore,
    /// Held for every load/mutate/save cycle; also owns the id source.
    writer: Mutex<IdGenerator>,
}

impl CollectionService {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            writer: Mutex::new(IdGenerator::default()),
        }
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Returns the items of a collection, or an empty list if it doesn't exist.
    pub async fn list(&self, collection: &str) -> Vec<Item> {
        let _guard = self.writer.lock().await;
        self.store
            .load()
            .collection(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Appends a new item and returns its id.
    ///
    /// `createdAt` is stamped if absent; `id` is always assigned here.
    /// Unknown collections are created.
    pub async fn create(&self, collection: &str, mut item: Item) -> Result<String, CollectionError> {
        let mut ids = self.writer.lock().await;

        let now = Utc::now();
        item.entry(CREATED_AT_FIELD)
            .or_insert_with(|| Value::String(timestamp(now)));
        let id = ids.next(now.timestamp_millis());
        item.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        normalize(collection, &mut item);

        let mut document = self.store.load();
        document.collection_or_create(collection).push(item);
        self.persist(&document)?;

        tracing::debug!("Created item {} in {}", id, collection);
        Ok(id)
    }

    /// Merges `patch` into the item with the given id.
    ///
    /// `createdAt` in the patch is ignored and `id` cannot be changed.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        mut patch: Item,
    ) -> Result<(), CollectionError> {
        let _guard = self.writer.lock().await;

        let mut document = self.store.load();
        let items = document
            .collection_mut(collection)
            .ok_or_else(|| CollectionError::UnknownCollection(collection.to_string()))?;
        let item = items
            .iter_mut()
            .find(|item| item_id(item) == Some(id))
            .ok_or_else(|| CollectionError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        patch.remove(CREATED_AT_FIELD);
        normalize(collection, &mut patch);
        item.extend(patch);
        item.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        self.persist(&document)?;

        tracing::debug!("Updated item {} in {}", id, collection);
        Ok(())
    }

    /// Removes the item with the given id.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), CollectionError> {
        let _guard = self.writer.lock().await;

        let not_found = || CollectionError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };

        let mut document = self.store.load();
        let items = document.collection_mut(collection).ok_or_else(not_found)?;
        let before = items.len();
        items.retain(|item| item_id(item) != Some(id));
        if items.len() == before {
            return Err(not_found());
        }

        self.persist(&document)?;

        tracing::debug!("Deleted item {} from {}", id, collection);
        Ok(())
    }

    fn persist(&self, document: &Document) -> Result<(), CollectionError> {
        if self.store.save(document) {
            Ok(())
        } else {
            Err(CollectionError::SaveFailed)
        }
    }
}
