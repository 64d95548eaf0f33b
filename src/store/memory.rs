//! In-memory document store
//!
//! Thread-safe backend for development and tests, standing in for a remote
//! document database. Documents are kept as raw JSON per collection in
//! insertion order; identifiers are generated UUIDs.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Document, DocumentStore, Filter, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<(String, Value)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn field<'a>(data: &'a Value, name: &str) -> Option<&'a Value> {
    data.as_object().and_then(|map| map.get(name))
}

fn matches(data: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(name, value) => field(data, name) == Some(value),
        Filter::IsNull(name) => matches!(field(data, name), None | Some(Value::Null)),
        Filter::NotNull(name) => !matches!(field(data, name), None | Some(Value::Null)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| filters.iter().all(|f| matches(data, f)))
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(id, data)| Document {
                    id: id.clone(),
                    data: data.clone(),
                })
        }))
    }

    async fn insert(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        if !data.is_object() {
            return Err(StoreError::Backend(
                "document payload must be an object".to_string(),
            ));
        }
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), data));
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let (_, data) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
            .ok_or_else(|| StoreError::MissingDocument {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        if let Value::Object(source) = changes {
            if let Value::Object(target) = data {
                for (key, value) in source {
                    target.insert(key, value);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }
}
