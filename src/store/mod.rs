//! Document-store access layer
//!
//! The backing database is an external collaborator reached through the
//! [`DocumentStore`] trait: whole-collection fetch, equality/null filters,
//! single-document get/update/delete, and append-insert returning a
//! generated identifier. [`MemoryStore`] implements the trait for
//! embedding and tests; a remote client plugs in the same way.

pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;

/// Collection holding book documents
pub const LIBROS: &str = "libros";
/// Collection holding member documents
pub const USUARIOS: &str = "usuarios";
/// Collection holding loan documents
pub const PRESTAMOS: &str = "prestamos";

/// Errors reported by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("no document with id {id} in collection {collection}")]
    MissingDocument { collection: String, id: String },

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A stored document: generated identifier plus JSON payload
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Merge the identifier into the payload under `"id"` and decode it
    /// into a typed record
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let mut data = self.data;
        if let Value::Object(ref mut map) = data {
            map.insert("id".to_string(), Value::String(self.id));
        }
        Ok(serde_json::from_value(data)?)
    }
}

/// Field predicates understood by [`DocumentStore::find`]
#[derive(Debug, Clone)]
pub enum Filter {
    /// Field equals the given value
    Eq(&'static str, Value),
    /// Field is null or absent
    IsNull(&'static str),
    /// Field is present and not null
    NotNull(&'static str),
}

/// Contract offered by the document database client
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every document in a collection
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Fetch the documents matching all of the given filters
    async fn find(&self, collection: &str, filters: &[Filter])
        -> Result<Vec<Document>, StoreError>;

    /// Fetch a single document by identifier
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Append a document and return its generated identifier
    async fn insert(&self, collection: &str, data: Value) -> Result<String, StoreError>;

    /// Merge the given fields into an existing document
    async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<(), StoreError>;

    /// Delete a document by identifier
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
