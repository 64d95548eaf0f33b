//! Repository layer for document-store operations

pub mod books;
pub mod loans;
pub mod members;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    store::{Document, DocumentStore, StoreError},
};

/// Main repository struct fanning out to the per-collection repositories
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository over the given store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            books: books::BooksRepository::new(store.clone()),
            members: members::MembersRepository::new(store.clone()),
            loans: loans::LoansRepository::new(store),
        }
    }
}

/// Decode a batch of documents into typed records
pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> AppResult<Vec<T>> {
    docs.into_iter()
        .map(|doc| doc.decode().map_err(AppError::from))
        .collect()
}

/// Log a store failure at its origin and convert it; errors are re-thrown,
/// never retried
pub(crate) fn store_failure(op: &'static str) -> impl Fn(StoreError) -> AppError {
    move |e| {
        tracing::error!("{}: {}", op, e);
        AppError::Store(e)
    }
}
