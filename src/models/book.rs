//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Book record from the `libros` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autor")]
    pub author: String,
    /// Derived flag: false iff an active loan references this book
    #[serde(rename = "disponible")]
    pub available: bool,
    #[serde(rename = "fechaCreacion")]
    pub created_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

/// Partial update for a book; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
}
