//! Member model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Email format probe shared by the member rule table and the storage
/// boundary
pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Member record from the `usuarios` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Stored normalized lowercase; unique across members
    pub email: String,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "fechaRegistro")]
    pub registered_at: DateTime<Utc>,
}

/// Create member request
#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
}

/// Partial update for a member; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}
