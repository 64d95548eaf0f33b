//! Biblioteca Library Management System
//!
//! A layered library-management core: an application coordinator on top of
//! business-rule services on top of a document-store repository. It manages
//! books, members, and loans against the `libros`, `usuarios`, and
//! `prestamos` collections of a document-oriented data store.
//!
//! The crate exposes no network or CLI surface; a UI layer embeds it by
//! wiring the layers explicitly:
//!
//! ```ignore
//! use std::sync::Arc;
//! use biblioteca::{
//!     app::BibliotecaApp, config::AppConfig, notify::NullNotifier,
//!     repository::Repository, services::Services, store::MemoryStore,
//! };
//!
//! let config = AppConfig::load()?;
//! let repository = Repository::new(Arc::new(MemoryStore::new()));
//! let services = Services::new(repository, config.loans.clone());
//! let app = BibliotecaApp::new(services, Arc::new(NullNotifier));
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod repository;
pub mod services;
pub mod store;

pub use app::BibliotecaApp;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
