//! # axum-crud-admin
//!
//! A declarative CRUD administration panel for sales/CRM-style datasets,
//! easily integrable as an Axum layer.
//!
//! ## Features
//!
//! - Declarative table schemas with a closed set of typed field kinds
//! - Generated list pages with per-kind cell formatting and row actions
//! - Generated create/edit/view forms with per-field validation
//! - Foreign-key dropdowns resolved concurrently, degrading softly
//! - Session gate redirecting unauthenticated requests to a login page
//! - Support for SQLite and PostgreSQL backends
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::Router;
//! use axum_crud_admin::{CrudAdminLayer, InMemorySessionStore};
//! use sqlx::SqlitePool;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = SqlitePool::connect("sqlite:crm.db?mode=rwc")
//!         .await
//!         .unwrap();
//!
//!     let sessions = Arc::new(InMemorySessionStore::new("admin@example.com", "geheim"));
//!
//!     let app = Router::new()
//!         .route("/", axum::routing::get(|| async { "Hello, World!" }))
//!         .merge(CrudAdminLayer::sqlite("/admin", pool, sessions).into_router());
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod database;
pub mod layer;
pub mod pages;
pub mod registry;
pub mod render;
pub mod schema;
pub mod session;
pub mod validate;

// Public exports
pub use layer::{AdminState, CrudAdminLayer};
pub use registry::SchemaRegistry;
pub use schema::{FieldDescriptor, FieldKind, Relation, Row, SelectOption, TableSchema};
pub use session::{InMemorySessionStore, SessionContext, SessionStore};
pub use validate::FieldError;

// Re-export database gateways
pub use database::traits::{CrudGateway, RowId};

#[cfg(feature = "sqlite")]
pub use database::sqlite::SqliteGateway;

#[cfg(feature = "postgres")]
pub use database::postgres::PostgresGateway;

// Error type
use thiserror::Error as ThisError;

/// Error taxonomy of the panel.
///
/// No variant is fatal to the process: configuration errors render as an
/// inline page message, validation errors keep the form open, persistence
/// errors surface as a dismissible banner and are never retried
/// automatically.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Unknown table key; fatal to that page only
    #[error("Tabel schema niet gevonden voor: {0}")]
    SchemaNotFound(String),

    /// Inconsistent schema registration (crate misuse)
    #[error("Invalid schema registration: {0}")]
    InvalidSchema(String),

    /// Per-field validation failures; recoverable, blocks submission
    #[error("Validatie mislukt")]
    Validation(Vec<validate::FieldError>),

    /// Remote read/write failure carrying the backend's message
    #[error("{0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<database::traits::DatabaseError> for Error {
    fn from(error: database::traits::DatabaseError) -> Self {
        Error::Persistence(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
