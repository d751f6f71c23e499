//! CrudAdminLayer - Main Axum integration layer
//!
//! This module provides the main entry point for mounting the admin panel
//! into an Axum application.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::create_api_router;
use crate::database::traits::CrudGateway;
use crate::pages;
use crate::registry::SchemaRegistry;
use crate::session::{
    login_page_handler, login_submit_handler, logout_handler, session_gate, GateState,
    SessionStore,
};

#[cfg(feature = "sqlite")]
use crate::database::sqlite::SqliteGateway;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresGateway;

/// Shared state for all panel handlers
pub struct AdminState<G: CrudGateway> {
    pub gateway: Arc<G>,
    pub registry: Arc<SchemaRegistry>,
    pub sessions: Arc<dyn SessionStore>,
    pub base_path: Arc<String>,
}

impl<G: CrudGateway> Clone for AdminState<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            registry: self.registry.clone(),
            sessions: self.sessions.clone(),
            base_path: self.base_path.clone(),
        }
    }
}

/// Main layer for mounting the CRUD admin panel into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use axum_crud_admin::{CrudAdminLayer, InMemorySessionStore};
/// use sqlx::SqlitePool;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let pool = SqlitePool::connect("sqlite:crm.db").await.unwrap();
/// let sessions = Arc::new(InMemorySessionStore::new("admin@example.com", "geheim"));
/// let panel = CrudAdminLayer::sqlite("/admin", pool, sessions);
/// let app = Router::new().merge(panel.into_router());
/// # }
/// ```
pub struct CrudAdminLayer<G: CrudGateway> {
    base_path: String,
    gateway: Arc<G>,
    registry: Arc<SchemaRegistry>,
    sessions: Arc<dyn SessionStore>,
}

impl<G: CrudGateway> CrudAdminLayer<G> {
    /// Create a new panel at the given base path with an explicit gateway,
    /// registry and session store.
    pub fn new(
        base_path: impl Into<String>,
        gateway: G,
        registry: Arc<SchemaRegistry>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            gateway: Arc::new(gateway),
            registry,
            sessions,
        }
    }

    /// Convert into an Axum Router that can be merged.
    ///
    /// The returned router includes:
    /// - HTML pages at `{base_path}/` (listing, forms, login)
    /// - API endpoints at `{base_path}/api/*`
    /// - The session gate over every route
    pub fn into_router(self) -> Router {
        let state = AdminState {
            gateway: self.gateway,
            registry: self.registry,
            sessions: self.sessions,
            base_path: Arc::new(self.base_path.clone()),
        };
        let gate_state = GateState {
            sessions: state.sessions.clone(),
            base_path: state.base_path.clone(),
        };

        let api_router = create_api_router(state.clone());

        let session_router = Router::new()
            .route(
                "/login",
                get(login_page_handler).post(login_submit_handler),
            )
            .route("/logout", post(logout_handler))
            .with_state(gate_state.clone());

        // Note: Axum 0.8 uses {param} syntax instead of :param
        let page_router = Router::new()
            .route("/", get(pages::home_handler::<G>))
            .route(
                "/t/{key}",
                get(pages::list_page_handler::<G>).post(pages::create_submit_handler::<G>),
            )
            .route("/t/{key}/new", get(pages::new_form_handler::<G>))
            .route(
                "/t/{key}/{id}",
                get(pages::view_page_handler::<G>).post(pages::update_submit_handler::<G>),
            )
            .route("/t/{key}/{id}/edit", get(pages::edit_form_handler::<G>))
            .route(
                "/t/{key}/{id}/delete",
                post(pages::delete_submit_handler::<G>),
            )
            .with_state(state);

        Router::new()
            .nest(&format!("{}/api", self.base_path), api_router)
            .nest(&self.base_path, page_router.merge(session_router))
            .layer(middleware::from_fn_with_state(gate_state, session_gate))
            .layer(
                CorsLayer::permissive(), // Permissive CORS for development
            )
    }
}

#[cfg(feature = "sqlite")]
impl CrudAdminLayer<SqliteGateway> {
    /// Create a panel over SQLite with the built-in CRM schema registry
    pub fn sqlite(
        base_path: impl Into<String>,
        pool: sqlx::SqlitePool,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let registry = Arc::new(SchemaRegistry::crm());
        let gateway = SqliteGateway::new(pool, registry.clone());
        Self {
            base_path: base_path.into(),
            gateway: Arc::new(gateway),
            registry,
            sessions,
        }
    }
}

#[cfg(feature = "postgres")]
impl CrudAdminLayer<PostgresGateway> {
    /// Create a panel over PostgreSQL with the built-in CRM schema registry
    pub fn postgres(
        base_path: impl Into<String>,
        pool: sqlx::PgPool,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let registry = Arc::new(SchemaRegistry::crm());
        let gateway = PostgresGateway::new(pool, registry.clone());
        Self {
            base_path: base_path.into(),
            gateway: Arc::new(gateway),
            registry,
            sessions,
        }
    }
}
