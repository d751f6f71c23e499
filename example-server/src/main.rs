use axum::{extract::State, http::StatusCode, routing::get, Router};
use axum_crud_admin::{CrudAdminLayer, InMemorySessionStore};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod database;

#[derive(Clone)]
struct ApplicationState {
    pool: SqlitePool,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configuration from the environment, with development defaults
    let database_url = env_or("DATABASE_URL", "sqlite:./data/crm.db?mode=rwc");
    let bind_address = env_or("BIND_ADDR", "127.0.0.1:3000");
    let admin_email = env_or("ADMIN_EMAIL", "admin@example.com");
    let admin_password = env_or("ADMIN_PASSWORD", "wachtwoord");

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    // Run database setup and seed sample data
    database::setup(&pool)
        .await
        .expect("Failed to setup database");

    let application_state = ApplicationState { pool: pool.clone() };
    let sessions = Arc::new(InMemorySessionStore::new(admin_email.clone(), admin_password));

    // Note: CrudAdminLayer must be merged before with_state() since it
    // returns a stateless Router
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .with_state(application_state)
        .merge(CrudAdminLayer::sqlite("/admin", pool, sessions).into_router())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("Failed to bind server address");

    tracing::info!("Server running at http://{}", bind_address);
    tracing::info!("Admin panel available at http://{}/admin", bind_address);
    tracing::info!("Login as {}", admin_email);

    axum::serve(listener, app).await.expect("Server error");
}

async fn root_handler() -> &'static str {
    "Welcome to the axum-crud-admin example server"
}

async fn health_handler(
    State(state): State<ApplicationState>,
) -> Result<(StatusCode, &'static str), StatusCode> {
    // Verify database connectivity
    sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok((StatusCode::OK, "Server is healthy"))
}
