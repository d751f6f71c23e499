//! REST API endpoints
//!
//! JSON counterparts of the panel pages, for programmatic access. Handlers
//! are generic over the gateway and turn every error into a response; no
//! error crashes the page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};

use crate::database::traits::CrudGateway;
use crate::layer::AdminState;
use crate::Error;

pub mod related;
pub mod rows;
pub mod tables;

// Re-export handlers for convenience
pub use related::related_options_handler;
pub use rows::{create_row_handler, delete_row_handler, list_rows_handler, update_row_handler};
pub use tables::{get_schema_handler, list_schemas_handler};

/// Create the API router with all endpoints
pub fn create_api_router<G: CrudGateway>(state: AdminState<G>) -> Router {
    Router::new()
        .route("/tables", get(tables::list_schemas_handler::<G>))
        .route("/tables/{key}", get(tables::get_schema_handler::<G>))
        .route(
            "/tables/{key}/rows",
            get(rows::list_rows_handler::<G>).post(rows::create_row_handler::<G>),
        )
        .route(
            "/tables/{key}/rows/{id}",
            put(rows::update_row_handler::<G>).delete(rows::delete_row_handler::<G>),
        )
        .route(
            "/tables/{key}/related",
            get(related::related_options_handler::<G>),
        )
        .with_state(state)
}

/// Map an error onto the response the taxonomy prescribes: configuration
/// errors are 404, validation errors are 422 with per-field messages,
/// persistence errors are 500 with the backend message.
pub(crate) fn error_response(error: &Error) -> Response {
    match error {
        Error::SchemaNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": error.to_string() })),
        )
            .into_response(),
        Error::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "errors": errors })),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}
