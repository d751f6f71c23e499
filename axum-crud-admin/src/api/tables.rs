//! Schema listing and lookup endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::database::traits::CrudGateway;
use crate::layer::AdminState;
use crate::schema::{SchemaSummary, SchemasResponse};

/// Handler for GET /api/tables
///
/// Returns the registered table schemas in navigation order.
pub async fn list_schemas_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
) -> Response {
    let tables = state
        .registry
        .iter()
        .map(|schema| SchemaSummary {
            table_name: schema.table_name.clone(),
            display_name: schema.display_name.clone(),
        })
        .collect();

    (StatusCode::OK, Json(SchemasResponse { tables })).into_response()
}

/// Handler for GET /api/tables/{key}
///
/// Returns the full schema descriptor for one table key, or 404 when the
/// key is not registered.
pub async fn get_schema_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    Path(key): Path<String>,
) -> Response {
    match state.registry.lookup(&key) {
        Ok(schema) => (StatusCode::OK, Json(schema.clone())).into_response(),
        Err(error) => crate::api::error_response(&error),
    }
}
