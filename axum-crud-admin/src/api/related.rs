//! Related-option resolution endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::database::traits::CrudGateway;
use crate::layer::AdminState;
use crate::render::form::load_related_options;

/// Handler for GET /api/tables/{key}/related
///
/// Resolves the select options for every relation field of the schema,
/// keyed by field name. The per-relation fetches run concurrently and fail
/// soft, so a broken relation shows up as an empty list for its field.
pub async fn related_options_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    Path(key): Path<String>,
) -> Response {
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => return crate::api::error_response(&error),
    };

    let related = load_related_options(&state.gateway, schema).await;
    (StatusCode::OK, Json(related)).into_response()
}
