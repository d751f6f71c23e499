//! Row CRUD endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::database::traits::{CrudGateway, RowId};
use crate::layer::AdminState;
use crate::render::form::{submit_row, SubmitAction};
use crate::schema::{Row, RowsResponse};
use crate::Error;

/// Handler for GET /api/tables/{key}/rows
///
/// Returns all rows of the table, ordered by its creation column
/// descending. Callers re-fetch this endpoint after every mutation; the
/// gateway performs no cache invalidation itself.
pub async fn list_rows_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    Path(key): Path<String>,
) -> Response {
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => return crate::api::error_response(&error),
    };

    match state.gateway.fetch_all(&schema.table_name).await {
        Ok(rows) => {
            let columns = schema
                .fields
                .iter()
                .map(|field| field.name.clone())
                .collect();
            let total = rows.len();
            (
                StatusCode::OK,
                Json(RowsResponse {
                    rows,
                    columns,
                    total,
                }),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(table = %schema.table_name, %error, "failed to fetch rows");
            crate::api::error_response(&Error::from(error))
        }
    }
}

/// Handler for POST /api/tables/{key}/rows
///
/// Validates the value map against the schema's contract and inserts it.
/// Validation failures are 422 with per-field messages and never reach the
/// gateway.
pub async fn create_row_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    Path(key): Path<String>,
    Json(raw): Json<Row>,
) -> Response {
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => return crate::api::error_response(&error),
    };

    match submit_row(state.gateway.as_ref(), schema, &SubmitAction::Create, &raw).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(error) => crate::api::error_response(&error),
    }
}

/// Handler for PUT /api/tables/{key}/rows/{id}
pub async fn update_row_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    Path((key, id)): Path<(String, String)>,
    Json(raw): Json<Row>,
) -> Response {
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => return crate::api::error_response(&error),
    };

    let action = SubmitAction::Update(RowId::parse(&id));
    match submit_row(state.gateway.as_ref(), schema, &action, &raw).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(error) => crate::api::error_response(&error),
    }
}

/// Handler for DELETE /api/tables/{key}/rows/{id}
pub async fn delete_row_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    Path((key, id)): Path<(String, String)>,
) -> Response {
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => return crate::api::error_response(&error),
    };

    match state.gateway.delete(&schema.table_name, &RowId::parse(&id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            tracing::error!(table = %schema.table_name, %error, "delete failed");
            crate::api::error_response(&Error::from(error))
        }
    }
}
