//! Data access gateway trait
//!
//! The gateway is the sole component permitted to perform remote reads and
//! writes. Implementations provide backend-specific SQL for the five
//! operations; none of them retries automatically, and callers are
//! responsible for re-fetching affected lists after a successful mutation.

use crate::schema::{Row, SelectOption};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Row identifier as it appears in URLs and WHERE clauses.
///
/// Integer keys must bind as integers (SQLite will not match `'42'` against
/// an INTEGER column), uuid/text keys bind as strings.
#[derive(Debug, Clone, PartialEq)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    /// Parse a path segment into an id, preferring the integer form
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(integer) => RowId::Int(integer),
            Err(_) => RowId::Text(raw.to_string()),
        }
    }

    /// Extract an id from a fetched row value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(RowId::Int),
            Value::String(text) => Some(RowId::Text(text.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(integer) => write!(formatter, "{}", integer),
            RowId::Text(text) => write!(formatter, "{}", text),
        }
    }
}

/// Gateway over the remote data store, scoped per operation to a table name
#[async_trait]
pub trait CrudGateway: Send + Sync + 'static {
    /// Fetch all rows of a table, ordered by its creation-timestamp column
    /// descending. The ordering column is a table-aware policy resolved
    /// through the schema registry, not a per-call-site constant.
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, DatabaseError>;

    /// Resolve a relation into select options, ordered ascending by label.
    ///
    /// Fails soft: an unreachable table or missing column degrades the
    /// dropdown to an empty list instead of propagating the error.
    async fn fetch_related(
        &self,
        table: &str,
        value_field: &str,
        label_field: &str,
    ) -> Vec<SelectOption>;

    /// Insert a row and return it as stored
    async fn insert(&self, table: &str, values: &Row) -> Result<Row, DatabaseError>;

    /// Update a row by id and return it as stored
    async fn update(&self, table: &str, id: &RowId, values: &Row) -> Result<Row, DatabaseError>;

    /// Delete a row by id
    async fn delete(&self, table: &str, id: &RowId) -> Result<(), DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Generic database error
    #[error("Database error: {0}")]
    Query(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Row not found for an update
    #[error("Row not found: {table}/{id}")]
    RowNotFound { table: String, id: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::Query(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_id_parse() {
        assert_eq!(RowId::parse("42"), RowId::Int(42));
        assert_eq!(
            RowId::parse("3f2c5a1e-9f10-4a6f-8a77-0d6c2f1b2c3d"),
            RowId::Text("3f2c5a1e-9f10-4a6f-8a77-0d6c2f1b2c3d".to_string())
        );
    }

    #[test]
    fn test_row_id_from_value() {
        assert_eq!(RowId::from_value(&json!(7)), Some(RowId::Int(7)));
        assert_eq!(
            RowId::from_value(&json!("abc")),
            Some(RowId::Text("abc".to_string()))
        );
        assert_eq!(RowId::from_value(&json!(null)), None);
    }
}
