//! SQLite gateway implementation

use crate::database::traits::{CrudGateway, DatabaseError, RowId};
use crate::registry::SchemaRegistry;
use crate::schema::{Row, SelectOption};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as SqlxRow, SqlitePool, TypeInfo, ValueRef};
use std::sync::Arc;

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

/// SQLite-backed CRUD gateway
pub struct SqliteGateway {
    pool: SqlitePool,
    registry: Arc<SchemaRegistry>,
}

impl SqliteGateway {
    /// Create a new SQLite gateway.
    ///
    /// The registry supplies the per-table ordering policy for
    /// [`CrudGateway::fetch_all`].
    pub fn new(pool: SqlitePool, registry: Arc<SchemaRegistry>) -> Self {
        Self { pool, registry }
    }

    /// Quote an identifier (table or column name) to prevent SQL injection
    ///
    /// SQLite uses double quotes for identifiers. This function escapes any
    /// double quotes in the identifier by doubling them.
    fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    async fn ensure_table_exists(&self, table: &str) -> Result<(), DatabaseError> {
        let exists: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name = ? AND name NOT LIKE 'sqlite_%'",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;

        if exists.is_none() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }
        Ok(())
    }

    /// Convert a SQLite row to a column -> value map
    fn row_to_map(row: &SqliteRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let column_name = column.name();
            let value = Self::extract_column_value(row, column)?;
            map.insert(column_name.to_string(), value);
        }

        Ok(map)
    }

    /// Extract a column value from a SQLite row and convert to JSON
    fn extract_column_value(
        row: &SqliteRow,
        column: &sqlx::sqlite::SqliteColumn,
    ) -> Result<Value, DatabaseError> {
        let column_name = column.name();
        let type_name = column.type_info().name();

        if row
            .try_get_raw(column_name)
            .map_err(|error| DatabaseError::Query(error.to_string()))?
            .is_null()
        {
            return Ok(Value::Null);
        }

        // SQLite reports type affinities: INTEGER, REAL, TEXT, BLOB, NULL
        match type_name {
            "INTEGER" | "BIGINT" => {
                if let Ok(value) = row.try_get::<i64, _>(column_name) {
                    return Ok(Value::Number(value.into()));
                }
            }
            "REAL" | "FLOAT" | "DOUBLE" => {
                if let Ok(value) = row.try_get::<f64, _>(column_name) {
                    if let Some(number) = serde_json::Number::from_f64(value) {
                        return Ok(Value::Number(number));
                    }
                }
            }
            "BOOLEAN" | "BOOL" => {
                if let Ok(value) = row.try_get::<bool, _>(column_name) {
                    return Ok(Value::Bool(value));
                }
            }
            "TEXT" | "VARCHAR" | "CHAR" | "CLOB" | "DATE" | "DATETIME" | "TIMESTAMP" => {
                if let Ok(value) = row.try_get::<String, _>(column_name) {
                    return Ok(Value::String(value));
                }
            }
            _ => {
                if let Ok(value) = row.try_get::<String, _>(column_name) {
                    return Ok(Value::String(value));
                }
            }
        }

        // Fallback: try common types in order
        if let Ok(value) = row.try_get::<i64, _>(column_name) {
            return Ok(Value::Number(value.into()));
        }
        if let Ok(value) = row.try_get::<f64, _>(column_name) {
            if let Some(number) = serde_json::Number::from_f64(value) {
                return Ok(Value::Number(number));
            }
        }
        if let Ok(value) = row.try_get::<String, _>(column_name) {
            return Ok(Value::String(value));
        }
        if let Ok(value) = row.try_get::<bool, _>(column_name) {
            return Ok(Value::Bool(value));
        }

        Ok(Value::Null)
    }

    /// Bind a JSON value as the appropriate SQLite type. Structured values
    /// (the lenient-JSON textarea payloads) are stored as JSON text.
    fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(flag) => query.bind(*flag),
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    query.bind(integer)
                } else {
                    query.bind(number.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(text) => query.bind(text.clone()),
            structured => query.bind(structured.to_string()),
        }
    }

    fn bind_id<'q>(query: SqliteQuery<'q>, id: &RowId) -> SqliteQuery<'q> {
        match id {
            RowId::Int(integer) => query.bind(*integer),
            RowId::Text(text) => query.bind(text.clone()),
        }
    }
}

#[async_trait]
impl CrudGateway for SqliteGateway {
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, DatabaseError> {
        self.ensure_table_exists(table).await?;

        let order_column = self.registry.created_column(table);
        let select_query = format!(
            "SELECT * FROM {} ORDER BY {} DESC",
            Self::quote_identifier(table),
            Self::quote_identifier(order_column)
        );

        let rows = sqlx::query(&select_query).fetch_all(&self.pool).await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            result.push(Self::row_to_map(row)?);
        }

        tracing::debug!(table, rows = result.len(), "fetched rows");
        Ok(result)
    }

    async fn fetch_related(
        &self,
        table: &str,
        value_field: &str,
        label_field: &str,
    ) -> Vec<SelectOption> {
        let select_query = format!(
            "SELECT {} AS value, {} AS label FROM {} ORDER BY {} ASC",
            Self::quote_identifier(value_field),
            Self::quote_identifier(label_field),
            Self::quote_identifier(table),
            Self::quote_identifier(label_field)
        );

        let rows = match sqlx::query(&select_query).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(error) => {
                // A broken relation degrades its dropdown to empty instead
                // of failing the form.
                tracing::warn!(table, %error, "related lookup failed");
                return Vec::new();
            }
        };

        rows.iter()
            .filter_map(|row| Self::row_to_map(row).ok())
            .map(|map| {
                let value = map.get("value").cloned().unwrap_or(Value::Null);
                let label = match map.get("label") {
                    Some(Value::String(text)) => text.clone(),
                    Some(Value::Null) | None => "Onbekend".to_string(),
                    Some(other) => other.to_string(),
                };
                SelectOption { value, label }
            })
            .collect()
    }

    async fn insert(&self, table: &str, values: &Row) -> Result<Row, DatabaseError> {
        self.ensure_table_exists(table).await?;

        let insert_query = if values.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING *",
                Self::quote_identifier(table)
            )
        } else {
            let columns: Vec<String> = values
                .keys()
                .map(|column| Self::quote_identifier(column))
                .collect();
            let placeholders: Vec<&str> = values.keys().map(|_| "?").collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
                Self::quote_identifier(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        let mut query = sqlx::query(&insert_query);
        for value in values.values() {
            query = Self::bind_value(query, value);
        }

        let row = query.fetch_one(&self.pool).await?;
        let created = Self::row_to_map(&row)?;
        tracing::debug!(table, "inserted row");
        Ok(created)
    }

    async fn update(&self, table: &str, id: &RowId, values: &Row) -> Result<Row, DatabaseError> {
        self.ensure_table_exists(table).await?;

        let assignments: Vec<String> = values
            .keys()
            .map(|column| format!("{} = ?", Self::quote_identifier(column)))
            .collect();
        let update_query = format!(
            "UPDATE {} SET {} WHERE \"id\" = ? RETURNING *",
            Self::quote_identifier(table),
            assignments.join(", ")
        );

        let mut query = sqlx::query(&update_query);
        for value in values.values() {
            query = Self::bind_value(query, value);
        }
        query = Self::bind_id(query, id);

        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::RowNotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        let updated = Self::row_to_map(&row)?;
        tracing::debug!(table, %id, "updated row");
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: &RowId) -> Result<(), DatabaseError> {
        self.ensure_table_exists(table).await?;

        let delete_query = format!(
            "DELETE FROM {} WHERE \"id\" = ?",
            Self::quote_identifier(table)
        );

        let mut query = sqlx::query(&delete_query);
        query = Self::bind_id(query, id);
        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            tracing::warn!(table, %id, "delete matched no rows");
        } else {
            tracing::debug!(table, %id, "deleted row");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_row;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    // A single shared connection so every statement sees the same
    // in-memory database.
    async fn test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn gateway() -> SqliteGateway {
        SqliteGateway::new(test_pool().await, Arc::new(SchemaRegistry::crm()))
    }

    async fn create_regio_table(pool: &SqlitePool) {
        sqlx::query(
            r#"
            CREATE TABLE regio (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                naam TEXT NOT NULL,
                code TEXT NOT NULL,
                beschrijving TEXT,
                actief BOOLEAN,
                aangemaakt_op DATETIME DEFAULT CURRENT_TIMESTAMP,
                bijgewerkt_op DATETIME
            )
            "#,
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(SqliteGateway::quote_identifier("klanten"), "\"klanten\"");
        assert_eq!(
            SqliteGateway::quote_identifier("table\"name"),
            "\"table\"\"name\""
        );
    }

    #[tokio::test]
    async fn test_fetch_related_missing_table_returns_empty() {
        let gateway = gateway().await;
        let options = gateway.fetch_related("bestaat_niet", "id", "naam").await;
        assert!(options.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_missing_table_fails() {
        let gateway = gateway().await;
        let error = gateway.fetch_all("bestaat_niet").await.unwrap_err();
        assert!(matches!(error, DatabaseError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_all_logs_orders_by_created_at_descending() {
        let gateway = gateway().await;
        sqlx::query(
            "CREATE TABLE logs (id TEXT PRIMARY KEY, type TEXT, status TEXT, message TEXT, created_at TEXT)",
        )
        .execute(&gateway.pool)
        .await
        .unwrap();

        sqlx::query("INSERT INTO logs VALUES ('a', 'call', 'ok', 'eerste', '2024-01-01T10:00:00Z')")
            .execute(&gateway.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO logs VALUES ('b', 'call', 'ok', 'tweede', '2024-01-03T10:00:00Z')")
            .execute(&gateway.pool)
            .await
            .unwrap();

        let rows = gateway.fetch_all("logs").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["message"], json!("tweede"));
        assert_eq!(rows[1]["message"], json!("eerste"));
    }

    #[tokio::test]
    async fn test_fetch_related_orders_by_label() {
        let gateway = gateway().await;
        create_regio_table(&gateway.pool).await;
        sqlx::query("INSERT INTO regio (naam, code) VALUES ('Zuid', 'Z'), ('Noord', 'N')")
            .execute(&gateway.pool)
            .await
            .unwrap();

        let options = gateway.fetch_related("regio", "id", "naam").await;
        let labels: Vec<&str> = options.iter().map(|option| option.label.as_str()).collect();
        assert_eq!(labels, vec!["Noord", "Zuid"]);
        assert_eq!(options[0].value, json!(2));
    }

    #[tokio::test]
    async fn test_insert_returns_created_row() {
        let gateway = gateway().await;
        create_regio_table(&gateway.pool).await;

        let mut values = Row::new();
        values.insert("naam".into(), json!("Noord"));
        values.insert("code".into(), json!("N"));
        values.insert("actief".into(), json!(true));

        let created = gateway.insert("regio", &values).await.unwrap();
        assert_eq!(created["id"], json!(1));
        assert_eq!(created["naam"], json!("Noord"));
        assert_eq!(created["actief"], json!(true));
        assert!(created["aangemaakt_op"].is_string());
    }

    #[tokio::test]
    async fn test_edit_without_change_is_idempotent() {
        let gateway = gateway().await;
        create_regio_table(&gateway.pool).await;

        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("regio").unwrap();

        let mut raw = Row::new();
        raw.insert("naam".into(), json!("Noord"));
        raw.insert("code".into(), json!("N"));
        raw.insert("actief".into(), json!("on"));
        let values = validate_row(schema, &raw).unwrap();
        gateway.insert("regio", &values).await.unwrap();

        // Open the stored row in edit mode and submit it unchanged
        let fetched = gateway.fetch_all("regio").await.unwrap().remove(0);
        let resubmitted = validate_row(schema, &fetched).unwrap();
        let id = RowId::from_value(&fetched["id"]).unwrap();
        let updated = gateway.update("regio", &id, &resubmitted).await.unwrap();

        assert_eq!(updated, fetched);
    }

    #[tokio::test]
    async fn test_update_missing_row_fails() {
        let gateway = gateway().await;
        create_regio_table(&gateway.pool).await;

        let mut values = Row::new();
        values.insert("naam".into(), json!("Oost"));

        let error = gateway
            .update("regio", &RowId::Int(99), &values)
            .await
            .unwrap_err();
        assert!(matches!(error, DatabaseError::RowNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let gateway = gateway().await;
        create_regio_table(&gateway.pool).await;
        sqlx::query("INSERT INTO regio (naam, code) VALUES ('West', 'W')")
            .execute(&gateway.pool)
            .await
            .unwrap();

        gateway.delete("regio", &RowId::Int(1)).await.unwrap();
        assert!(gateway.fetch_all("regio").await.unwrap().is_empty());
    }
}
