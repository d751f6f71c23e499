//! PostgreSQL gateway implementation

use crate::database::traits::{CrudGateway, DatabaseError, RowId};
use crate::registry::SchemaRegistry;
use crate::schema::{Row, SelectOption};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Column, PgPool, Row as SqlxRow, TypeInfo};
use std::sync::Arc;

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;

/// PostgreSQL-backed CRUD gateway
pub struct PostgresGateway {
    pool: PgPool,
    registry: Arc<SchemaRegistry>,
}

impl PostgresGateway {
    /// Create a new PostgreSQL gateway
    pub fn new(pool: PgPool, registry: Arc<SchemaRegistry>) -> Self {
        Self { pool, registry }
    }

    /// Quote an identifier to prevent SQL injection
    fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    async fn ensure_table_exists(&self, table: &str) -> Result<(), DatabaseError> {
        let exists: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM information_schema.tables
            WHERE table_schema = 'public'
              AND table_type = 'BASE TABLE'
              AND table_name = $1
            "#,
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;

        if exists.is_none() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }
        Ok(())
    }

    /// Convert a PostgreSQL row to a column -> value map
    fn row_to_map(row: &PgRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let column_name = column.name();
            let type_name = column.type_info().name();

            let value: Value = match type_name {
                "BOOL" => {
                    let val: Option<bool> = row.try_get(column_name)?;
                    val.map(Value::Bool).unwrap_or(Value::Null)
                }
                "INT2" | "SMALLINT" | "SMALLSERIAL" => {
                    let val: Option<i16> = row.try_get(column_name)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT4" | "INT" | "INTEGER" | "SERIAL" => {
                    let val: Option<i32> = row.try_get(column_name)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT8" | "BIGINT" | "BIGSERIAL" => {
                    let val: Option<i64> = row.try_get(column_name)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "FLOAT4" | "REAL" => {
                    let val: Option<f32> = row.try_get(column_name)?;
                    val.and_then(|v| serde_json::Number::from_f64(v as f64))
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "FLOAT8" | "DOUBLE PRECISION" => {
                    let val: Option<f64> = row.try_get(column_name)?;
                    val.and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "BPCHAR" => {
                    let val: Option<String> = row.try_get(column_name)?;
                    val.map(Value::String).unwrap_or(Value::Null)
                }
                // Structured log payloads come back as real JSON values
                "JSON" | "JSONB" => {
                    let val: Option<Value> = row.try_get(column_name)?;
                    val.unwrap_or(Value::Null)
                }
                "TIMESTAMPTZ" => {
                    let val: Option<chrono::DateTime<chrono::Utc>> =
                        row.try_get(column_name).ok().flatten();
                    val.map(|v| Value::String(v.to_rfc3339()))
                        .unwrap_or(Value::Null)
                }
                "TIMESTAMP" => {
                    let val: Option<chrono::NaiveDateTime> =
                        row.try_get(column_name).ok().flatten();
                    val.map(|v| Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string()))
                        .unwrap_or(Value::Null)
                }
                "DATE" => {
                    let val: Option<chrono::NaiveDate> = row.try_get(column_name).ok().flatten();
                    val.map(|v| Value::String(v.format("%Y-%m-%d").to_string()))
                        .unwrap_or(Value::Null)
                }
                "UUID" => {
                    let val: Option<sqlx::types::Uuid> = row.try_get(column_name).ok().flatten();
                    val.map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null)
                }
                "NUMERIC" | "DECIMAL" | "TIME" => {
                    let val: Option<String> = row.try_get(column_name).ok().flatten();
                    val.map(Value::String).unwrap_or(Value::Null)
                }
                _ => {
                    let val: Option<String> = row.try_get(column_name).ok().flatten();
                    val.map(Value::String).unwrap_or(Value::Null)
                }
            };

            map.insert(column_name.to_string(), value);
        }

        Ok(map)
    }

    fn bind_value<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
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
            structured => query.bind(structured.clone()),
        }
    }

    fn bind_id<'q>(query: PgQuery<'q>, id: &RowId) -> PgQuery<'q> {
        match id {
            RowId::Int(integer) => query.bind(*integer),
            RowId::Text(text) => query.bind(text.clone()),
        }
    }
}

#[async_trait]
impl CrudGateway for PostgresGateway {
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
            let placeholders: Vec<String> = (1..=values.len())
                .map(|index| format!("${}", index))
                .collect();
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
            .enumerate()
            .map(|(index, column)| {
                format!("{} = ${}", Self::quote_identifier(column), index + 1)
            })
            .collect();
        let update_query = format!(
            "UPDATE {} SET {} WHERE \"id\" = ${} RETURNING *",
            Self::quote_identifier(table),
            assignments.join(", "),
            values.len() + 1
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
            "DELETE FROM {} WHERE \"id\" = $1",
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
