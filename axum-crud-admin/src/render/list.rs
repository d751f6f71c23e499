//! List renderer
//!
//! Pure mapping from fetched rows, the schema's fields and the resolved
//! relation options to a table view model. No IO happens here; the page
//! layer turns the view into HTML and the JSON API serializes it directly.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{FieldDescriptor, FieldKind, Row, SelectOption, TableSchema};

/// One rendered cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CellView {
    /// Plain display text
    Text { text: String },

    /// Structured JSON payload, shown collapsed with a key count and
    /// expandable to the pretty-printed body
    Json { keys: usize, pretty: String },
}

impl CellView {
    fn text(value: impl Into<String>) -> Self {
        CellView::Text { text: value.into() }
    }

    /// Flatten to display text (used by read-only form projections)
    pub fn as_text(&self) -> &str {
        match self {
            CellView::Text { text } => text,
            CellView::Json { pretty, .. } => pretty,
        }
    }
}

/// One rendered row with its identifier for edit/delete actions
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    /// Raw id value, used to address row actions
    pub id: Option<String>,

    /// Cells in schema field order
    pub cells: Vec<CellView>,
}

/// Rendered table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<RowView>,
}

/// Build the table view for a schema from fetched rows and the resolved
/// relation options per field name.
pub fn build_table(
    schema: &TableSchema,
    rows: &[Row],
    related: &HashMap<String, Vec<SelectOption>>,
) -> TableView {
    let columns = schema
        .fields
        .iter()
        .map(|field| field.label.clone())
        .collect();

    let row_views = rows
        .iter()
        .map(|row| RowView {
            id: row.get("id").map(display_text),
            cells: schema
                .fields
                .iter()
                .map(|field| {
                    format_cell(
                        field,
                        row.get(&field.name),
                        related.get(&field.name).map(|options| options.as_slice()),
                    )
                })
                .collect(),
        })
        .collect();

    TableView {
        title: schema.display_name.clone(),
        columns,
        rows: row_views,
    }
}

/// Format one cell according to the field kind.
///
/// Nulls render as a dash, booleans localize to Ja/Nee, dates format for the
/// admin locale (falling back to the raw value when unparsable), JSON
/// objects collapse to a key-count summary, and relation/enum ids resolve to
/// their labels or fall back to the raw id.
pub fn format_cell(
    field: &FieldDescriptor,
    value: Option<&Value>,
    related: Option<&[SelectOption]>,
) -> CellView {
    let value = match value {
        None | Some(Value::Null) => return CellView::text("-"),
        Some(value) => value,
    };

    // Structured payloads collapse to a summary regardless of kind
    if let Value::Object(map) = value {
        return CellView::Json {
            keys: map.len(),
            pretty: serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        };
    }

    match &field.kind {
        FieldKind::Boolean => CellView::text(if is_truthy(value) { "Ja" } else { "Nee" }),

        FieldKind::Date => CellView::text(format_date(value)),
        FieldKind::DateTime | FieldKind::Timestamp => CellView::text(format_datetime(value)),

        FieldKind::Enum { options } => CellView::text(resolve_label(value, options)),

        FieldKind::Relation(_) => match related {
            Some(options) => CellView::text(resolve_label(value, options)),
            None => CellView::text(display_text(value)),
        },

        FieldKind::Text
        | FieldKind::Email
        | FieldKind::Number
        | FieldKind::Textarea
        | FieldKind::Uuid => CellView::text(display_text(value)),
    }
}

/// Whether a stored value counts as true (SQLite stores booleans as 0/1)
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_i64().unwrap_or(0) != 0,
        Value::String(text) => matches!(text.as_str(), "true" | "1" | "on"),
        _ => false,
    }
}

/// String coercion for display and option matching
pub fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Look up the stored id in the resolved options, falling back to the raw
/// value when no option matches.
fn resolve_label(value: &Value, options: &[SelectOption]) -> String {
    let as_text = display_text(value);
    options
        .iter()
        .find(|option| option.value == *value || display_text(&option.value) == as_text)
        .map(|option| option.label.clone())
        .unwrap_or(as_text)
}

fn format_date(value: &Value) -> String {
    let raw = display_text(value);
    parse_timestamp(&raw)
        .map(|parsed| parsed.format("%d-%m-%Y").to_string())
        .unwrap_or(raw)
}

fn format_datetime(value: &Value) -> String {
    let raw = display_text(value);
    parse_timestamp(&raw)
        .map(|parsed| parsed.format("%d-%m-%Y %H:%M").to_string())
        .unwrap_or(raw)
}

/// Parse the timestamp formats the backends produce; anything else falls
/// back to the raw value.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.and_hms_opt(0, 0, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;
    use serde_json::json;

    fn field(kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor::new("veld", "Veld", kind)
    }

    #[test]
    fn test_null_renders_as_dash() {
        assert_eq!(
            format_cell(&field(FieldKind::Text), None, None),
            CellView::text("-")
        );
        assert_eq!(
            format_cell(&field(FieldKind::Text), Some(&Value::Null), None),
            CellView::text("-")
        );
    }

    #[test]
    fn test_boolean_localizes() {
        assert_eq!(
            format_cell(&field(FieldKind::Boolean), Some(&json!(true)), None),
            CellView::text("Ja")
        );
        assert_eq!(
            format_cell(&field(FieldKind::Boolean), Some(&json!(0)), None),
            CellView::text("Nee")
        );
    }

    #[test]
    fn test_relation_resolves_stored_id_to_label() {
        let options = vec![
            SelectOption::new(41, "Piet"),
            SelectOption::new(42, "Jan"),
        ];
        let klant_field = FieldDescriptor::new(
            "klant_id",
            "Klant",
            FieldKind::Relation(crate::schema::Relation::new("klanten", "id", "naam")),
        );

        let cell = format_cell(&klant_field, Some(&json!(42)), Some(&options));
        assert_eq!(cell, CellView::text("Jan"));
    }

    #[test]
    fn test_relation_without_match_shows_raw_id() {
        let options = vec![SelectOption::new(1, "Jan")];
        let klant_field = FieldDescriptor::new(
            "klant_id",
            "Klant",
            FieldKind::Relation(crate::schema::Relation::new("klanten", "id", "naam")),
        );

        let cell = format_cell(&klant_field, Some(&json!(42)), Some(&options));
        assert_eq!(cell, CellView::text("42"));
    }

    #[test]
    fn test_enum_resolves_label() {
        let status_field = field(FieldKind::Enum {
            options: vec![SelectOption::new("actief", "Actief")],
        });
        assert_eq!(
            format_cell(&status_field, Some(&json!("actief")), None),
            CellView::text("Actief")
        );
    }

    #[test]
    fn test_json_object_collapses_to_summary() {
        let data_field = field(FieldKind::Textarea);
        let cell = format_cell(
            &data_field,
            Some(&json!({"duur": 30, "richting": "uit"})),
            None,
        );
        match cell {
            CellView::Json { keys, pretty } => {
                assert_eq!(keys, 2);
                assert!(pretty.contains("\"duur\""));
            }
            CellView::Text { .. } => panic!("expected JSON summary"),
        }
    }

    #[test]
    fn test_date_formats_for_locale_with_fallback() {
        assert_eq!(
            format_cell(&field(FieldKind::Date), Some(&json!("2024-01-03")), None),
            CellView::text("03-01-2024")
        );
        assert_eq!(
            format_cell(
                &field(FieldKind::Timestamp),
                Some(&json!("2024-01-03T14:30:00Z")),
                None
            ),
            CellView::text("03-01-2024 14:30")
        );
        // Unparsable values fall back to the raw string
        assert_eq!(
            format_cell(&field(FieldKind::Date), Some(&json!("ooit")), None),
            CellView::text("ooit")
        );
    }

    #[test]
    fn test_build_table_uses_schema_order() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("regio").unwrap();

        let mut row = Row::new();
        row.insert("id".into(), json!(1));
        row.insert("naam".into(), json!("Noord"));
        row.insert("code".into(), json!("N"));
        row.insert("actief".into(), json!(1));

        let table = build_table(schema, &[row], &HashMap::new());
        assert_eq!(table.title, "Regio");
        assert_eq!(table.columns[0], "ID");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].id.as_deref(), Some("1"));
        assert_eq!(table.rows[0].cells[1], CellView::text("Noord"));
        assert_eq!(table.rows[0].cells[4], CellView::text("Ja"));
        // Missing columns render as a dash
        assert_eq!(table.rows[0].cells[3], CellView::text("-"));
    }
}
