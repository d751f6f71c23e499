//! Declarative table schema types
//!
//! A [`TableSchema`] describes one administrable table: its display name, the
//! ordered list of fields with their kinds, and the column used to order row
//! listings. Schemas are defined once at startup and never mutated.

use serde::Serialize;
use serde_json::Value;

/// A single row as returned by the gateway: an untyped column -> value map.
///
/// System columns (id, created/updated timestamps) are always present in rows
/// but excluded from editable forms via [`FieldDescriptor::editable`].
pub type Row = serde_json::Map<String, Value>;

/// One choice in a select input, also used to back-translate a stored
/// foreign-key id into a human label at display time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    /// Opaque identifier stored in the column
    pub value: Value,

    /// Human label shown in dropdowns and list cells
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A foreign-key style reference to another table, resolved at display and
/// edit time into [`SelectOption`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Referenced table name
    pub table: String,

    /// Column holding the stored identifier
    pub value_field: String,

    /// Column holding the display label
    pub label_field: String,
}

impl Relation {
    pub fn new(
        table: impl Into<String>,
        value_field: impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            value_field: value_field.into(),
            label_field: label_field.into(),
        }
    }
}

/// Closed set of field kinds.
///
/// Enum options and relations live inside their variants, so a selectable
/// field cannot be declared without its choices and every renderer dispatches
/// with a single exhaustive `match` instead of type-string branching.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    /// Single-line free text
    Text,

    /// Email address, validated on submission
    Email,

    /// Numeric input, normalized to a JSON number
    Number,

    /// Multi-line free text; values that look like JSON are parsed leniently
    Textarea,

    /// Calendar date (YYYY-MM-DD)
    Date,

    /// Date with time component
    DateTime,

    /// Checkbox, defaulting to false
    Boolean,

    /// Fixed set of choices declared in the schema
    Enum { options: Vec<SelectOption> },

    /// Foreign-key reference, choices resolved from the target table
    Relation(Relation),

    /// Opaque identifier column
    Uuid,

    /// System-managed creation timestamp
    Timestamp,
}

impl FieldKind {
    /// Whether the kind renders as a select input
    pub fn is_selectable(&self) -> bool {
        matches!(self, FieldKind::Enum { .. } | FieldKind::Relation(_))
    }

    /// Pre-fill value for create forms: booleans start false, everything
    /// else starts empty.
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Boolean => Value::Bool(false),
            _ => Value::String(String::new()),
        }
    }

    /// The relation backing this kind, if any
    pub fn relation(&self) -> Option<&Relation> {
        match self {
            FieldKind::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

/// Descriptor for one field of a table schema
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Column name, unique within the owning schema
    pub name: String,

    /// Display label
    pub label: String,

    /// Field kind driving rendering, defaults and validation
    #[serde(flatten)]
    pub kind: FieldKind,

    /// Whether submission requires a non-empty value
    pub required: bool,

    /// System columns set this to false and never appear in forms
    pub editable: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            editable: true,
        }
    }

    /// Mark the field as required on submission
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as a system column, excluded from editable forms
    pub fn system(mut self) -> Self {
        self.editable = false;
        self
    }
}

/// Complete schema for one administrable table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Name of the backing table
    pub table_name: String,

    /// Human name used in navigation and page titles
    pub display_name: String,

    /// Ordered field descriptors
    pub fields: Vec<FieldDescriptor>,

    /// Timestamp column used to order row listings (descending). Domain
    /// tables use the default column name, logs tables use their own.
    pub created_column: String,
}

impl TableSchema {
    pub fn new(
        table_name: impl Into<String>,
        display_name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            display_name: display_name.into(),
            fields,
            created_column: crate::registry::DEFAULT_CREATED_COLUMN.to_string(),
        }
    }

    /// Override the ordering column for tables that use a different
    /// creation-timestamp convention
    pub fn ordered_by(mut self, column: impl Into<String>) -> Self {
        self.created_column = column.into();
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields that appear in create/edit forms
    pub fn editable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.editable)
    }

    /// Fields backed by a relation, paired with their relation descriptor
    pub fn relation_fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &Relation)> {
        self.fields
            .iter()
            .filter_map(|field| field.kind.relation().map(|relation| (field, relation)))
    }
}

/// Response containing all rows of a table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsResponse {
    /// The rows, ordered by the schema's creation column descending
    pub rows: Vec<Row>,

    /// Field names in schema order
    pub columns: Vec<String>,

    /// Total number of rows returned
    pub total: usize,
}

/// Response listing the registered schemas
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemasResponse {
    pub tables: Vec<SchemaSummary>,
}

/// Summary of one registered schema (for navigation)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub table_name: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_defaults_to_false() {
        assert_eq!(FieldKind::Boolean.default_value(), Value::Bool(false));
        assert_eq!(
            FieldKind::Text.default_value(),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_selectable_kinds() {
        assert!(FieldKind::Enum { options: vec![] }.is_selectable());
        assert!(FieldKind::Relation(Relation::new("regio", "id", "naam")).is_selectable());
        assert!(!FieldKind::Text.is_selectable());
        assert!(!FieldKind::Boolean.is_selectable());
    }

    #[test]
    fn test_editable_fields_exclude_system_columns() {
        let schema = TableSchema::new(
            "regio",
            "Regio",
            vec![
                FieldDescriptor::new("id", "ID", FieldKind::Number).system(),
                FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
                FieldDescriptor::new("aangemaakt_op", "Aangemaakt op", FieldKind::DateTime)
                    .system(),
            ],
        );

        let editable: Vec<&str> = schema
            .editable_fields()
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(editable, vec!["naam"]);
    }

    #[test]
    fn test_relation_fields() {
        let schema = TableSchema::new(
            "klanten",
            "Klant",
            vec![
                FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
                FieldDescriptor::new(
                    "regio_id",
                    "Regio",
                    FieldKind::Relation(Relation::new("regio", "id", "naam")),
                ),
            ],
        );

        let relations: Vec<&str> = schema
            .relation_fields()
            .map(|(field, _)| field.name.as_str())
            .collect();
        assert_eq!(relations, vec!["regio_id"]);
    }

    #[test]
    fn test_field_kind_serializes_tagged() {
        let kind = FieldKind::Relation(Relation::new("regio", "id", "naam"));
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "relation");
        assert_eq!(json["table"], "regio");
        assert_eq!(json["valueField"], "id");
        assert_eq!(json["labelField"], "naam");
    }
}
