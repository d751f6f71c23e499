//! Form renderer and submission pipeline
//!
//! Three modes: `Create` pre-fills per-kind defaults, `Edit` pre-fills from
//! the selected row, `View` is a read-only projection that offers the
//! transitions into edit and delete. The submission pipeline validates
//! first, only then talks to the gateway, and follows every successful
//! mutation with exactly one re-fetch of the table's rows.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::database::traits::{CrudGateway, RowId};
use crate::render::list::format_cell;
use crate::schema::{FieldKind, Row, SelectOption, TableSchema};
use crate::validate::{validate_row, FieldError};
use crate::Error;

/// Form rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormMode {
    Create,
    Edit,
    View,
}

/// One rendered form field
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldView {
    pub name: String,
    pub label: String,

    /// Kind driving the widget choice (exhaustive dispatch in the page layer)
    pub kind: FieldKind,

    /// Current input value as text; for `View` mode the formatted display
    /// value
    pub value: String,

    /// Checkbox state for boolean fields
    pub checked: bool,

    /// Choices for selectable fields: enum options from the schema,
    /// relation options as resolved by the gateway (empty when the relation
    /// degraded)
    pub options: Vec<SelectOption>,

    pub required: bool,

    /// Validation error attached after a failed submission
    pub error: Option<String>,
}

/// Rendered form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub table_name: String,
    pub title: String,
    pub mode: FormMode,
    pub fields: Vec<FormFieldView>,

    /// Backend error shown as a dismissible banner, keeping the form open
    pub banner: Option<String>,
}

impl FormView {
    /// Attach per-field validation errors after a rejected submission
    pub fn apply_errors(mut self, errors: &[FieldError]) -> Self {
        for field in &mut self.fields {
            if let Some(error) = errors.iter().find(|error| error.field == field.name) {
                field.error = Some(error.message.clone());
            }
        }
        self
    }

    /// Attach a backend error banner
    pub fn with_banner(mut self, message: impl Into<String>) -> Self {
        self.banner = Some(message.into());
        self
    }
}

/// Build the form view for a schema.
///
/// `row` is the pre-fill source: the selected row for edit/view, the
/// submitted raw values when re-rendering after a rejected submission, or
/// `None` for a fresh create form.
pub fn build_form(
    schema: &TableSchema,
    mode: FormMode,
    row: Option<&Row>,
    related: &HashMap<String, Vec<SelectOption>>,
) -> FormView {
    let title = match mode {
        FormMode::Create => format!("Toevoegen {}", schema.display_name),
        FormMode::Edit => format!("Bewerken {}", schema.display_name),
        FormMode::View => schema.display_name.clone(),
    };

    let fields = match mode {
        FormMode::View => schema.fields.iter().collect::<Vec<_>>(),
        _ => schema.editable_fields().collect(),
    };

    let field_views = fields
        .into_iter()
        .map(|field| {
            let default = field.kind.default_value();
            let current = row.and_then(|row| row.get(&field.name)).unwrap_or(&default);

            let value = match mode {
                FormMode::View => {
                    let resolved = related.get(&field.name).map(|options| options.as_slice());
                    let stored = row.and_then(|row| row.get(&field.name));
                    format_cell(field, stored, resolved).as_text().to_string()
                }
                _ => input_value(current),
            };

            let options = match &field.kind {
                FieldKind::Enum { options } => options.clone(),
                FieldKind::Relation(_) => related.get(&field.name).cloned().unwrap_or_default(),
                _ => Vec::new(),
            };

            FormFieldView {
                name: field.name.clone(),
                label: field.label.clone(),
                kind: field.kind.clone(),
                value,
                checked: crate::render::list::is_truthy(current),
                options,
                required: field.required,
                error: None,
            }
        })
        .collect();

    FormView {
        table_name: schema.table_name.clone(),
        title,
        mode,
        fields: field_views,
        banner: None,
    }
}

fn input_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        // Structured payloads edit as pretty-printed JSON text
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Which mutation a submission performs
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAction {
    Create,
    Update(RowId),
}

/// Run the submission pipeline: validate, then insert or update.
///
/// Validation failures never reach the gateway.
pub async fn submit_row<G>(
    gateway: &G,
    schema: &TableSchema,
    action: &SubmitAction,
    raw: &Row,
) -> Result<Row, Error>
where
    G: CrudGateway + ?Sized,
{
    let values = validate_row(schema, raw).map_err(Error::Validation)?;

    let stored = match action {
        SubmitAction::Create => gateway.insert(&schema.table_name, &values).await?,
        SubmitAction::Update(id) => gateway.update(&schema.table_name, id, &values).await?,
    };
    Ok(stored)
}

/// Submit and, on success, perform the single re-fetch of the table's rows
/// that refreshes the list.
pub async fn submit_and_refresh<G>(
    gateway: &G,
    schema: &TableSchema,
    action: &SubmitAction,
    raw: &Row,
) -> Result<Vec<Row>, Error>
where
    G: CrudGateway + ?Sized,
{
    submit_row(gateway, schema, action, raw).await?;
    let rows = gateway.fetch_all(&schema.table_name).await?;
    Ok(rows)
}

/// Delete a row and perform the single refreshing re-fetch
pub async fn delete_and_refresh<G>(
    gateway: &G,
    schema: &TableSchema,
    id: &RowId,
) -> Result<Vec<Row>, Error>
where
    G: CrudGateway + ?Sized,
{
    gateway.delete(&schema.table_name, id).await?;
    let rows = gateway.fetch_all(&schema.table_name).await?;
    Ok(rows)
}

/// Resolve the options for every relation field of a schema.
///
/// One task per relation, joined structurally: a failed relation degrades
/// only its own field (the gateway already fails soft), and dropping the
/// join set on page teardown cancels outstanding fetches.
pub async fn load_related_options<G>(
    gateway: &Arc<G>,
    schema: &TableSchema,
) -> HashMap<String, Vec<SelectOption>>
where
    G: CrudGateway,
{
    let mut tasks = JoinSet::new();

    for (field, relation) in schema.relation_fields() {
        let gateway = Arc::clone(gateway);
        let field_name = field.name.clone();
        let relation = relation.clone();
        tasks.spawn(async move {
            let options = gateway
                .fetch_related(&relation.table, &relation.value_field, &relation.label_field)
                .await;
            (field_name, options)
        });
    }

    let mut resolved = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((field_name, options)) => {
                resolved.insert(field_name, options);
            }
            Err(error) => tracing::warn!(%error, "related fetch task failed"),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::traits::DatabaseError;
    use crate::registry::SchemaRegistry;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Spy gateway recording every call it receives
    struct RecordingGateway {
        calls: Mutex<Vec<String>>,
        rows: Vec<Row>,
    }

    impl RecordingGateway {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                rows: Vec::new(),
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CrudGateway for RecordingGateway {
        async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, DatabaseError> {
            self.record(format!("fetch_all:{}", table));
            Ok(self.rows.clone())
        }

        async fn fetch_related(
            &self,
            table: &str,
            _value_field: &str,
            _label_field: &str,
        ) -> Vec<SelectOption> {
            self.record(format!("fetch_related:{}", table));
            if table == "klanten" {
                vec![SelectOption::new(42, "Jan")]
            } else {
                Vec::new()
            }
        }

        async fn insert(&self, table: &str, values: &Row) -> Result<Row, DatabaseError> {
            self.record(format!("insert:{}", table));
            let mut stored = values.clone();
            stored.insert("id".into(), json!(1));
            Ok(stored)
        }

        async fn update(
            &self,
            table: &str,
            _id: &RowId,
            values: &Row,
        ) -> Result<Row, DatabaseError> {
            self.record(format!("update:{}", table));
            Ok(values.clone())
        }

        async fn delete(&self, table: &str, _id: &RowId) -> Result<(), DatabaseError> {
            self.record(format!("delete:{}", table));
            Ok(())
        }
    }

    fn raw(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_invalid_submission_never_reaches_gateway() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();
        let gateway = RecordingGateway::new();

        let error = submit_and_refresh(
            &gateway,
            schema,
            &SubmitAction::Create,
            &raw(&[("naam", json!("")), ("email", json!("not-an-email"))]),
        )
        .await
        .unwrap_err();

        match error {
            Error::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().any(|error| error.field == "naam"));
                assert!(errors.iter().any(|error| error.field == "email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_successful_create_refreshes_exactly_once() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();
        let gateway = RecordingGateway::new();

        submit_and_refresh(
            &gateway,
            schema,
            &SubmitAction::Create,
            &raw(&[
                ("naam", json!("Jan de Vries")),
                ("email", json!("jan@example.com")),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(
            gateway.calls(),
            vec!["insert:klanten".to_string(), "fetch_all:klanten".to_string()]
        );
    }

    #[tokio::test]
    async fn test_successful_update_refreshes_exactly_once() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();
        let gateway = RecordingGateway::new();

        submit_and_refresh(
            &gateway,
            schema,
            &SubmitAction::Update(RowId::Int(1)),
            &raw(&[
                ("naam", json!("Jan de Vries")),
                ("email", json!("jan@example.com")),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(
            gateway.calls(),
            vec!["update:klanten".to_string(), "fetch_all:klanten".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_refreshes_exactly_once() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();
        let gateway = RecordingGateway::new();

        delete_and_refresh(&gateway, schema, &RowId::Int(7)).await.unwrap();

        assert_eq!(
            gateway.calls(),
            vec!["delete:klanten".to_string(), "fetch_all:klanten".to_string()]
        );
    }

    #[tokio::test]
    async fn test_related_options_resolve_per_field_in_isolation() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("gesprekken").unwrap();
        let gateway = Arc::new(RecordingGateway::new());

        let related = load_related_options(&gateway, schema).await;

        // All four relation fields resolved; only klanten has options, the
        // others degraded to empty without affecting it.
        assert_eq!(related.len(), 4);
        assert_eq!(related["klant_id"], vec![SelectOption::new(42, "Jan")]);
        assert!(related["verkoper_id"].is_empty());
        assert!(related["campagne_id"].is_empty());
        assert!(related["regio_id"].is_empty());
    }

    #[test]
    fn test_create_form_prefills_defaults() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("regio").unwrap();

        let form = build_form(schema, FormMode::Create, None, &HashMap::new());
        assert_eq!(form.title, "Toevoegen Regio");

        // System columns never appear in the form
        assert!(form.fields.iter().all(|field| field.name != "id"));
        assert!(form.fields.iter().all(|field| field.name != "aangemaakt_op"));

        let naam = form.fields.iter().find(|field| field.name == "naam").unwrap();
        assert_eq!(naam.value, "");
        assert!(naam.required);

        let actief = form.fields.iter().find(|field| field.name == "actief").unwrap();
        assert!(!actief.checked);
    }

    #[test]
    fn test_edit_form_prefills_from_row() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();

        let row = raw(&[
            ("id", json!(3)),
            ("naam", json!("Jan de Vries")),
            ("email", json!("jan@example.com")),
            ("regio_id", json!(2)),
        ]);

        let mut related = HashMap::new();
        related.insert(
            "regio_id".to_string(),
            vec![SelectOption::new(2, "Noord")],
        );

        let form = build_form(schema, FormMode::Edit, Some(&row), &related);
        assert_eq!(form.title, "Bewerken Klant");

        let naam = form.fields.iter().find(|field| field.name == "naam").unwrap();
        assert_eq!(naam.value, "Jan de Vries");

        let regio = form.fields.iter().find(|field| field.name == "regio_id").unwrap();
        assert_eq!(regio.value, "2");
        assert_eq!(regio.options, vec![SelectOption::new(2, "Noord")]);
    }

    #[test]
    fn test_view_mode_projects_formatted_values() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();

        let row = raw(&[
            ("id", json!(3)),
            ("naam", json!("Jan de Vries")),
            ("regio_id", json!(2)),
        ]);
        let mut related = HashMap::new();
        related.insert(
            "regio_id".to_string(),
            vec![SelectOption::new(2, "Noord")],
        );

        let form = build_form(schema, FormMode::View, Some(&row), &related);

        // View mode includes system columns and resolves relation labels
        let id = form.fields.iter().find(|field| field.name == "id").unwrap();
        assert_eq!(id.value, "3");
        let regio = form.fields.iter().find(|field| field.name == "regio_id").unwrap();
        assert_eq!(regio.value, "Noord");
        // Absent values project as a dash
        let email = form.fields.iter().find(|field| field.name == "email").unwrap();
        assert_eq!(email.value, "-");
    }

    #[test]
    fn test_apply_errors_attaches_messages() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("regio").unwrap();

        let form = build_form(schema, FormMode::Create, None, &HashMap::new()).apply_errors(&[
            FieldError {
                field: "naam".to_string(),
                message: "Naam is verplicht".to_string(),
            },
        ]);

        let naam = form.fields.iter().find(|field| field.name == "naam").unwrap();
        assert_eq!(naam.error.as_deref(), Some("Naam is verplicht"));
    }
}
