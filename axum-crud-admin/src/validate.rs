//! Validation contract
//!
//! [`validate_row`] is the parser between a raw value map (HTML form fields
//! or a JSON body) and a normalized value map ready for the gateway. It
//! either returns the normalized map or a list of per-field errors in the
//! admin's language. Validation failures never reach the gateway.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::schema::{FieldDescriptor, FieldKind, Row, SelectOption, TableSchema};

/// A single field-level validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,

    /// Human-readable message in the admin's language
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Run the schema's validation contract over a raw value map.
///
/// Only editable fields participate; system columns in the input are
/// ignored. On success the returned map contains every editable field,
/// with empty optional values normalized to null.
pub fn validate_row(schema: &TableSchema, raw: &Row) -> Result<Row, Vec<FieldError>> {
    let mut normalized = Row::new();
    let mut errors = Vec::new();

    for field in schema.editable_fields() {
        match normalize_field(field, raw.get(&field.name)) {
            Ok(value) => {
                normalized.insert(field.name.clone(), value);
            }
            Err(error) => errors.push(error),
        }
    }

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(errors)
    }
}

fn normalize_field(field: &FieldDescriptor, value: Option<&Value>) -> Result<Value, FieldError> {
    let text = coerce_text(value);
    let empty = text.trim().is_empty();

    if empty && field.required && !matches!(field.kind, FieldKind::Boolean) {
        return Err(FieldError::new(
            &field.name,
            format!("{} is verplicht", field.label),
        ));
    }

    match &field.kind {
        FieldKind::Text | FieldKind::Uuid => Ok(if empty {
            Value::Null
        } else {
            Value::String(text)
        }),

        FieldKind::Textarea => Ok(if empty {
            Value::Null
        } else {
            parse_json_leniently(&text)
        }),

        FieldKind::Email => {
            if empty {
                Ok(Value::Null)
            } else if is_valid_email(&text) {
                Ok(Value::String(text))
            } else {
                Err(FieldError::new(&field.name, "Ongeldig email adres"))
            }
        }

        FieldKind::Number => {
            if empty {
                return Ok(Value::Null);
            }
            match value {
                Some(Value::Number(number)) => Ok(Value::Number(number.clone())),
                _ => parse_number(&text).ok_or_else(|| {
                    FieldError::new(&field.name, format!("{} moet een getal zijn", field.label))
                }),
            }
        }

        FieldKind::Boolean => Ok(Value::Bool(coerce_bool(value))),

        FieldKind::Date => {
            if empty {
                return Ok(Value::Null);
            }
            if NaiveDate::parse_from_str(&text, "%Y-%m-%d").is_ok() {
                Ok(Value::String(text))
            } else {
                Err(FieldError::new(&field.name, "Ongeldige datum"))
            }
        }

        // System-managed kinds are never editable, but accept passthrough
        // strings for schemas that expose them.
        FieldKind::DateTime | FieldKind::Timestamp => Ok(if empty {
            Value::Null
        } else {
            Value::String(text)
        }),

        FieldKind::Enum { options } => {
            if empty {
                return Ok(Value::Null);
            }
            if options.iter().any(|option| option_matches(option, &text)) {
                Ok(Value::String(text))
            } else {
                Err(FieldError::new(
                    &field.name,
                    format!("Ongeldige waarde voor {}", field.label),
                ))
            }
        }

        FieldKind::Relation(_) => {
            if empty {
                return Ok(Value::Null);
            }
            match value {
                Some(Value::Number(number)) => Ok(Value::Number(number.clone())),
                // Select inputs submit the id as text; integer keys are
                // stored as numbers, uuid keys stay strings.
                _ => Ok(parse_number(&text).unwrap_or(Value::String(text))),
            }
        }
    }
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_i64().unwrap_or(0) != 0,
        // Checkboxes submit "on" when checked and nothing at all otherwise
        Some(Value::String(text)) => matches!(text.as_str(), "on" | "true" | "1"),
        _ => false,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(integer) = text.trim().parse::<i64>() {
        return Some(Value::Number(integer.into()));
    }
    text.trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn option_matches(option: &SelectOption, text: &str) -> bool {
    match &option.value {
        Value::String(value) => value == text,
        other => other.to_string() == text,
    }
}

/// Opportunistic JSON parse for free-text fields that carry structured
/// payloads (the logs "data" field). Malformed JSON is kept as the raw
/// string rather than rejected.
fn parse_json_leniently(text: &str) -> Value {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<Value>(text) {
            return parsed;
        }
    }
    Value::String(text.to_string())
}

fn is_valid_email(text: &str) -> bool {
    let mut parts = text.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !text.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;
    use serde_json::json;

    fn raw(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_required_empty_field_names_the_field() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("regio").unwrap();

        let errors = validate_row(schema, &raw(&[("naam", json!(""))])).unwrap_err();
        assert!(errors.iter().any(|error| error.field == "naam"));
        assert!(errors
            .iter()
            .any(|error| error.message == "Naam is verplicht"));
    }

    #[test]
    fn test_klanten_empty_name_and_bad_email_yield_two_errors() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();

        let errors = validate_row(
            schema,
            &raw(&[("naam", json!("")), ("email", json!("not-an-email"))]),
        )
        .unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|error| error.field == "naam" && error.message == "Naam is verplicht"));
        assert!(errors
            .iter()
            .any(|error| error.field == "email" && error.message == "Ongeldig email adres"));
    }

    #[test]
    fn test_valid_klant_normalizes() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();

        let normalized = validate_row(
            schema,
            &raw(&[
                ("naam", json!("Jan de Vries")),
                ("email", json!("jan@example.com")),
                ("regio_id", json!("3")),
                ("status", json!("actief")),
            ]),
        )
        .unwrap();

        assert_eq!(normalized["naam"], json!("Jan de Vries"));
        // Select inputs submit ids as text; integer keys become numbers
        assert_eq!(normalized["regio_id"], json!(3));
        // Untouched optional fields normalize to null
        assert_eq!(normalized["telefoon"], Value::Null);
        // System columns never enter the normalized map
        assert!(!normalized.contains_key("id"));
        assert!(!normalized.contains_key("aangemaakt_op"));
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("klanten").unwrap();

        let errors = validate_row(
            schema,
            &raw(&[
                ("naam", json!("Jan")),
                ("email", json!("jan@example.com")),
                ("status", json!("verwijderd")),
            ]),
        )
        .unwrap_err();

        assert!(errors.iter().any(|error| error.field == "status"));
    }

    #[test]
    fn test_number_field_rejects_non_numeric() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("verkopers").unwrap();

        let errors = validate_row(
            schema,
            &raw(&[
                ("naam", json!("Piet")),
                ("email", json!("piet@example.com")),
                ("commissie_percentage", json!("veel")),
            ]),
        )
        .unwrap_err();

        assert!(errors
            .iter()
            .any(|error| error.field == "commissie_percentage"));
    }

    #[test]
    fn test_checkbox_absent_means_false() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("regio").unwrap();

        let normalized = validate_row(
            schema,
            &raw(&[("naam", json!("Noord")), ("code", json!("N"))]),
        )
        .unwrap();
        assert_eq!(normalized["actief"], json!(false));

        let normalized = validate_row(
            schema,
            &raw(&[
                ("naam", json!("Noord")),
                ("code", json!("N")),
                ("actief", json!("on")),
            ]),
        )
        .unwrap();
        assert_eq!(normalized["actief"], json!(true));
    }

    #[test]
    fn test_textarea_json_parsed_leniently() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("logs").unwrap();

        let base = [
            ("type", json!("call")),
            ("status", json!("ok")),
            ("message", json!("gesprek gestart")),
        ];

        // Well-formed JSON becomes a structured value
        let mut input = raw(&base);
        input.insert("data".into(), json!(r#"{"duur": 30}"#));
        let normalized = validate_row(schema, &input).unwrap();
        assert_eq!(normalized["data"], json!({"duur": 30}));

        // Malformed JSON is accepted and kept as the raw string
        let mut input = raw(&base);
        input.insert("data".into(), json!(r#"{"duur": 30"#));
        let normalized = validate_row(schema, &input).unwrap();
        assert_eq!(normalized["data"], json!(r#"{"duur": 30"#));
    }

    #[test]
    fn test_date_format_checked() {
        let registry = SchemaRegistry::crm();
        let schema = registry.lookup("gesprekken").unwrap();

        let errors = validate_row(
            schema,
            &raw(&[
                ("klant_id", json!(1)),
                ("verkoper_id", json!(1)),
                ("datum", json!("morgen")),
            ]),
        )
        .unwrap_err();

        assert!(errors
            .iter()
            .any(|error| error.field == "datum" && error.message == "Ongeldige datum"));
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("jan@example.com"));
        assert!(is_valid_email("a.b@sub.example.nl"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("jan@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jan@nodot"));
        assert!(!is_valid_email("jan @example.com"));
    }
}
