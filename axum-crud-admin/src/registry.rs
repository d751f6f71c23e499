//! Schema registry
//!
//! Static mapping from a table key to its [`TableSchema`]. The registry is
//! built once at process start, checked for internal consistency, and never
//! mutated afterwards. [`SchemaRegistry::crm`] provides the built-in
//! sales/CRM dataset.

use crate::schema::{FieldDescriptor, FieldKind, Relation, SelectOption, TableSchema};
use crate::Error;

/// Creation-timestamp column used by the domain tables. Tables with a
/// different convention (the logs table) override it per schema.
pub const DEFAULT_CREATED_COLUMN: &str = "aangemaakt_op";

/// Registry of all administrable table schemas, in navigation order
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<TableSchema>,
}

impl SchemaRegistry {
    /// Build a registry from the given schemas, verifying consistency:
    /// field names must be unique per schema, every relation must reference
    /// a registered schema, and the ordering column must exist as a field.
    pub fn new(schemas: Vec<TableSchema>) -> Result<Self, Error> {
        for schema in &schemas {
            for (index, field) in schema.fields.iter().enumerate() {
                if schema.fields[..index]
                    .iter()
                    .any(|other| other.name == field.name)
                {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate field '{}' in schema '{}'",
                        field.name, schema.table_name
                    )));
                }
            }

            for (field, relation) in schema.relation_fields() {
                if !schemas
                    .iter()
                    .any(|other| other.table_name == relation.table)
                {
                    return Err(Error::InvalidSchema(format!(
                        "field '{}' in schema '{}' references unregistered table '{}'",
                        field.name, schema.table_name, relation.table
                    )));
                }
            }

            if schema.field(&schema.created_column).is_none() {
                return Err(Error::InvalidSchema(format!(
                    "ordering column '{}' is not a field of schema '{}'",
                    schema.created_column, schema.table_name
                )));
            }
        }

        Ok(Self { schemas })
    }

    /// Look up a schema by its table key
    pub fn lookup(&self, key: &str) -> Result<&TableSchema, Error> {
        self.schemas
            .iter()
            .find(|schema| schema.table_name == key)
            .ok_or_else(|| Error::SchemaNotFound(key.to_string()))
    }

    /// The ordering column for a table, falling back to the domain default
    /// for tables that are not registered.
    pub fn created_column(&self, table: &str) -> &str {
        self.schemas
            .iter()
            .find(|schema| schema.table_name == table)
            .map(|schema| schema.created_column.as_str())
            .unwrap_or(DEFAULT_CREATED_COLUMN)
    }

    /// All registered schemas in navigation order
    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.schemas.iter()
    }

    /// The built-in sales/CRM dataset
    pub fn crm() -> Self {
        Self::new(crm_schemas()).expect("built-in CRM schemas are consistent")
    }
}

fn status_options(values: &[(&str, &str)]) -> Vec<SelectOption> {
    values
        .iter()
        .map(|(value, label)| SelectOption::new(*value, *label))
        .collect()
}

fn system_timestamps() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("aangemaakt_op", "Aangemaakt op", FieldKind::DateTime).system(),
        FieldDescriptor::new("bijgewerkt_op", "Bijgewerkt op", FieldKind::DateTime).system(),
    ]
}

fn numeric_id() -> FieldDescriptor {
    FieldDescriptor::new("id", "ID", FieldKind::Number).system()
}

fn crm_schemas() -> Vec<TableSchema> {
    let mut schemas = Vec::new();

    let mut regio_fields = vec![
        numeric_id(),
        FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
        FieldDescriptor::new("code", "Code", FieldKind::Text).required(),
        FieldDescriptor::new("beschrijving", "Beschrijving", FieldKind::Textarea),
        FieldDescriptor::new("actief", "Actief", FieldKind::Boolean),
    ];
    regio_fields.extend(system_timestamps());
    schemas.push(TableSchema::new("regio", "Regio", regio_fields));

    let mut klanten_fields = vec![
        numeric_id(),
        FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
        FieldDescriptor::new("email", "Email", FieldKind::Email).required(),
        FieldDescriptor::new("telefoon", "Telefoon", FieldKind::Text),
        FieldDescriptor::new("adres", "Adres", FieldKind::Textarea),
        FieldDescriptor::new(
            "regio_id",
            "Regio",
            FieldKind::Relation(Relation::new("regio", "id", "naam")),
        ),
        FieldDescriptor::new(
            "status",
            "Status",
            FieldKind::Enum {
                options: status_options(&[
                    ("actief", "Actief"),
                    ("inactief", "Inactief"),
                    ("prospect", "Prospect"),
                ]),
            },
        ),
    ];
    klanten_fields.extend(system_timestamps());
    schemas.push(TableSchema::new("klanten", "Klant", klanten_fields));

    let mut verkopers_fields = vec![
        numeric_id(),
        FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
        FieldDescriptor::new("email", "Email", FieldKind::Email).required(),
        FieldDescriptor::new("telefoon", "Telefoon", FieldKind::Text),
        FieldDescriptor::new(
            "regio_id",
            "Regio",
            FieldKind::Relation(Relation::new("regio", "id", "naam")),
        ),
        FieldDescriptor::new("commissie_percentage", "Commissie %", FieldKind::Number),
        FieldDescriptor::new("actief", "Actief", FieldKind::Boolean),
    ];
    verkopers_fields.extend(system_timestamps());
    schemas.push(TableSchema::new("verkopers", "Verkoper", verkopers_fields));

    let mut campagnes_fields = vec![
        numeric_id(),
        FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
        FieldDescriptor::new("beschrijving", "Beschrijving", FieldKind::Textarea),
        FieldDescriptor::new("start_datum", "Start Datum", FieldKind::Date),
        FieldDescriptor::new("eind_datum", "Eind Datum", FieldKind::Date),
        FieldDescriptor::new(
            "status",
            "Status",
            FieldKind::Enum {
                options: status_options(&[
                    ("actief", "Actief"),
                    ("inactief", "Inactief"),
                    ("voltooid", "Voltooid"),
                ]),
            },
        ),
    ];
    campagnes_fields.extend(system_timestamps());
    schemas.push(TableSchema::new("campagnes", "Campagne", campagnes_fields));

    let mut gesprekken_fields = vec![
        numeric_id(),
        FieldDescriptor::new(
            "klant_id",
            "Klant",
            FieldKind::Relation(Relation::new("klanten", "id", "naam")),
        )
        .required(),
        FieldDescriptor::new(
            "verkoper_id",
            "Verkoper",
            FieldKind::Relation(Relation::new("verkopers", "id", "naam")),
        )
        .required(),
        FieldDescriptor::new(
            "campagne_id",
            "Campagne",
            FieldKind::Relation(Relation::new("campagnes", "id", "naam")),
        ),
        FieldDescriptor::new(
            "regio_id",
            "Regio",
            FieldKind::Relation(Relation::new("regio", "id", "naam")),
        ),
        FieldDescriptor::new("datum", "Datum", FieldKind::Date).required(),
        FieldDescriptor::new("notities", "Notities", FieldKind::Textarea),
        FieldDescriptor::new(
            "status",
            "Status",
            FieldKind::Enum {
                options: status_options(&[
                    ("gepland", "Gepland"),
                    ("voltooid", "Voltooid"),
                    ("geannuleerd", "Geannuleerd"),
                ]),
            },
        ),
    ];
    gesprekken_fields.extend(system_timestamps());
    schemas.push(TableSchema::new("gesprekken", "Gesprek", gesprekken_fields));

    let mut belschema_fields = vec![
        numeric_id(),
        FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
        FieldDescriptor::new("beschrijving", "Beschrijving", FieldKind::Textarea),
        FieldDescriptor::new("actief", "Actief", FieldKind::Boolean),
    ];
    belschema_fields.extend(system_timestamps());
    schemas.push(TableSchema::new("belschema", "Belschema", belschema_fields));

    let mut call_scripts_fields = vec![
        numeric_id(),
        FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
        FieldDescriptor::new("script", "Script", FieldKind::Textarea).required(),
        FieldDescriptor::new("actief", "Actief", FieldKind::Boolean),
    ];
    call_scripts_fields.extend(system_timestamps());
    schemas.push(TableSchema::new(
        "call_scripts",
        "Call Script",
        call_scripts_fields,
    ));

    let mut admin_users_fields = vec![
        numeric_id(),
        FieldDescriptor::new("email", "Email", FieldKind::Email).required(),
        FieldDescriptor::new("naam", "Naam", FieldKind::Text).required(),
        FieldDescriptor::new(
            "rol",
            "Rol",
            FieldKind::Enum {
                options: status_options(&[
                    ("admin", "Administrator"),
                    ("manager", "Manager"),
                    ("user", "Gebruiker"),
                ]),
            },
        )
        .required(),
        FieldDescriptor::new("actief", "Actief", FieldKind::Boolean),
    ];
    admin_users_fields.extend(system_timestamps());
    schemas.push(TableSchema::new(
        "admin_users",
        "Admin Gebruiker",
        admin_users_fields,
    ));

    // The logs table comes from another pipeline and keeps its own column
    // convention, hence the ordering override.
    schemas.push(
        TableSchema::new(
            "logs",
            "Log",
            vec![
                FieldDescriptor::new("id", "ID", FieldKind::Uuid).system(),
                FieldDescriptor::new("type", "Type", FieldKind::Text).required(),
                FieldDescriptor::new("status", "Status", FieldKind::Text).required(),
                FieldDescriptor::new("message", "Message", FieldKind::Textarea).required(),
                FieldDescriptor::new("data", "Data", FieldKind::Textarea),
                FieldDescriptor::new("created_at", "Aangemaakt op", FieldKind::Timestamp).system(),
                FieldDescriptor::new("user_id", "User ID", FieldKind::Text),
                FieldDescriptor::new("ip", "IP", FieldKind::Text),
                FieldDescriptor::new("device", "Device", FieldKind::Text),
                FieldDescriptor::new("region", "Region", FieldKind::Text),
                FieldDescriptor::new("twilio_sid", "Twilio SID", FieldKind::Text),
            ],
        )
        .ordered_by("created_at"),
    );

    let mut instellingen_fields = vec![
        numeric_id(),
        FieldDescriptor::new("key", "Key", FieldKind::Text).required(),
        FieldDescriptor::new("value", "Value", FieldKind::Text).required(),
        FieldDescriptor::new("beschrijving", "Beschrijving", FieldKind::Textarea),
    ];
    instellingen_fields.extend(system_timestamps());
    schemas.push(TableSchema::new(
        "instellingen",
        "Instelling",
        instellingen_fields,
    ));

    schemas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crm_registry_is_consistent() {
        // Exercises the full static consistency check: unique field names,
        // resolvable relations, existing ordering columns.
        let registry = SchemaRegistry::crm();
        assert!(registry.iter().count() >= 10);
    }

    #[test]
    fn test_lookup_unknown_key_fails() {
        let registry = SchemaRegistry::crm();
        let error = registry.lookup("facturen").unwrap_err();
        assert!(matches!(error, Error::SchemaNotFound(_)));
    }

    #[test]
    fn test_every_relation_resolves_to_registered_schema() {
        let registry = SchemaRegistry::crm();
        for schema in registry.iter() {
            for (_, relation) in schema.relation_fields() {
                assert!(
                    registry.lookup(&relation.table).is_ok(),
                    "relation target '{}' missing",
                    relation.table
                );
            }
        }
    }

    #[test]
    fn test_logs_orders_by_created_at() {
        let registry = SchemaRegistry::crm();
        assert_eq!(registry.created_column("logs"), "created_at");
        assert_eq!(registry.created_column("klanten"), "aangemaakt_op");
        // Unknown tables fall back to the domain default
        assert_eq!(registry.created_column("facturen"), DEFAULT_CREATED_COLUMN);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let schema = TableSchema::new(
            "dubbel",
            "Dubbel",
            vec![
                FieldDescriptor::new("naam", "Naam", FieldKind::Text),
                FieldDescriptor::new("naam", "Naam", FieldKind::Text),
            ],
        )
        .ordered_by("naam");

        let error = SchemaRegistry::new(vec![schema]).unwrap_err();
        assert!(matches!(error, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_unregistered_relation_rejected() {
        let schema = TableSchema::new(
            "orders",
            "Orders",
            vec![
                FieldDescriptor::new(
                    "klant_id",
                    "Klant",
                    FieldKind::Relation(Relation::new("klanten", "id", "naam")),
                ),
                FieldDescriptor::new("aangemaakt_op", "Aangemaakt op", FieldKind::DateTime)
                    .system(),
            ],
        );

        let error = SchemaRegistry::new(vec![schema]).unwrap_err();
        assert!(matches!(error, Error::InvalidSchema(_)));
    }
}
