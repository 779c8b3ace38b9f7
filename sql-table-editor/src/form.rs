//! Typed form descriptions for add/edit dialogs
//!
//! One field per writable column. Each column name is sanitized into a safe
//! field identifier, and submitted values are mapped back to the exact
//! column names.

use crate::schema::{
    parse_bool, DataType, FieldValue, FieldValueMap, Row, TableSchema,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Input control kind, decided once per column from its data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Boolean,
    Text,
}

impl From<DataType> for FieldKind {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Boolean => FieldKind::Boolean,
            _ => FieldKind::Text,
        }
    }
}

/// A field's value as shown in, or submitted from, a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldInput {
    Checked(bool),
    Text(String),
}

/// Description of one form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Sanitized identifier: letters, digits and underscores, never starting with a digit
    pub identifier: String,

    /// Exact column name the field writes to
    pub column: String,

    pub kind: FieldKind,

    pub data_type: DataType,

    pub nullable: bool,

    /// Value the control starts with
    pub initial: FieldInput,
}

/// Turn a column name into a field identifier
///
/// Characters outside `[A-Za-z0-9_]` become `_`; a result that is empty or
/// starts with a digit gets a leading `_`.
pub fn sanitize_identifier(column: &str) -> String {
    let mut identifier: String = column
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || character == '_' {
                character
            } else {
                '_'
            }
        })
        .collect();

    if identifier
        .chars()
        .next()
        .map_or(true, |first| first.is_ascii_digit())
    {
        identifier.insert(0, '_');
    }

    identifier
}

/// Build the fields for an add form, or an edit form seeded from `existing`
///
/// Auto-generated columns get no field. Fails with
/// [`Error::AmbiguousFieldName`] when two columns sanitize to the same identifier.
pub fn build_fields(schema: &TableSchema, existing: Option<&Row>) -> Result<Vec<FieldSpec>> {
    let mut claimed: HashMap<String, &str> = HashMap::new();
    let mut fields = Vec::new();

    for column in schema.columns.iter().filter(|column| !column.is_auto_generated) {
        let identifier = sanitize_identifier(&column.name);
        if let Some(first) = claimed.insert(identifier.clone(), &column.name) {
            return Err(Error::AmbiguousFieldName {
                identifier,
                first: first.to_string(),
                second: column.name.clone(),
            });
        }

        let kind = FieldKind::from(column.data_type);
        let current = existing.and_then(|row| row.get(&column.name));
        let initial = match kind {
            FieldKind::Boolean => {
                FieldInput::Checked(current.and_then(|value| value.as_bool()).unwrap_or(false))
            }
            FieldKind::Text => {
                FieldInput::Text(current.map(|value| value.render()).unwrap_or_default())
            }
        };

        fields.push(FieldSpec {
            identifier,
            column: column.name.clone(),
            kind,
            data_type: column.data_type,
            nullable: column.nullable,
            initial,
        });
    }

    tracing::debug!(table = %schema.name, fields = fields.len(), "Built form fields");
    Ok(fields)
}

/// Map submitted field values back to column names
///
/// Every field yields a value: blank text becomes NULL and an unchecked or
/// absent boolean becomes `false`. Identifiers that are not among `fields`
/// are rejected.
pub fn collect_values(
    fields: &[FieldSpec],
    submitted: &BTreeMap<String, Option<FieldInput>>,
) -> Result<FieldValueMap> {
    if let Some(unknown) = submitted
        .keys()
        .find(|identifier| !fields.iter().any(|field| &field.identifier == *identifier))
    {
        return Err(Error::UnknownField(unknown.clone()));
    }

    let mut values = FieldValueMap::new();

    for field in fields {
        let input = submitted.get(&field.identifier).and_then(Option::as_ref);
        let value = match field.kind {
            FieldKind::Text => match input {
                Some(FieldInput::Text(text)) if !text.trim().is_empty() => {
                    FieldValue::Text(text.clone())
                }
                Some(FieldInput::Checked(flag)) => FieldValue::Text(flag.to_string()),
                _ => FieldValue::Null,
            },
            FieldKind::Boolean => FieldValue::Boolean(match input {
                Some(FieldInput::Checked(flag)) => *flag,
                Some(FieldInput::Text(text)) => parse_bool(text).unwrap_or(false),
                None => false,
            }),
        };
        values.insert(field.column.clone(), value);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDefinition, Value};

    fn column(name: &str, data_type: DataType, auto: bool) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            data_type,
            declared_type: String::new(),
            nullable: true,
            is_auto_generated: auto,
            is_primary_key: auto,
        }
    }

    fn schema(columns: Vec<ColumnDefinition>) -> TableSchema {
        TableSchema {
            name: "people".to_string(),
            columns,
            primary_key: Vec::new(),
        }
    }

    fn is_valid_identifier(identifier: &str) -> bool {
        let mut characters = identifier.chars();
        matches!(characters.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
            && characters.all(|character| character.is_ascii_alphanumeric() || character == '_')
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("name"), "name");
        assert_eq!(sanitize_identifier("first name"), "first_name");
        assert_eq!(sanitize_identifier("2nd-place"), "_2nd_place");
        assert_eq!(sanitize_identifier("prix (€)"), "prix____");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn test_sanitized_names_are_valid_and_map_back() {
        let names = ["first name", "e-mail", "1st", "a.b", "Ünïcode", "ok_1"];
        let schema = schema(
            names
                .iter()
                .map(|name| column(name, DataType::Text, false))
                .collect(),
        );
        let fields = build_fields(&schema, None).unwrap();

        let submitted: BTreeMap<_, _> = fields
            .iter()
            .map(|field| {
                assert!(is_valid_identifier(&field.identifier), "{}", field.identifier);
                (field.identifier.clone(), Some(FieldInput::Text(format!("v {}", field.column))))
            })
            .collect();
        let values = collect_values(&fields, &submitted).unwrap();

        for name in names {
            assert_eq!(values.get(name), Some(&FieldValue::Text(format!("v {name}"))));
        }
    }

    #[test]
    fn test_colliding_names_are_ambiguous() {
        let schema = schema(vec![
            column("first name", DataType::Text, false),
            column("first-name", DataType::Text, false),
        ]);
        let error = build_fields(&schema, None).unwrap_err();
        assert!(matches!(
            error,
            Error::AmbiguousFieldName { identifier, first, second }
                if identifier == "first_name" && first == "first name" && second == "first-name"
        ));
    }

    #[test]
    fn test_build_fields_skips_generated_and_keeps_order() {
        let schema = schema(vec![
            column("id", DataType::Integer, true),
            column("name", DataType::Text, false),
            column("active", DataType::Boolean, false),
        ]);
        let fields = build_fields(&schema, None).unwrap();

        let columns: Vec<_> = fields.iter().map(|field| field.column.as_str()).collect();
        assert_eq!(columns, vec!["name", "active"]);
        assert_eq!(fields[0].kind, FieldKind::Text);
        assert_eq!(fields[0].initial, FieldInput::Text(String::new()));
        assert_eq!(fields[1].kind, FieldKind::Boolean);
        assert_eq!(fields[1].initial, FieldInput::Checked(false));
    }

    #[test]
    fn test_build_fields_seeds_from_existing_row() {
        let schema = schema(vec![
            column("name", DataType::Text, false),
            column("age", DataType::Integer, false),
            column("active", DataType::Boolean, false),
            column("note", DataType::Text, false),
        ]);
        let row: Row = [
            ("name", Value::Text("Ada".into())),
            ("age", Value::Integer(36)),
            ("active", Value::Integer(1)),
            ("note", Value::Null),
        ]
        .into_iter()
        .collect();

        let fields = build_fields(&schema, Some(&row)).unwrap();
        let initial: Vec<_> = fields.iter().map(|field| field.initial.clone()).collect();
        assert_eq!(
            initial,
            vec![
                FieldInput::Text("Ada".into()),
                FieldInput::Text("36".into()),
                FieldInput::Checked(true),
                FieldInput::Text(String::new()),
            ]
        );
    }

    #[test]
    fn test_collect_values_blank_and_unchecked() {
        let schema = schema(vec![
            column("name", DataType::Text, false),
            column("note", DataType::Text, false),
            column("active", DataType::Boolean, false),
            column("admin", DataType::Boolean, false),
        ]);
        let fields = build_fields(&schema, None).unwrap();

        let mut submitted = BTreeMap::new();
        submitted.insert("name".to_string(), Some(FieldInput::Text("   ".into())));
        submitted.insert("active".to_string(), None);
        submitted.insert("admin".to_string(), Some(FieldInput::Checked(true)));

        let values = collect_values(&fields, &submitted).unwrap();
        assert_eq!(values.get("name"), Some(&FieldValue::Null));
        assert_eq!(values.get("note"), Some(&FieldValue::Null));
        assert_eq!(values.get("active"), Some(&FieldValue::Boolean(false)));
        assert_eq!(values.get("admin"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_collect_values_rejects_unknown_field() {
        let schema = schema(vec![column("name", DataType::Text, false)]);
        let fields = build_fields(&schema, None).unwrap();

        let mut submitted = BTreeMap::new();
        submitted.insert("nickname".to_string(), Some(FieldInput::Text("x".into())));

        assert!(matches!(
            collect_values(&fields, &submitted),
            Err(Error::UnknownField(identifier)) if identifier == "nickname"
        ));
    }
}
