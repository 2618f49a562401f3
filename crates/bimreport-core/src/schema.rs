//! Shape check for `/extract_and_predict` responses.
//!
//! Fields may be missing or null (they render as `N/A`), but a field that is
//! present with the wrong JSON type is rejected instead of being silently
//! dropped from the report.

use crate::error::SchemaError;
use crate::model::Feature;
use crate::normalize::RawElementRecord;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Text,
    Number,
    TextOrNumber,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Text, Value::String(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::TextOrNumber, Value::String(_) | Value::Number(_)) => true,
            _ => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldType::Text => "a string",
            FieldType::Number => "a number",
            FieldType::TextOrNumber => "a string or a number",
        }
    }
}

const DECLARED_FIELDS: [(&str, FieldType); 7] = [
    ("element_id", FieldType::TextOrNumber),
    ("prediction", FieldType::TextOrNumber),
    ("tilt_ratio", FieldType::TextOrNumber),
    ("tilt_class", FieldType::TextOrNumber),
    ("leaning_status", FieldType::Text),
    ("source_file", FieldType::Text),
    ("deviation_tolerance", FieldType::Number),
];

/// Extracts the `results` collection, checking every record against the
/// declared field types.
pub fn parse_results(body: &Value) -> Result<Vec<RawElementRecord>, SchemaError> {
    let object = body.as_object().ok_or(SchemaError::NotAnObject)?;
    let results = object
        .get("results")
        .and_then(Value::as_array)
        .ok_or(SchemaError::MissingResults)?;

    results
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let record = item
                .as_object()
                .ok_or(SchemaError::RecordNotAnObject { index })?;
            check_record(index, record)?;
            Ok(record.clone())
        })
        .collect()
}

fn check_record(index: usize, record: &RawElementRecord) -> Result<(), SchemaError> {
    let measurements = Feature::ALL.iter().map(|f| (f.name(), FieldType::Number));
    for (field, ty) in DECLARED_FIELDS.into_iter().chain(measurements) {
        if let Some(value) = record.get(field) {
            if !ty.accepts(value) {
                return Err(SchemaError::InvalidField {
                    index,
                    field: field.to_string(),
                    expected: ty.describe(),
                });
            }
        }
    }
    Ok(())
}
