use crate::coerce::{coerce_number, first_number};
use crate::model::{ColumnElement, Feature};
use serde_json::{Map, Value};

/// One result object as returned by the analysis service.
pub type RawElementRecord = Map<String, Value>;

/// Fields consulted, in order, when resolving an element's prediction.
pub const PREDICTION_SOURCES: [&str; 3] = ["prediction", "tilt_ratio", "tilt_class"];

pub const UNKNOWN_ID: &str = "unknown";

pub fn normalize_record(record: &RawElementRecord) -> ColumnElement {
    let mut element = ColumnElement::new(element_id(record));
    element.prediction = first_number(record, &PREDICTION_SOURCES);
    element.tilt_ratio = coerce_number(record.get("tilt_ratio"));
    element.tilt_class = display_text(record.get("tilt_class"));
    element.leaning_status = display_text(record.get("leaning_status"));
    element.source_file = display_text(record.get("source_file"));

    // Measurements are copied only when they are JSON numbers; numeric
    // strings are not coerced here.
    for feature in Feature::ALL {
        let value = record.get(feature.name()).and_then(Value::as_f64);
        element.measurements.set(feature, value);
    }

    element
}

pub fn normalize_all(records: &[RawElementRecord]) -> Vec<ColumnElement> {
    records.iter().map(normalize_record).collect()
}

fn element_id(record: &RawElementRecord) -> String {
    match record.get("element_id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_ID.to_string(),
    }
}

fn display_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
