//! Lenient number extraction for loosely typed service payloads.
//!
//! Absence is a normal result here: anything that is not a finite number (or
//! a string holding one) comes back as `None` instead of an error.

use serde_json::{Map, Value};

pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_finite(s),
        _ => None,
    }
}

/// Returns the first field in `sources` whose value coerces to a finite number.
pub fn first_number(record: &Map<String, Value>, sources: &[&str]) -> Option<f64> {
    sources
        .iter()
        .find_map(|field| coerce_number(record.get(*field)))
}

fn parse_finite(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
