//! Parse boundary for train tracker JSON payloads.
//!
//! The feed wraps every response in a `ctatt` object and encodes most
//! scalars as strings (`"1"` flags, `"41.93"` coordinates). Everything
//! downstream works with the typed values returned here.

use serde_json::Value;

use crate::error::FeedError;
use crate::fetch::RawPayload;

/// Returns the prediction records of an arrivals payload (`ctatt.eta`).
///
/// # Errors
///
/// Returns [`FeedError::MalformedPayload`] if `ctatt` or `eta` is absent.
pub fn eta_records(payload: &RawPayload) -> Result<Vec<&Value>, FeedError> {
    top_level_list(payload, "eta")
}

/// Returns the per-route entries of a positions payload (`ctatt.route`).
///
/// # Errors
///
/// Returns [`FeedError::MalformedPayload`] if `ctatt` or `route` is absent.
pub fn route_entries(payload: &RawPayload) -> Result<Vec<&Value>, FeedError> {
    top_level_list(payload, "route")
}

/// Vehicles listed under one route entry. A missing `train` key yields none.
pub fn vehicles(route_entry: &Value) -> Vec<&Value> {
    route_entry.get("train").map(one_or_many).unwrap_or_default()
}

fn top_level_list<'a>(payload: &'a RawPayload, key: &str) -> Result<Vec<&'a Value>, FeedError> {
    let ctatt = payload
        .get("ctatt")
        .filter(|v| v.is_object())
        .ok_or_else(|| FeedError::MalformedPayload("missing `ctatt` object".into()))?;

    match ctatt.get(key) {
        Some(list) => Ok(one_or_many(list)),
        None => {
            let reason = match (text_opt(ctatt, "errCd"), text_opt(ctatt, "errNm")) {
                (Some(code), Some(name)) if code != "0" => {
                    format!("missing `ctatt.{key}` (feed error {code}: {name})")
                }
                _ => format!("missing `ctatt.{key}`"),
            };
            Err(FeedError::MalformedPayload(reason))
        }
    }
}

/// The feed collapses single-element lists into a bare object.
fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn text_opt(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String field, or the empty string when absent or not a scalar.
pub fn text(record: &Value, key: &str) -> String {
    text_opt(record, key).unwrap_or_default()
}

/// Raw string field, without coercion.
pub fn raw_str<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Boolean flag encoded as `"1"`, `1` or `true`. Anything else is `false`.
pub fn flag(record: &Value, key: &str) -> bool {
    match record.get(key) {
        Some(Value::String(s)) => s.trim() == "1",
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// Floating-point field, parsed from the number or numeric string.
pub fn float(record: &Value, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer field, parsed from the number or numeric string.
pub fn int(record: &Value, key: &str) -> Option<i64> {
    match record.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
