//! JSON codec for document state.
//!
//! Converts a [`State`] to and from `serde_json::Value`, used for
//! diagnostics, `Display`, and fixtures.
//!
//! Decoding rules:
//! - integers that fit in `i64` become [`Scalar::Long`], other numbers
//!   [`Scalar::Double`];
//! - a JSON array holding at least one object becomes a
//!   [`StateValue::List`], any other array a [`StateValue::Array`];
//! - `null` object members are dropped, as a State never stores nulls.
//!
//! Dates encode as RFC 3339 strings and therefore decode as strings.

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use crate::error::StateError;
use crate::state::State;
use crate::value::{Scalar, StateValue};

// ── Serialization ─────────────────────────────────────────────────────────

pub fn to_json(state: &State) -> Value {
    let mut map = Map::with_capacity(state.len());
    for (k, v) in state.iter() {
        map.insert(k.clone(), value_to_json(v));
    }
    Value::Object(map)
}

pub fn value_to_json(value: &StateValue) -> Value {
    match value {
        StateValue::Null => Value::Null,
        StateValue::Scalar(s) => scalar_to_json(s),
        StateValue::State(s) => to_json(s),
        StateValue::Array(items) | StateValue::List(items) => Value::Array(items.iter().map(value_to_json).collect()),
        StateValue::Delta(d) => match d.full_value() {
            Ok(full) => scalar_to_json(&full),
            Err(_) => scalar_to_json(&Scalar::Double(d.as_f64())),
        },
    }
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::String(s) => Value::String(s.clone()),
        Scalar::Long(n) => Value::Number((*n).into()),
        Scalar::Double(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        Scalar::Boolean(b) => Value::Bool(*b),
        Scalar::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

// ── Deserialization ───────────────────────────────────────────────────────

/// Decodes a JSON object into a State.
pub fn from_json(value: &Value) -> Result<State, StateError> {
    match value {
        Value::Object(map) => Ok(state_from_map(map)),
        other => Err(StateError::InvalidJson(format!("expected object, got {other}"))),
    }
}

pub fn value_from_json(value: &Value) -> StateValue {
    match value {
        Value::Null => StateValue::Null,
        Value::Bool(b) => StateValue::boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => StateValue::long(i),
            None => StateValue::double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => StateValue::string(s.as_str()),
        Value::Array(arr) => {
            let items = arr.iter().map(value_from_json).collect();
            if arr.iter().any(Value::is_object) {
                StateValue::List(items)
            } else {
                StateValue::Array(items)
            }
        }
        Value::Object(map) => StateValue::State(state_from_map(map)),
    }
}

fn state_from_map(map: &Map<String, Value>) -> State {
    map.iter().map(|(k, v)| (k.clone(), value_from_json(v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        let s = from_json(&json!({
            "title": "t",
            "n": 3,
            "f": 1.5,
            "flag": true,
            "ids": ["a", "b"],
            "files": [{"name": "x"}],
            "meta": {"k": "v"},
            "gone": null
        }))
        .unwrap();
        assert_eq!(s.get("n"), Some(&StateValue::long(3)));
        assert_eq!(s.get("f"), Some(&StateValue::double(1.5)));
        assert!(matches!(s.get("ids"), Some(StateValue::Array(_))));
        assert!(matches!(s.get("files"), Some(StateValue::List(_))));
        assert!(matches!(s.get("meta"), Some(StateValue::State(_))));
        assert!(!s.contains_key("gone"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(matches!(from_json(&json!([1])), Err(StateError::InvalidJson(_))));
    }

    #[test]
    fn test_to_json_date() {
        let d = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let s = State::new().with("created", d);
        assert_eq!(to_json(&s), json!({"created": "2024-05-01T12:00:00.000Z"}));
    }

    #[test]
    fn test_display() {
        let s = State::new().with("a", 1i64);
        assert_eq!(s.to_string(), r#"{"a":1}"#);
    }
}
