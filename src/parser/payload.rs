use std::collections::BTreeSet;

use serde_json::Value;

use super::record::Field;

/// Keyed lookups into an untyped JSON payload.
///
/// A key that is absent, `null`, or holds the wrong kind of value falls
/// back to the caller's sentinel, the same way a missing page region does.
pub trait PayloadExt {
    /// String values as-is; numbers and booleans rendered as text.
    fn get_text_or(&self, key: &str, fallback: &'static str) -> Field<String>;

    /// Numbers, or strings kept verbatim (some payloads quote their counts).
    fn get_number_or(&self, key: &str, fallback: &'static str) -> Field<Value>;

    /// Top-level keys, when the payload is an object.
    fn keys_or(&self, fallback: &'static str) -> Field<BTreeSet<String>>;
}

impl PayloadExt for Value {
    fn get_text_or(&self, key: &str, fallback: &'static str) -> Field<String> {
        match self.get(key) {
            Some(Value::String(s)) => Field::Present(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Field::Present(v.to_string()),
            _ => Field::Missing(fallback),
        }
    }

    fn get_number_or(&self, key: &str, fallback: &'static str) -> Field<Value> {
        match self.get(key) {
            Some(v @ (Value::Number(_) | Value::String(_))) => Field::Present(v.clone()),
            _ => Field::Missing(fallback),
        }
    }

    fn keys_or(&self, fallback: &'static str) -> Field<BTreeSet<String>> {
        match self.as_object() {
            Some(map) => Field::Present(map.keys().cloned().collect()),
            None => Field::Missing(fallback),
        }
    }
}
