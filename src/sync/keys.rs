// The realtime store forbids '/' in keys; offers carry keys like "Light/Views".
use serde_json::{Map, Value};

fn map_keys(value: Value, from: char, to: char) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.replace(from, &to.to_string()), map_keys(v, from, to)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| map_keys(v, from, to)).collect()),
        other => other,
    }
}

/// Replaces `/` with `|` in every object key, recursively.
pub fn sanitize_keys(value: Value) -> Value {
    map_keys(value, '/', '|')
}

/// Inverse of `sanitize_keys`.
pub fn restore_keys(value: Value) -> Value {
    map_keys(value, '|', '/')
}
