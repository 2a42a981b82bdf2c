use serde_json::{Map, Value};

/// Serialize a parameter map as `key=value` pairs joined by `&`.
///
/// Strings are sent as-is, `null` as an empty value, other scalars and
/// nested values as their compact JSON text. Keys and values are
/// percent-encoded.
pub fn encode(params: &Map<String, Value>) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value_text(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
