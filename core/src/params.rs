//! Parameter mappings shared by the resolver, serializer and signers.
//!
//! Parameters are JSON objects so the same mapping can become a JSON body
//! unchanged. When a mapping has to be flattened into `key=value` pairs (query
//! strings, form bodies, OAuth1 signature bases) each value is rendered by
//! `value_strings`.

use serde_json::{Map, Value};

/// A parameter mapping, ordered by key.
pub type Params = Map<String, Value>;

/// Render one parameter value as the strings it contributes to a flat
/// `key=value` list. Arrays repeat the key once per element.
pub fn value_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(scalar_string).collect(),
        other => vec![scalar_string(other)],
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested structures have no flat encoding; send them as compact JSON.
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Flatten a mapping into `(key, value)` pairs.
pub fn to_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .flat_map(|(key, value)| {
            value_strings(value)
                .into_iter()
                .map(move |v| (key.clone(), v))
        })
        .collect()
}

/// Overlay `overrides` onto `defaults`; a key present in both takes the
/// override's value.
pub fn merge(defaults: &Params, overrides: Option<&Params>) -> Params {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn scalars_render_without_json_quoting() {
        assert_eq!(value_strings(&json!("x")), vec!["x"]);
        assert_eq!(value_strings(&json!(42)), vec!["42"]);
        assert_eq!(value_strings(&json!(true)), vec!["true"]);
        assert_eq!(value_strings(&json!(null)), vec![""]);
    }

    #[test]
    fn arrays_repeat_and_objects_stay_json() {
        assert_eq!(value_strings(&json!([1, "b"])), vec!["1", "b"]);
        assert_eq!(value_strings(&json!({"a": 1})), vec![r#"{"a":1}"#]);
    }

    #[test]
    fn pairs_are_ordered_by_key() {
        let pairs = to_pairs(&params(json!({"b": "2", "a": ["1", "3"]})));
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn overrides_win_and_defaults_survive() {
        let defaults = params(json!({"app": "demo", "name": "default"}));
        let merged = merge(&defaults, Some(&params(json!({"name": "a"}))));
        assert_eq!(Value::Object(merged), json!({"app": "demo", "name": "a"}));
    }

    #[test]
    fn absent_overrides_leave_defaults() {
        let defaults = params(json!({"app": "demo"}));
        assert_eq!(merge(&defaults, None), defaults);
    }
}
