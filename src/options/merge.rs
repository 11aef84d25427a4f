//! Merge helpers for options objects.
//!
//! Config tiers merge deep: higher tier values override lower tier values
//! field by field, arrays are replaced entirely. Fragment options merge
//! shallow: a key set by the user replaces the default for that key wholesale.

use crate::types::OptionsRecord;
use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use rulestack::options::deep_merge;
///
/// let project = json!({
///     "stylistic": { "indent": 2, "quotes": "single" },
///     "ignores": ["dist/**"]
/// });
/// let user = json!({
///     "stylistic": { "indent": 4 },
///     "ignores": ["out/**"]
/// });
/// let merged = deep_merge(project, user);
/// assert_eq!(merged["stylistic"], json!({ "indent": 4, "quotes": "single" }));
/// assert_eq!(merged["ignores"], json!(["out/**"]));
/// ```
///
/// Keys keep the position they first had in `base`. The loader turns a `null`
/// fragment toggle into `false` before merging, so only non-fragment keys see
/// the "not specified" reading.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (base, Value::Null) => base,
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match merged.get_mut(&key) {
                    Some(slot) => *slot = deep_merge(slot.take(), value),
                    None => {
                        merged.insert(key, value);
                    }
                }
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

/// Shallow merge: every key of `overlay` replaces the same key of `base`.
///
/// Key order follows `base`, with keys only present in `overlay` appended.
pub fn shallow_merge(base: &OptionsRecord, overlay: &OptionsRecord) -> OptionsRecord {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> OptionsRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_merge_fragment_toggles() {
        let base = json!({"typescript": true, "react": false});
        let overlay = json!({"react": true, "test": true});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"typescript": true, "react": true, "test": true}));
    }

    #[test]
    fn test_merge_nested_fragment_options() {
        let base = json!({
            "stylistic": {"indent": 2, "quotes": "single"},
            "auto_rename_plugins": true
        });
        let overlay = json!({
            "stylistic": {"indent": "tab"}
        });
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({
                "stylistic": {"indent": "tab", "quotes": "single"},
                "auto_rename_plugins": true
            })
        );
    }

    #[test]
    fn test_toggle_replaces_options_object() {
        let base = json!({"stylistic": {"semi": false}});
        let overlay = json!({"stylistic": false});
        assert_eq!(deep_merge(base, overlay), json!({"stylistic": false}));
    }

    #[test]
    fn test_arrays_replaced_not_merged() {
        let base = json!({"component_exts": ["vue", "svelte"]});
        let overlay = json!({"component_exts": ["mdx"]});
        assert_eq!(deep_merge(base, overlay), json!({"component_exts": ["mdx"]}));
    }

    #[test]
    fn test_null_preserves_base() {
        let base = json!({"typescript": {"tsconfig_path": "tsconfig.json"}});
        let overlay = json!({"typescript": null});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"typescript": {"tsconfig_path": "tsconfig.json"}})
        );
    }

    #[test]
    fn test_merge_keeps_base_key_order() {
        let base = json!({"react": true, "typescript": true, "test": false});
        let overlay = json!({"test": true, "react": {"jsx": true}});
        let merged = deep_merge(base, overlay);
        let keys: Vec<&str> = merged.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["react", "typescript", "test"]);
    }

    #[test]
    fn test_merge_all() {
        let values = vec![json!({"a": 1}), json!({"b": 2}), json!({"a": 3, "c": 4})];
        assert_eq!(deep_merge_all(values), json!({"a": 3, "b": 2, "c": 4}));
    }

    #[test]
    fn test_shallow_merge_replaces_nested_objects() {
        let defaults = record(json!({
            "semi": true,
            "overrides": {"style/semi": "error"}
        }));
        let user = record(json!({
            "overrides": {"style/indent": "off"}
        }));
        let merged = shallow_merge(&defaults, &user);
        assert_eq!(
            Value::Object(merged),
            json!({"semi": true, "overrides": {"style/indent": "off"}})
        );
    }

    #[test]
    fn test_shallow_merge_keeps_base_order() {
        let defaults = record(json!({"a": 1, "b": 2}));
        let user = record(json!({"c": 3, "a": 9}));
        let merged = shallow_merge(&defaults, &user);
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(merged["a"], json!(9));
    }
}
