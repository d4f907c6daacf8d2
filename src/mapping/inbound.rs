//! Server JSON → native attribute mapping.

use crate::shared::underscorize;
use serde_json::{Map, Value};

/// Which `null` values survive [`from_api`] (and [`super::to_api`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum KeepNulls {
    /// Drop every null-valued key.
    #[default]
    None,
    /// Keep every null-valued key.
    All,
    /// Keep nulls only at these dotted paths, e.g. `parent.child`.
    ///
    /// Paths are consumed one segment per nesting level, so `a.b` keeps `b`
    /// only when it sits directly under `a`. Paths that match nothing in the
    /// payload are ignored.
    Paths(Vec<String>),
}

impl KeepNulls {
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeepNulls::Paths(paths.into_iter().map(Into::into).collect())
    }

    /// Whether a null under `key` at this level is kept.
    pub fn keeps(&self, key: &str) -> bool {
        match self {
            KeepNulls::None => false,
            KeepNulls::All => true,
            KeepNulls::Paths(paths) => paths.iter().any(|p| p == key),
        }
    }

    /// The policy that applies one level below `key`.
    pub fn descend(&self, key: &str) -> KeepNulls {
        match self {
            KeepNulls::None => KeepNulls::None,
            KeepNulls::All => KeepNulls::All,
            KeepNulls::Paths(paths) => {
                let nested: Vec<String> = paths
                    .iter()
                    .filter_map(|p| p.strip_prefix(key)?.strip_prefix('.'))
                    .map(str::to_string)
                    .collect();
                if nested.is_empty() {
                    KeepNulls::None
                } else {
                    KeepNulls::Paths(nested)
                }
            }
        }
    }
}

/// Underscorize every object key and drop nulls not covered by `keep`.
///
/// Recurses into nested objects and into lists of objects. Scalars, including
/// nulls inside lists, pass through unchanged.
pub fn from_api(data: &Value, keep: &KeepNulls) -> Value {
    match data {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let key = underscorize(key);
                if value.is_null() && !keep.keeps(&key) {
                    continue;
                }
                let nested = keep.descend(&key);
                out.insert(key, from_api(value, &nested));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| from_api(item, keep)).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_dropped_by_default() {
        let out = from_api(&json!({"a": 1, "b": null}), &KeepNulls::None);
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_keep_all_nulls() {
        let out = from_api(&json!({"a": 1, "b": null, "c": {"d": null}}), &KeepNulls::All);
        assert_eq!(out, json!({"a": 1, "b": null, "c": {"d": null}}));
    }

    #[test]
    fn test_keep_list_preserves_nested_null() {
        let out = from_api(
            &json!({"parent": {"child": null}}),
            &KeepNulls::paths(["parent.child"]),
        );
        assert_eq!(out, json!({"parent": {"child": null}}));
    }

    #[test]
    fn test_keep_list_is_positional() {
        // `parent.child` must not keep a `child` that sits elsewhere.
        let out = from_api(
            &json!({"child": null, "other": {"child": null}, "parent": {"child": null}}),
            &KeepNulls::paths(["parent.child"]),
        );
        assert_eq!(out, json!({"other": {}, "parent": {"child": null}}));
    }

    #[test]
    fn test_keep_list_unmatched_paths_ignored() {
        let out = from_api(
            &json!({"a": null, "b": 2}),
            &KeepNulls::paths(["nowhere.deep.path", "b.c"]),
        );
        assert_eq!(out, json!({"b": 2}));
    }

    #[test]
    fn test_keys_underscorized_recursively() {
        let out = from_api(
            &json!({
                "projectId": "p1",
                "backtests": [{"validationStartDate": "2020-01-01", "gapDuration": null}],
                "holdoutSettings": {"holdoutEndDate": "2021-01-01"},
                "featureList": ["someColumn", null]
            }),
            &KeepNulls::None,
        );
        assert_eq!(
            out,
            json!({
                "project_id": "p1",
                "backtests": [{"validation_start_date": "2020-01-01"}],
                "holdout_settings": {"holdout_end_date": "2021-01-01"},
                "feature_list": ["someColumn", null]
            })
        );
    }

    #[test]
    fn test_keep_list_applies_inside_lists_of_objects() {
        let out = from_api(
            &json!({"backtests": [{"gapDuration": null}, {"gapDuration": "P1D"}]}),
            &KeepNulls::paths(["backtests.gap_duration"]),
        );
        assert_eq!(
            out,
            json!({"backtests": [{"gap_duration": null}, {"gap_duration": "P1D"}]})
        );
    }
}
