//! Data-loader result merging for Routegen.
//!
//! The generic deep merge and the domain normalization are deliberately
//! separate operations: the merge is reusable over any tree-structured
//! value, the redirect rule is a post-merge step specific to loader
//! results. The same semantics are emitted as a JS helper into generated
//! artifacts; this module is the reference the tests hold it to.

use serde_json::Value;

/// Key-wise recursive merge of two values. Objects merge field by field,
/// everything else is replaced by the later value.
pub fn deep_merge(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, patch_value),
                    None => patch_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, patch) => patch,
    }
}

/// Post-merge normalization: a redirect response supersedes prop delivery,
/// so a merged result carrying a `redirect` key must not carry `props`.
pub fn finalize_loader_result(mut merged: Value) -> Value {
    if let Value::Object(map) = &mut merged {
        if map.contains_key("redirect") {
            map.remove("props");
        }
    }
    merged
}

/// The same two operations, inlined into every generated artifact that
/// emits a combined data loader.
pub const LOADER_HELPERS_JS: &str = r#"function deepMerge(base, patch) {
  if (
    base && patch &&
    typeof base === "object" && typeof patch === "object" &&
    !Array.isArray(base) && !Array.isArray(patch)
  ) {
    const merged = { ...base };
    for (const key of Object.keys(patch)) {
      merged[key] = key in base ? deepMerge(base[key], patch[key]) : patch[key];
    }
    return merged;
  }
  return patch;
}

function finalizeLoaderResult(merged) {
  if (merged && typeof merged === "object" && "redirect" in merged) {
    const { props, ...rest } = merged;
    return rest;
  }
  return merged;
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_objects_merge_key_wise() {
        let merged = deep_merge(
            json!({ "props": { "a": 1, "shared": 1 } }),
            json!({ "props": { "b": 2, "shared": 2 } }),
        );
        assert_eq!(merged, json!({ "props": { "a": 1, "b": 2, "shared": 2 } }));
    }

    #[test]
    fn test_later_value_wins_on_collision() {
        let merged = deep_merge(json!({ "x": { "deep": true } }), json!({ "x": 5 }));
        assert_eq!(merged, json!({ "x": 5 }));
    }

    #[test]
    fn test_arrays_are_replaced_not_merged() {
        let merged = deep_merge(json!({ "x": [1, 2] }), json!({ "x": [3] }));
        assert_eq!(merged, json!({ "x": [3] }));
    }

    #[test]
    fn test_redirect_drops_props() {
        let merged = deep_merge(
            json!({ "props": { "x": 1 } }),
            json!({ "redirect": { "destination": "/login", "permanent": false } }),
        );
        let finalized = finalize_loader_result(merged);
        assert_eq!(
            finalized,
            json!({ "redirect": { "destination": "/login", "permanent": false } })
        );
    }

    #[test]
    fn test_no_redirect_keeps_props() {
        let finalized = finalize_loader_result(json!({ "props": { "x": 1 } }));
        assert_eq!(finalized, json!({ "props": { "x": 1 } }));
    }

    #[test]
    fn test_normalization_ignores_non_objects() {
        assert_eq!(finalize_loader_result(json!(null)), json!(null));
        assert_eq!(finalize_loader_result(json!([1])), json!([1]));
    }
}
