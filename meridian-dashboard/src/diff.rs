use serde_json::{Map, Value};

/// Compute a nested merge-patch diff from `old` to `new` (§4.7: "a nested object tree of changed
/// fields ... keys present with a `null` sentinel denote deletion"). Applying [`apply`] with the
/// result to `old` reproduces `new` (§8 round-trip property).
///
/// Unlike RFC 7396 this never collapses a changed object to `null` wholesale: only leaves that
/// differ are reported, so a diff against a large unchanged subtree stays small.
pub fn diff(old: &Value, new: &Value) -> Value {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut patch = Map::new();

            for (key, old_value) in old_map {
                match new_map.get(key) {
                    Some(new_value) if new_value == old_value => {}
                    Some(new_value) => {
                        patch.insert(key.clone(), diff(old_value, new_value));
                    }
                    None => {
                        patch.insert(key.clone(), Value::Null);
                    }
                }
            }

            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    patch.insert(key.clone(), new_value.clone());
                }
            }

            Value::Object(patch)
        }
        (old, new) if old == new => Value::Object(Map::new()),
        (_, new) => new.clone(),
    }
}

/// Apply a diff produced by [`diff`] to `base` in place, per the same nested merge-patch rules.
pub fn apply(base: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *base = patch.clone();
        return;
    };

    if !base.is_object() {
        *base = Value::Object(Map::new());
    }
    let Value::Object(base_map) = base else {
        unreachable!("just coerced to an object");
    };

    for (key, patch_value) in patch_map {
        match patch_value {
            Value::Null => {
                base_map.remove(key);
            }
            Value::Object(_) if base_map.get(key).is_some_and(Value::is_object) => {
                apply(base_map.get_mut(key).expect("checked above"), patch_value);
            }
            other => {
                base_map.insert(key.clone(), other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_a_nested_change() {
        let old = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let new = json!({"a": 1, "b": {"c": 5, "d": 3}});
        let patch = diff(&old, &new);
        assert_eq!(patch, json!({"b": {"c": 5}}));

        let mut applied = old.clone();
        apply(&mut applied, &patch);
        assert_eq!(applied, new);
    }

    #[test]
    fn deletion_uses_a_null_sentinel() {
        let old = json!({"a": 1, "b": 2});
        let new = json!({"a": 1});
        let patch = diff(&old, &new);
        assert_eq!(patch, json!({"b": null}));

        let mut applied = old.clone();
        apply(&mut applied, &patch);
        assert_eq!(applied, new);
    }

    #[test]
    fn unchanged_state_produces_an_empty_patch() {
        let state = json!({"a": {"b": 1}});
        assert_eq!(diff(&state, &state), json!({}));
    }

    #[test]
    fn addition_of_a_new_key_is_carried_whole() {
        let old = json!({"a": 1});
        let new = json!({"a": 1, "b": {"c": 2}});
        let patch = diff(&old, &new);
        assert_eq!(patch, json!({"b": {"c": 2}}));

        let mut applied = old.clone();
        apply(&mut applied, &patch);
        assert_eq!(applied, new);
    }
}
