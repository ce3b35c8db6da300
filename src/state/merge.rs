//! Structural merge of a loaded document onto the default shape.
//!
//! Objects are merged key by key, recursively. Anything else (arrays,
//! strings, numbers, booleans, null) present in the loaded document replaces
//! the default wholesale. Old state files therefore keep loading after new
//! fields are added to `State::default()`.

use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value};

use super::models::State;
use crate::notebook::ErrorEntry;

/// Merge `overlay` onto `base`, returning the combined value
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Fill every field missing from `loaded` from a freshly built default
/// state, then decode the result.
///
/// Only a document that is not a JSON object is an error. Each section is
/// decoded on its own: a section with the wrong shape falls back to its
/// default, and a notebook entry that cannot be decoded is dropped. Both are
/// logged.
pub fn merge_onto_defaults(loaded: Value) -> serde_json::Result<State> {
    let defaults = serde_json::to_value(State::default())?;
    let mut doc = match deep_merge(defaults, loaded) {
        Value::Object(map) => map,
        _ => return Err(serde_json::Error::custom("state document is not a JSON object")),
    };

    let base = State::default();
    Ok(State {
        version: take_section(&mut doc, "version", base.version),
        initialized: take_section(&mut doc, "initialized", base.initialized),
        onboarding_step: take_section(&mut doc, "onboarding_step", base.onboarding_step),
        completion_status: take_section(&mut doc, "completion_status", base.completion_status),
        schedule: take_section(&mut doc, "schedule", base.schedule),
        user: take_section(&mut doc, "user", base.user),
        preferences: take_section(&mut doc, "preferences", base.preferences),
        progress: take_section(&mut doc, "progress", base.progress),
        recent_topics: take_section(&mut doc, "recent_topics", base.recent_topics),
        error_notebook: take_entries(&mut doc, "error_notebook"),
        error_archive: take_entries(&mut doc, "error_archive"),
        extra: doc,
    })
}

fn take_section<T: DeserializeOwned>(doc: &mut Map<String, Value>, key: &str, fallback: T) -> T {
    match doc.remove(key) {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Unreadable '{}' in state: {}. Using defaults for it.", key, e);
            fallback
        }),
        None => fallback,
    }
}

fn take_entries(doc: &mut Map<String, Value>, key: &str) -> Vec<ErrorEntry> {
    let items = match doc.remove(key) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Vec::new(),
        Some(other) => {
            log::warn!("'{}' in state is not a list: {}", key, other);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Dropping unreadable {} entry {}: {}", key, index, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_are_filled() {
        let base = json!({ "user": { "xp": 0, "level": 1 }, "version": 2 });
        let overlay = json!({ "user": { "xp": 50 } });

        let merged = deep_merge(base, overlay);
        assert_eq!(merged, json!({ "user": { "xp": 50, "level": 1 }, "version": 2 }));
    }

    #[test]
    fn test_arrays_and_scalars_override() {
        let base = json!({ "topics": ["a", "b"], "ratio": 0.7, "name": "x" });
        let overlay = json!({ "topics": [], "ratio": 0.2 });

        let merged = deep_merge(base, overlay);
        assert_eq!(merged["topics"], json!([]));
        assert_eq!(merged["ratio"], json!(0.2));
        assert_eq!(merged["name"], json!("x"));
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let merged = deep_merge(json!({ "a": 1 }), json!({ "b": { "c": true } }));
        assert_eq!(merged, json!({ "a": 1, "b": { "c": true } }));
    }

    #[test]
    fn test_non_object_overlay_replaces() {
        assert_eq!(deep_merge(json!({ "a": 1 }), json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_partial_document_decodes() {
        let state = merge_onto_defaults(json!({
            "user": { "xp": 50 },
            "progress": { "total_quizzes": 5 }
        }))
        .unwrap();

        assert_eq!(state.user.xp, 50);
        assert_eq!(state.user.level, 1);
        assert_eq!(state.progress.total_quizzes, 5);
        assert_eq!(state.schedule.quiz_time, "22:45");
    }

    #[test]
    fn test_every_default_field_present_after_merge() {
        let state = merge_onto_defaults(json!({ "preferences": {} })).unwrap();
        let merged = serde_json::to_value(&state).unwrap();
        let defaults = serde_json::to_value(State::default()).unwrap();

        fn assert_superset(expected: &Value, actual: &Value, path: &str) {
            if let (Value::Object(e), Value::Object(a)) = (expected, actual) {
                for (key, value) in e {
                    let child = format!("{}.{}", path, key);
                    let found = a.get(key).unwrap_or_else(|| panic!("missing {}", child));
                    assert_superset(value, found, &child);
                }
            }
        }

        assert_superset(&defaults, &merged, "state");
    }

    #[test]
    fn test_extra_top_level_fields_survive() {
        let state = merge_onto_defaults(json!({ "future_field": { "x": 1 } })).unwrap();
        assert_eq!(state.extra.get("future_field"), Some(&json!({ "x": 1 })));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["future_field"]["x"], 1);
    }

    #[test]
    fn test_non_object_document_is_an_error() {
        assert!(merge_onto_defaults(json!([1, 2, 3])).is_err());
        assert!(merge_onto_defaults(json!("state")).is_err());
    }

    #[test]
    fn test_bad_section_falls_back_alone() {
        let state = merge_onto_defaults(json!({
            "user": "nope",
            "preferences": { "cefr_level": "Z9" },
            "progress": { "total_quizzes": 4 }
        }))
        .unwrap();

        assert_eq!(state.user, State::default().user);
        assert_eq!(state.preferences, State::default().preferences);
        assert_eq!(state.progress.total_quizzes, 4);
    }

    #[test]
    fn test_unreadable_entries_are_dropped_individually() {
        let state = merge_onto_defaults(json!({
            "error_notebook": [
                { "date": "2026-02-20", "question": "kept", "wrong_count": 2 },
                { "date": "2026-02-21", "question": "dropped", "wrong_count": "many" }
            ],
            "error_archive": "oops"
        }))
        .unwrap();

        assert_eq!(state.error_notebook.len(), 1);
        assert_eq!(state.error_notebook[0].question, "kept");
        assert!(state.error_archive.is_empty());
    }

    #[test]
    fn test_loose_entry_fields_become_text() {
        let state = merge_onto_defaults(json!({
            "error_notebook": [{
                "date": "2026-02-20",
                "question": "Pick one",
                "user_answer": 1,
                "correct_answer": 2,
                "explanation": null,
                "reviewed": false
            }]
        }))
        .unwrap();

        let entry = &state.error_notebook[0];
        assert_eq!(entry.user_answer, "1");
        assert_eq!(entry.correct_answer, "2");
        assert_eq!(entry.explanation, "");
        assert_eq!(entry.wrong_count, 1);
    }
}
