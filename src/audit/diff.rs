//! Change summaries for audit entries

use serde_json::Value;

/// Fields that change on every write and say nothing about the edit
const IGNORED_FIELDS: &[&str] = &["updated_at"];

/// Summarise the top-level fields that differ between two entity snapshots
///
/// Returns `None` when nothing of interest changed.
pub fn summarize_changes(before: &Value, after: &Value) -> Option<String> {
    let changes: Vec<String> = match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let mut keys: Vec<&String> = b.keys().chain(a.keys()).collect();
            keys.sort();
            keys.dedup();

            keys.into_iter()
                .filter(|k| !IGNORED_FIELDS.contains(&k.as_str()))
                .filter_map(|k| match (b.get(k), a.get(k)) {
                    (Some(old), Some(new)) if old == new => None,
                    (old, new) => Some(format!("{}: {} -> {}", k, describe(old), describe(new))),
                })
                .collect()
        }
        _ if before != after => vec![format!("{} -> {}", describe(Some(before)), describe(Some(after)))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "(none)".to_string(),
        Some(Value::String(s)) if s.chars().count() > 40 => {
            let head: String = s.chars().take(37).collect();
            format!("\"{}...\"", head)
        }
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(fields)) => format!("{{{} fields}}", fields.len()),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reports_changed_fields_only() {
        let before = json!({"scope": "Food", "limit": 20000, "updated_at": "a"});
        let after = json!({"scope": "Food", "limit": 25000, "updated_at": "b"});
        assert_eq!(summarize_changes(&before, &after).unwrap(), "limit: 20000 -> 25000");
    }

    #[test]
    fn test_added_and_removed_fields() {
        let before = json!({"name": "Trip", "old": true});
        let after = json!({"name": "Trip", "members": [1, 2]});
        let summary = summarize_changes(&before, &after).unwrap();
        assert!(summary.contains("members: (none) -> [2 items]"));
        assert!(summary.contains("old: true -> (none)"));
    }

    #[test]
    fn test_no_changes() {
        let value = json!({"name": "Trip"});
        assert!(summarize_changes(&value, &value).is_none());
    }

    #[test]
    fn test_long_strings_truncated() {
        let before = json!({"description": "x".repeat(80)});
        let after = json!({"description": "short"});
        assert!(summarize_changes(&before, &after).unwrap().contains("...\""));
    }
}
