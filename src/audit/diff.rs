//! Field-level diffs for audit entries

use serde_json::Value;

/// Summarize the top-level fields that differ between two JSON values
///
/// Returns `None` when nothing changed. `updated_at` is ignored since every
/// update touches it.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut changes = Vec::new();

            for (key, before_val) in before_obj {
                if key == "updated_at" {
                    continue;
                }
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => changes.push(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(before_val),
                        format_value(after_val)
                    )),
                    Some(_) => {}
                    None => changes.push(format!("{}: {} -> (removed)", key, format_value(before_val))),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!("{}: (added) -> {}", key, format_value(after_val)));
                }
            }

            changes
        }
        _ if before != after => vec![format!(
            "{} -> {}",
            format_value(before),
            format_value(after)
        )],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) if s.chars().count() > 50 => {
            let head: String = s.chars().take(47).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_change() {
        let before = json!({"number": "0012", "status": "pending"});
        let after = json!({"number": "0012", "status": "bounced"});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "status: \"pending\" -> \"bounced\"");
    }

    #[test]
    fn test_updated_at_ignored() {
        let before = json!({"amount": 100, "updated_at": "2026-01-01"});
        let after = json!({"amount": 100, "updated_at": "2026-01-02"});
        assert!(generate_diff(&before, &after).is_none());
    }

    #[test]
    fn test_added_and_removed_fields() {
        let before = json!({"code": "BP", "legacy": true});
        let after = json!({"code": "BP", "branch_id": null});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("legacy: true -> (removed)"));
        assert!(diff.contains("branch_id: (added) -> null"));
    }

    #[test]
    fn test_long_strings_truncated() {
        let before = json!({"notes": "é".repeat(80)});
        let after = json!({"notes": "short"});
        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("...\""));
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(generate_diff(&json!(1), &json!(2)).as_deref(), Some("1 -> 2"));
        assert!(generate_diff(&json!("a"), &json!("a")).is_none());
    }
}
