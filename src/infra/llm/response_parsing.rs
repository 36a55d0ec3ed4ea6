use serde_json::Value;

const MAX_ERROR_MESSAGE_LEN: usize = 256;

pub(crate) fn truncate_message(body: &str) -> String {
    let compact = body.trim().replace('\n', " ");
    compact.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

/// Walks `path` through nested objects (string segments) and arrays (numeric segments).
pub(crate) fn value_at_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    })
}

pub(crate) fn string_at_path(root: &Value, path: &[&str]) -> Option<String> {
    value_at_path(root, path)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

/// Backend-reported error message from a JSON body, if one is present and non-empty.
pub(crate) fn error_message_at(body: &str, path: &[&str]) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(body).ok()?;
    string_at_path(&parsed, path).and_then(|message| non_empty_owned(&message))
}

pub(crate) fn non_empty_owned(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{error_message_at, string_at_path, truncate_message, value_at_path};

    #[test]
    fn value_at_path_walks_objects_and_arrays() {
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "hi"}]}}
            ]
        });

        assert_eq!(
            string_at_path(&body, &["candidates", "0", "content", "parts", "0", "text"]),
            Some("hi".to_string())
        );
        assert!(value_at_path(&body, &["candidates", "1"]).is_none());
        assert!(value_at_path(&body, &["candidates", "first"]).is_none());
    }

    #[test]
    fn error_message_at_skips_blank_and_non_json_bodies() {
        assert_eq!(
            error_message_at(r#"{"error":{"message":"quota exceeded"}}"#, &["error", "message"]),
            Some("quota exceeded".to_string())
        );
        assert_eq!(
            error_message_at(r#"{"error":{"message":"  "}}"#, &["error", "message"]),
            None
        );
        assert_eq!(error_message_at("<html>502</html>", &["error", "message"]), None);
    }

    #[test]
    fn truncate_message_compacts_newlines_and_limits_length() {
        let input = "line-1\nline-2";
        let truncated = truncate_message(input);

        assert_eq!(truncated, "line-1 line-2");

        let long = "x".repeat(512);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.len(), 256);
    }
}
