use broadcast_types::status;
use serde_json::Value;

/// Walks `path` (dot-separated keys) through a JSON object. Any
/// non-object intermediate or missing key yields `"N/A"`; this function
/// cannot itself raise the `"EXTRACTION_ERROR"` sentinel since a
/// `serde_json::Value` is already a parsed tree — that sentinel is
/// reserved for the (unreachable here) case of a body that failed to
/// parse as JSON at all, handled by the caller before extraction runs.
pub(crate) fn extract_path(body: &Value, path: &str) -> String {
    let mut current = body;
    for segment in path.split('.') {
        if !current.is_object() {
            return status::NOT_APPLICABLE.to_string();
        }
        match current.get(segment) {
            Some(next) => current = next,
            None => return status::NOT_APPLICABLE.to_string(),
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Null => status::NOT_APPLICABLE.to_string(),
        other => other.to_string(),
    }
}

/// `success_status_pattern` is a comma-separated list of tokens, matched
/// case-insensitively and trimmed against the extracted status.
pub(crate) fn matches_success_pattern(pattern: &str, status: &str) -> bool {
    pattern
        .split(',')
        .map(|token| token.trim())
        .any(|token| token.eq_ignore_ascii_case(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_extraction_success() {
        let body = json!({"a": {"b": {"c": "X"}}});
        assert_eq!(extract_path(&body, "a.b.c"), "X");
    }

    #[test]
    fn nested_extraction_missing_leaf() {
        let body = json!({"a": {"b": {}}});
        assert_eq!(extract_path(&body, "a.b.c"), "N/A");
    }

    #[test]
    fn nested_extraction_non_object_intermediate() {
        let body = json!({"a": {"b": "not-an-object"}});
        assert_eq!(extract_path(&body, "a.b.c"), "N/A");
    }

    #[test]
    fn pattern_matching_is_case_insensitive_and_trims() {
        assert!(matches_success_pattern("ok, active", "active"));
        assert!(matches_success_pattern("SUCCESS", "success"));
        assert!(!matches_success_pattern("approved", "denied"));
    }
}
