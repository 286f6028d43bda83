//! Dotted lookups into provider JSON responses

use serde_json::Value;

/// Walk `path` (`data.url`, `data.0.url`) through `root`.
///
/// Segments index objects by key and arrays by position. An empty path
/// selects the root itself.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return Some(root);
    }

    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Resolve `path` and render the value as text. `null` counts as absent.
pub fn resolve_string(root: &Value, path: &str) -> Option<String> {
    match resolve(root, path)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Loose truthiness used when a host names a success field without a value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_object_and_array_segments() {
        let body = json!({"data": [{"url": "https://a/x.png"}, {"url": "https://a/y.png"}]});
        assert_eq!(
            resolve_string(&body, "data.1.url").as_deref(),
            Some("https://a/y.png")
        );
        assert_eq!(resolve_string(&body, "data.2.url"), None);
        assert_eq!(resolve_string(&body, "data.first.url"), None);
    }

    #[test]
    fn test_missing_and_null_are_absent() {
        let body = json!({"data": {"url": null}});
        assert_eq!(resolve_string(&body, "data.url"), None);
        assert_eq!(resolve_string(&body, "data.link"), None);
        assert_eq!(resolve_string(&body, "data.url.deeper"), None);
    }

    #[test]
    fn test_scalars_render_as_text() {
        let body = json!({"errno": 0, "ok": true, "code": "1000"});
        assert_eq!(resolve_string(&body, "errno").as_deref(), Some("0"));
        assert_eq!(resolve_string(&body, "ok").as_deref(), Some("true"));
        assert_eq!(resolve_string(&body, "code").as_deref(), Some("1000"));
    }

    #[test]
    fn test_empty_path_is_root() {
        let body = json!("https://a/x.png");
        assert_eq!(resolve_string(&body, "").as_deref(), Some("https://a/x.png"));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
    }
}
