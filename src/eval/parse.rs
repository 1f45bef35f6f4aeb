//! Tolerant JSON recovery from free-form model text
//!
//! Models wrap their JSON answer in prose often enough that a strict parse is
//! not good enough. `extract_json` tries the trimmed text first, then the
//! substring between the first `{` and the last `}`. No bracket balancing or
//! repair beyond that: a single well-formed object substring is required.

use serde_json::{Map, Value};

/// Best-effort extraction of a JSON object from model output.
///
/// Never errors; total failure yields an empty map.
pub fn extract_json(text: &str) -> Map<String, Value> {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return Map::new();
    }

    if let Some(map) = parse_object(cleaned) {
        return map;
    }

    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    if let (Some(start), Some(end)) = (start, end)
        && start < end
        && let Some(map) = parse_object(&cleaned[start..=end])
    {
        return map;
    }

    Map::new()
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Coerce the `overall` key to a number.
///
/// Accepts JSON numbers and numeric strings; anything else counts as absent,
/// never as zero.
pub fn overall_score(evaluation: &Map<String, Value>) -> Option<f64> {
    match evaluation.get("overall")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_json() {
        let parsed = extract_json(r#"{"overall": 8, "clarity": 9}"#);
        assert_eq!(parsed["overall"], json!(8));
        assert_eq!(parsed["clarity"], json!(9));
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let parsed = extract_json("blah {\"overall\":6,\"problems\":\"x\"} thanks");
        assert_eq!(parsed["overall"], json!(6));
        assert_eq!(parsed["problems"], json!("x"));
    }

    #[test]
    fn test_extract_json_multiline_wrapper() {
        let parsed = extract_json("Result:\n{\"overall\": 6, \"problems\": \"too vague\"}\nThanks");
        assert_eq!(parsed["overall"], json!(6));
        assert_eq!(parsed["problems"], json!("too vague"));
    }

    #[test]
    fn test_extract_json_no_json_returns_empty() {
        assert!(extract_json("no json here").is_empty());
    }

    #[test]
    fn test_extract_json_blank_returns_empty() {
        assert!(extract_json("").is_empty());
        assert!(extract_json("   \n\t").is_empty());
    }

    #[test]
    fn test_extract_json_malformed_object_returns_empty() {
        assert!(extract_json("prefix {\"overall\": } suffix").is_empty());
    }

    #[test]
    fn test_extract_json_non_object_returns_empty() {
        assert!(extract_json("[1, 2, 3]").is_empty());
        assert!(extract_json("42").is_empty());
    }

    #[test]
    fn test_overall_score_from_number() {
        let map = extract_json(r#"{"overall": 7.5}"#);
        assert_eq!(overall_score(&map), Some(7.5));
    }

    #[test]
    fn test_overall_score_from_numeric_string() {
        let map = extract_json(r#"{"overall": "8"}"#);
        assert_eq!(overall_score(&map), Some(8.0));
    }

    #[test]
    fn test_overall_score_absent_or_non_numeric() {
        assert_eq!(overall_score(&Map::new()), None);
        let map = extract_json(r#"{"overall": "excellent"}"#);
        assert_eq!(overall_score(&map), None);
        let map = extract_json(r#"{"overall": null}"#);
        assert_eq!(overall_score(&map), None);
        let map = extract_json(r#"{"clarity": 9}"#);
        assert_eq!(overall_score(&map), None);
    }
}
