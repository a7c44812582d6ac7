use std::collections::HashMap;

use byline_common::keys;
use serde_json::Value;

pub const STEP: u8 = 5;
pub const MAX: u8 = 20;

/// Metadata completeness, 0 to 20 in steps of 5.
pub fn metadata_score(metadata: &HashMap<String, Value>) -> u8 {
    let word_count = metadata.get(keys::WORD_COUNT).filter(|v| !v.is_null());

    let mut score = 0;
    if word_count.and_then(numeric).is_some_and(|n| n > 50.0) {
        score += STEP;
    }
    if metadata.get(keys::METRICS).is_some_and(|v| !v.is_null()) {
        score += STEP;
    }
    // NOTE: word_count scores twice, once for length above and once for
    // presence here.
    if word_count.is_some() {
        score += STEP;
    }
    let own_keys = metadata
        .keys()
        .filter(|k| k.as_str() != keys::VALIDATION)
        .count();
    if own_keys > 2 {
        score += STEP;
    }

    score.min(MAX)
}

/// JSON numbers and numeric strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_metadata() {
        let m = meta(json!({"blog_name": "Tim's Blog", "word_count": 500, "metrics": {}}));
        assert_eq!(metadata_score(&m), 20);
    }

    #[test]
    fn test_short_content_only_counts_presence() {
        let m = meta(json!({"book_title": "Unknown Book", "word_count": 10}));
        assert_eq!(metadata_score(&m), 5);
    }

    #[test]
    fn test_empty_metadata() {
        assert_eq!(metadata_score(&HashMap::new()), 0);
    }

    #[test]
    fn test_null_values_are_absent() {
        let m = meta(json!({"word_count": null, "metrics": null}));
        assert_eq!(metadata_score(&m), 0);
    }

    #[test]
    fn test_numeric_string_word_count() {
        let m = meta(json!({"word_count": "120"}));
        assert_eq!(metadata_score(&m), 10);
        let m = meta(json!({"word_count": "lots"}));
        assert_eq!(metadata_score(&m), 5);
    }

    #[test]
    fn test_validation_key_not_counted() {
        let m = meta(json!({
            "word_count": 10,
            "handle": "tferriss",
            "validation": {"score": 50, "passed": false}
        }));
        assert_eq!(metadata_score(&m), 5);
    }

    #[test]
    fn test_many_keys() {
        let m = meta(json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(metadata_score(&m), 5);
    }
}
