use serde_json::{Map, Value};

use super::dto::AdvisorResult;

const SCORE_KEYS: &[&str] = &["suitability_score", "score"];
const RECOMMENDATION_KEYS: &[&str] = &["recommendation", "recommended"];
const EXPLANATION_KEYS: &[&str] = &["explanation", "reason", "explain"];
const SUGGESTION_KEYS: &[&str] = &["improvement_suggestions", "suggestions", "improvement"];
const IDEA_KEYS: &[&str] = &["better_outfit_idea", "alternative", "better_idea"];

impl AdvisorResult {
    /// Maps a parsed model object onto the result fields, accepting the key
    /// spellings models commonly drift to.
    pub fn from_parsed(parsed: Option<&Map<String, Value>>) -> Self {
        let Some(obj) = parsed else {
            return Self::default();
        };
        Self {
            suitability_score: first_present(obj, SCORE_KEYS).and_then(coerce_score),
            recommendation: first_present(obj, RECOMMENDATION_KEYS).and_then(as_text),
            explanation: first_present(obj, EXPLANATION_KEYS).and_then(as_text),
            improvement_suggestions: first_present(obj, SUGGESTION_KEYS).and_then(flatten_list),
            better_outfit_idea: first_present(obj, IDEA_KEYS).and_then(as_text),
        }
    }
}

/// First key that is present, even when its value is null.
fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn coerce_score(v: &Value) -> Option<i32> {
    let n = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Bool(b) => i64::from(*b),
        _ => return None,
    };
    i32::try_from(n).ok()
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn flatten_list(v: &Value) -> Option<String> {
    match v {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|i| match i {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => as_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(v: Value) -> AdvisorResult {
        let map = v.as_object().cloned().unwrap();
        AdvisorResult::from_parsed(Some(&map))
    }

    #[test]
    fn canonical_keys_map_directly() {
        let r = normalize(json!({
            "suitability_score": 91,
            "recommendation": "recommended",
            "explanation": "Works well.",
            "improvement_suggestions": "add a watch",
            "better_outfit_idea": "white sneakers"
        }));
        assert_eq!(r.suitability_score, Some(91));
        assert_eq!(r.recommendation.as_deref(), Some("recommended"));
        assert_eq!(r.explanation.as_deref(), Some("Works well."));
        assert_eq!(r.improvement_suggestions.as_deref(), Some("add a watch"));
        assert_eq!(r.better_outfit_idea.as_deref(), Some("white sneakers"));
    }

    #[test]
    fn string_score_and_list_suggestions_are_coerced() {
        let r = normalize(json!({"score": "85", "suggestions": ["add a belt", "roll sleeves"]}));
        assert_eq!(r.suitability_score, Some(85));
        assert_eq!(r.improvement_suggestions.as_deref(), Some("add a belt, roll sleeves"));
        assert_eq!(r.recommendation, None);
    }

    #[test]
    fn alternate_spellings_are_accepted() {
        let r = normalize(json!({
            "recommended": "not recommended",
            "reason": "Too warm.",
            "improvement": "lighter fabric",
            "better_idea": "linen set"
        }));
        assert_eq!(r.recommendation.as_deref(), Some("not recommended"));
        assert_eq!(r.explanation.as_deref(), Some("Too warm."));
        assert_eq!(r.improvement_suggestions.as_deref(), Some("lighter fabric"));
        assert_eq!(r.better_outfit_idea.as_deref(), Some("linen set"));

        let r = normalize(json!({"explain": "x", "alternative": "y"}));
        assert_eq!(r.explanation.as_deref(), Some("x"));
        assert_eq!(r.better_outfit_idea.as_deref(), Some("y"));
    }

    #[test]
    fn first_present_key_wins_even_when_null() {
        let r = normalize(json!({"suitability_score": null, "score": 70}));
        assert_eq!(r.suitability_score, None);
        let r = normalize(json!({"explanation": "primary", "reason": "secondary"}));
        assert_eq!(r.explanation.as_deref(), Some("primary"));
    }

    #[test]
    fn uncoercible_scores_become_null() {
        assert_eq!(normalize(json!({"score": "eighty"})).suitability_score, None);
        assert_eq!(normalize(json!({"score": "85.5"})).suitability_score, None);
        assert_eq!(normalize(json!({"score": [1]})).suitability_score, None);
        assert_eq!(normalize(json!({"score": 77.9})).suitability_score, Some(77));
        assert_eq!(normalize(json!({"score": " 60 "})).suitability_score, Some(60));
    }

    #[test]
    fn missing_object_gives_all_null_result() {
        assert_eq!(AdvisorResult::from_parsed(None), AdvisorResult::default());
        assert_eq!(normalize(json!({"unrelated": 1})), AdvisorResult::default());
    }
}
