use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::vis_item::Judgment;

lazy_static! {
    // Fenced block with an optional language tag.
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap();
}

/// Pull a JSON value out of free-form model output.
///
/// Tries, in order: the whole text, the first fenced code block, the first
/// embedded object. Falls back to the raw text as a JSON string.
pub fn extract_json(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value;
    }

    if let Some(block) = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
    {
        return serde_json::from_str(block).unwrap_or_else(|_| Value::String(block.to_string()));
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(Ok(value)) = serde_json::Deserializer::from_str(&trimmed[start..])
            .into_iter::<Value>()
            .next()
        {
            return value;
        }
    }

    Value::String(trimmed.to_string())
}

/// Build a judgment from a model response; missing fields default to empty.
pub fn parse_judgment(text: &str, gen_model: &str, eval_model: &str) -> Judgment {
    let value = extract_json(text);
    let analysis = match value.get("analysis") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Judgment {
        eval_model: eval_model.to_string(),
        gen_model: gen_model.to_string(),
        analysis,
        answer: normalize_answer(value.get("answer")),
    }
}

fn normalize_answer(answer: Option<&Value>) -> String {
    match answer {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "1".to_string(),
        Some(Value::Bool(false)) => "0".to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_json() {
        assert_eq!(
            extract_json(r#" {"analysis": "a", "answer": "1"} "#),
            json!({"analysis": "a", "answer": "1"})
        );
    }

    #[test]
    fn fenced_json_with_and_without_tag() {
        let tagged = "Sure!\n```json\n{\"answer\": \"0\"}\n```\nThanks";
        assert_eq!(extract_json(tagged), json!({"answer": "0"}));

        let bare = "```\n{\"answer\": 1}\n```";
        assert_eq!(extract_json(bare), json!({"answer": 1}));

        let not_json = "```text\nhello there\n```";
        assert_eq!(extract_json(not_json), json!("hello there"));
    }

    #[test]
    fn embedded_object() {
        let text = "My verdict is {\"analysis\": \"legend present\", \"answer\": \"1\"} as requested.";
        assert_eq!(
            extract_json(text),
            json!({"analysis": "legend present", "answer": "1"})
        );
    }

    #[test]
    fn plain_text_falls_back_to_string() {
        assert_eq!(extract_json("I cannot see an image"), json!("I cannot see an image"));
    }

    #[test]
    fn judgment_fields_are_normalized() {
        let j = parse_judgment(r#"{"analysis": " ok ", "answer": " 1 "}"#, "g", "e");
        assert_eq!(j.answer, "1");
        assert_eq!(j.analysis, "ok");
        assert_eq!(j.gen_model, "g");
        assert_eq!(j.eval_model, "e");
        assert!(j.passed());

        assert_eq!(parse_judgment(r#"{"answer": 0}"#, "g", "e").answer, "0");
        assert_eq!(parse_judgment(r#"{"answer": true}"#, "g", "e").answer, "1");

        let empty = parse_judgment("no json here", "g", "e");
        assert_eq!(empty.answer, "");
        assert_eq!(empty.analysis, "");
        assert!(!empty.passed());
    }
}
