/// Strict binary factual-QA prompt sent alongside the generated image.
pub fn build_factual_qa_prompt(question: &str) -> String {
    format!(
        r#"You are a strict factual evaluator.

Your task:
Inspect the infographic image (provided separately) and answer the binary factual question below.

Rules:
- Answer **1** ONLY if the requirement is clearly satisfied in the image.
- Answer **0** if the requirement is NOT satisfied, unclear, ambiguous, partially met, or cannot be confirmed.
- No partial credit. Ambiguity = 0.
- Base your judgment ONLY on visible evidence in the infographic.
- Even if the image is empty, blank, corrupted, unreadable, or clearly incorrect, you MUST still output a valid JSON object following the required format. In such cases, the answer should be 0.

-------------------------------------
FACTUAL QUESTION:
{question}
-------------------------------------

**Output Format (JSON ONLY)**:
```json
{{
  "analysis": "<your reasoning based strictly on what is visible>",
  "answer": "<0 or 1>"
}}
```
The response must contain only valid JSON.
"#,
        question = question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_question_and_format() {
        let prompt = build_factual_qa_prompt("  Does the chart have a legend?\n");
        assert!(prompt.contains("FACTUAL QUESTION:\nDoes the chart have a legend?\n---"));
        assert!(prompt.contains("\"answer\": \"<0 or 1>\""));
        assert!(prompt.contains("Ambiguity = 0"));
    }
}
