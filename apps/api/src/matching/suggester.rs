//! Interview questions grounded in both the job and the resume.

use crate::llm_client::prompts::JSON_ARRAY_ONLY;
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};
use crate::matching::models::Suggestion;
use crate::matching::prompts::{
    MAX_SUGGESTIONS, SUGGEST_PROMPT_TEMPLATE, SUGGEST_SAMPLING, SUGGEST_SYSTEM,
};
use crate::matching::repair::{decode_records, is_sentinel, parse_json_array, sentinel_text};

pub const SUGGESTION_ERROR_QUESTION: &str = "AI Suggestion Error";

pub async fn suggest_questions(
    job_text: &str,
    resume_text: &str,
    llm: &dyn CompletionService,
) -> Result<Vec<Suggestion>, LlmError> {
    let system = format!("{SUGGEST_SYSTEM} {JSON_ARRAY_ONLY}");
    let prompt = SUGGEST_PROMPT_TEMPLATE
        .replace("{job_text}", job_text)
        .replace("{resume_text}", resume_text);
    let (temperature, max_tokens) = SUGGEST_SAMPLING;

    let raw = llm
        .complete(CompletionRequest {
            system: &system,
            prompt: &prompt,
            temperature,
            max_tokens,
        })
        .await?;

    Ok(suggestions_from_output(&raw))
}

/// At most `MAX_SUGGESTIONS` pairs. Never empty: when nothing usable comes back,
/// a single pair flags the error and carries the raw output.
pub fn suggestions_from_output(raw: &str) -> Vec<Suggestion> {
    let records = parse_json_array(raw);

    if let Some(sentinel) = records.iter().find(|r| is_sentinel(r)) {
        return vec![error_suggestion(sentinel_text(sentinel))];
    }

    let mut suggestions: Vec<Suggestion> = decode_records(records, "suggestion");
    suggestions.retain(|s| !s.question.trim().is_empty());
    suggestions.truncate(MAX_SUGGESTIONS);

    if suggestions.is_empty() {
        return vec![error_suggestion(raw)];
    }
    suggestions
}

fn error_suggestion(raw: &str) -> Suggestion {
    Suggestion {
        question: SUGGESTION_ERROR_QUESTION.to_string(),
        answer: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedCompletion;

    #[test]
    fn test_well_formed_pairs_are_kept() {
        let raw = r#"[{"question": "Is my Rust enough?", "answer": "Yes, five years."},
                      {"question": "Do I need a license?", "answer": "Yes."}]"#;
        let suggestions = suggestions_from_output(raw);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].answer, "Yes.");
    }

    #[test]
    fn test_more_than_five_are_truncated() {
        let items: Vec<String> = (1..=7)
            .map(|i| format!(r#"{{"question": "Q{i}?", "answer": "A{i}"}}"#))
            .collect();
        let raw = format!("[{}]", items.join(","));
        let suggestions = suggestions_from_output(&raw);
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions[4].question, "Q5?");
    }

    #[test]
    fn test_garbage_yields_single_error_pair() {
        let suggestions = suggestions_from_output("rate limit exceeded, try later");
        assert_eq!(
            suggestions,
            vec![Suggestion {
                question: SUGGESTION_ERROR_QUESTION.to_string(),
                answer: "rate limit exceeded, try later".to_string(),
            }]
        );
    }

    #[test]
    fn test_records_without_questions_yield_error_pair() {
        let suggestions = suggestions_from_output(r#"[{"title": "Rust"}]"#);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].question, SUGGESTION_ERROR_QUESTION);
    }

    #[tokio::test]
    async fn test_suggest_includes_both_texts() {
        let llm = ScriptedCompletion::new(vec![Ok(
            r#"[{"question": "Q?", "answer": "A"}]"#.to_string()
        )]);
        suggest_questions("JOB-TEXT", "RESUME-TEXT", &llm).await.unwrap();
        let calls = llm.calls();
        assert!(calls[0].prompt.contains("JOB-TEXT"));
        assert!(calls[0].prompt.contains("RESUME-TEXT"));
        assert!((calls[0].temperature - 0.3).abs() < f32::EPSILON);
    }
}
