//! Asks the model, per requirement, whether the resume clearly meets it.

use tracing::debug;

use crate::llm_client::prompts::JSON_ARRAY_ONLY;
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};
use crate::matching::models::{MatchVerdict, Requirement};
use crate::matching::prompts::{MATCH_PROMPT_TEMPLATE, MATCH_SAMPLING, MATCH_SYSTEM};
use crate::matching::repair::{decode_records, parse_json_array};

pub async fn match_requirements(
    resume_text: &str,
    requirements: &[Requirement],
    llm: &dyn CompletionService,
) -> Result<Vec<MatchVerdict>, LlmError> {
    if requirements.is_empty() {
        debug!("No requirements to match; skipping completion call");
        return Ok(Vec::new());
    }

    let system = format!("{MATCH_SYSTEM} {JSON_ARRAY_ONLY}");
    let requirements_json = serde_json::to_string_pretty(requirements).unwrap_or_default();
    let prompt = MATCH_PROMPT_TEMPLATE
        .replace("{requirements_json}", &requirements_json)
        .replace("{resume_text}", resume_text);
    let (temperature, max_tokens) = MATCH_SAMPLING;

    let raw = llm
        .complete(CompletionRequest {
            system: &system,
            prompt: &prompt,
            temperature,
            max_tokens,
        })
        .await?;

    Ok(verdicts_from_output(&raw))
}

/// Unparseable output becomes a single not-met verdict carrying the raw text.
pub fn verdicts_from_output(raw: &str) -> Vec<MatchVerdict> {
    decode_records(parse_json_array(raw), "verdict")
}
