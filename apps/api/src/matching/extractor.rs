//! Turns a job description into discrete, checkable requirements.

use crate::llm_client::prompts::JSON_ARRAY_ONLY;
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};
use crate::matching::models::Requirement;
use crate::matching::prompts::{EXTRACT_PROMPT_TEMPLATE, EXTRACT_SAMPLING, EXTRACT_SYSTEM};
use crate::matching::repair::{decode_records, parse_json_array};

/// One completion call, repair-parsed. Transport failures propagate to the caller.
/// Duplicate titles are kept; the reconciler deals with them.
pub async fn extract_requirements(
    job_text: &str,
    llm: &dyn CompletionService,
) -> Result<Vec<Requirement>, LlmError> {
    let system = format!("{EXTRACT_SYSTEM} {JSON_ARRAY_ONLY}");
    let prompt = EXTRACT_PROMPT_TEMPLATE.replace("{job_text}", job_text);
    let (temperature, max_tokens) = EXTRACT_SAMPLING;

    let raw = llm
        .complete(CompletionRequest {
            system: &system,
            prompt: &prompt,
            temperature,
            max_tokens,
        })
        .await?;

    Ok(requirements_from_output(&raw))
}

/// Parses raw completion output into requirements and numbers them `R1..Rn`.
pub fn requirements_from_output(raw: &str) -> Vec<Requirement> {
    let mut requirements: Vec<Requirement> = decode_records(parse_json_array(raw), "requirement");
    requirements.retain(|r| !r.title.trim().is_empty());
    assign_ids(&mut requirements);
    requirements
}

pub fn assign_ids(requirements: &mut [Requirement]) {
    for (i, requirement) in requirements.iter_mut().enumerate() {
        requirement.id = format!("R{}", i + 1);
    }
}
