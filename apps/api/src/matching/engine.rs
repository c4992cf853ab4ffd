//! Pluggable backends for requirement extraction and matching.
//!
//! Default: `AiRequirementEngine` (two completion calls).
//! Alternative: `HardRuleEngine` (deterministic pattern scan, see `rules.rs`).
//!
//! `MatchPipeline` holds an `Arc<dyn RequirementEngine>`, chosen at startup via `MATCH_STRATEGY`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm_client::{CompletionService, LlmError};
use crate::matching::extractor::extract_requirements;
use crate::matching::matcher::match_requirements;
use crate::matching::models::{MatchVerdict, Requirement};

#[async_trait]
pub trait RequirementEngine: Send + Sync {
    /// Backend label, for logs.
    fn name(&self) -> &'static str;

    async fn extract(&self, job_text: &str) -> Result<Vec<Requirement>, LlmError>;

    async fn judge(
        &self,
        resume_text: &str,
        requirements: &[Requirement],
    ) -> Result<Vec<MatchVerdict>, LlmError>;
}

pub struct AiRequirementEngine {
    llm: Arc<dyn CompletionService>,
}

impl AiRequirementEngine {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RequirementEngine for AiRequirementEngine {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn extract(&self, job_text: &str) -> Result<Vec<Requirement>, LlmError> {
        extract_requirements(job_text, self.llm.as_ref()).await
    }

    async fn judge(
        &self,
        resume_text: &str,
        requirements: &[Requirement],
    ) -> Result<Vec<MatchVerdict>, LlmError> {
        match_requirements(resume_text, requirements, self.llm.as_ref()).await
    }
}
