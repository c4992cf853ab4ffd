//! Request orchestration for resume matching.
//!
//! Flow: RECEIVED → TEXT_EXTRACTED → REQUIREMENTS_EXTRACTED → MATCHED →
//!       RECONCILED → SUGGESTED → RESPONDED, with FAILED reachable from any step.
//!
//! `run` never fails: a failure short-circuits the remaining steps and is folded
//! into a zero-score result with the same shape as a success.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::llm_client::{CompletionService, LlmError};
use crate::matching::engine::RequirementEngine;
use crate::matching::models::MatchResult;
use crate::matching::reconciler::{overlap_score, reconcile};
use crate::matching::suggester::suggest_questions;
use crate::matching::text::extract_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    TextExtracted,
    RequirementsExtracted,
    Matched,
    Reconciled,
    Suggested,
    Responded,
}

impl fmt::Display for PipelineStage {
    /// Names the step that leads into the stage.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            PipelineStage::Received => "request intake",
            PipelineStage::TextExtracted => "text extraction",
            PipelineStage::RequirementsExtracted => "requirement extraction",
            PipelineStage::Matched => "requirement matching",
            PipelineStage::Reconciled => "reconciliation",
            PipelineStage::Suggested => "question suggestion",
            PipelineStage::Responded => "response assembly",
        };
        f.write_str(step)
    }
}

/// Typed failure of one pipeline step. `stage` is the stage that was not reached.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} failed: {source}")]
    Upstream {
        stage: PipelineStage,
        source: LlmError,
    },

    #[error("{stage} timed out after {}s", after.as_secs())]
    Timeout {
        stage: PipelineStage,
        after: Duration,
    },
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Upstream { stage, .. } | PipelineError::Timeout { stage, .. } => *stage,
        }
    }
}

/// The uploaded resume as received: filename hint plus raw bytes.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Bytes,
}

pub struct MatchPipeline {
    engine: Arc<dyn RequirementEngine>,
    llm: Arc<dyn CompletionService>,
    call_timeout: Duration,
}

impl MatchPipeline {
    pub fn new(
        engine: Arc<dyn RequirementEngine>,
        llm: Arc<dyn CompletionService>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            llm,
            call_timeout,
        }
    }

    pub async fn run(&self, upload: ResumeUpload, job_text: &str) -> MatchResult {
        match self.try_run(upload, job_text).await {
            Ok(result) => result,
            Err(e) => {
                error!(stage = ?e.stage(), "Matching pipeline failed: {e}");
                MatchResult::failure(e.to_string())
            }
        }
    }

    async fn try_run(&self, upload: ResumeUpload, job_text: &str) -> Result<MatchResult, PipelineError> {
        debug!(
            stage = ?PipelineStage::Received,
            filename = %upload.filename,
            bytes = upload.bytes.len(),
            engine = self.engine.name(),
        );

        let resume_text = extract_upload_text(upload).await;
        debug!(stage = ?PipelineStage::TextExtracted, chars = resume_text.len());

        let requirements = self
            .step(PipelineStage::RequirementsExtracted, self.engine.extract(job_text))
            .await?;

        let verdicts = self
            .step(
                PipelineStage::Matched,
                self.engine.judge(&resume_text, &requirements),
            )
            .await?;

        let reconciliation = reconcile(&requirements, &verdicts);
        let score = overlap_score(&resume_text, job_text);
        debug!(stage = ?PipelineStage::Reconciled, score);

        let suggestions = self
            .step(
                PipelineStage::Suggested,
                suggest_questions(job_text, &resume_text, self.llm.as_ref()),
            )
            .await?;

        let result = MatchResult {
            score,
            met: reconciliation.met(),
            missing: reconciliation.missing(),
            explanations: reconciliation.explanations(),
            suggestions,
        };
        info!(
            stage = ?PipelineStage::Responded,
            met = result.met.len(),
            missing = result.missing.len(),
            "Resume matched"
        );
        Ok(result)
    }

    /// Runs one completion-backed step under the per-call timeout.
    async fn step<T>(
        &self,
        stage: PipelineStage,
        call: impl Future<Output = Result<T, LlmError>>,
    ) -> Result<T, PipelineError> {
        let value = tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| PipelineError::Timeout {
                stage,
                after: self.call_timeout,
            })?
            .map_err(|source| PipelineError::Upstream { stage, source })?;
        debug!(stage = ?stage);
        Ok(value)
    }
}

/// Document decoding is CPU-bound, so it runs on the blocking pool.
async fn extract_upload_text(upload: ResumeUpload) -> String {
    tokio::task::spawn_blocking(move || extract_text(&upload.bytes, &upload.filename))
        .await
        .unwrap_or_else(|e| {
            warn!("Text extraction task failed, continuing with empty resume: {e}");
            String::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::llm_client::CompletionRequest;
    use crate::matching::engine::AiRequirementEngine;
    use crate::matching::repair::SENTINEL_TITLE;
    use crate::matching::rules::HardRuleEngine;
    use crate::test_support::ScriptedCompletion;

    const JOB: &str = "Requires 3 years experience and a driver's license.";
    const RESUME: &str = "I have 5 years experience and hold a valid license.";

    fn upload(text: &str) -> ResumeUpload {
        ResumeUpload {
            filename: "resume.txt".to_string(),
            bytes: Bytes::from(text.to_string()),
        }
    }

    fn ai_pipeline(llm: Arc<ScriptedCompletion>) -> MatchPipeline {
        MatchPipeline::new(
            Arc::new(AiRequirementEngine::new(llm.clone())),
            llm,
            Duration::from_secs(5),
        )
    }

    fn assert_failure_shape(result: &MatchResult) {
        assert_eq!(result.score, 0.0);
        assert!(result.met.is_empty());
        assert!(result.missing.is_empty());
        assert!(result.explanations.is_empty());
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].question, "Error");
    }

    #[tokio::test]
    async fn test_ai_pipeline_happy_path() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Ok(r#"[{"title": "Experience", "rationale": "3 years needed"},
                   {"title": "Driver's license", "rationale": "Field visits"}]"#
                .to_string()),
            Ok(r#"[{"id": "R1", "title": "Experience", "met": true, "justification": "5 years stated"},
                   {"id": "R2", "title": "Driver's license", "met": "false", "justification": "license type unclear"}]"#
                .to_string()),
            Ok(r#"[{"question": "Which license?", "answer": "Clarify the class."}]"#.to_string()),
        ]));
        let pipeline = ai_pipeline(llm.clone());

        let result = pipeline.run(upload(RESUME), JOB).await;

        assert_eq!(result.met, vec!["Experience"]);
        assert_eq!(result.missing, vec!["Driver's license"]);
        assert_eq!(
            result.explanations["Driver's license"],
            "Field visits. license type unclear."
        );
        assert_eq!(result.suggestions[0].question, "Which license?");
        assert!(result.score > 0.0 && result.score < 1.0);
        assert_eq!(llm.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_extraction_failure_short_circuits() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Err(LlmError::Api {
            status: 401,
            message: "invalid api key".to_string(),
        })]));
        let pipeline = ai_pipeline(llm.clone());

        let result = pipeline.run(upload(RESUME), JOB).await;

        assert_failure_shape(&result);
        assert!(result.suggestions[0].answer.contains("requirement extraction"));
        assert!(result.suggestions[0].answer.contains("invalid api key"));
        assert_eq!(llm.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_suggestion_failure_discards_partial_results() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Ok(r#"[{"title": "Rust"}]"#.to_string()),
            Ok(r#"[{"id": "R1", "title": "Rust", "met": true}]"#.to_string()),
            Err(LlmError::EmptyContent),
        ]));
        let result = ai_pipeline(llm).run(upload("Rust"), "Rust").await;
        assert_failure_shape(&result);
        assert!(result.suggestions[0].answer.contains("question suggestion"));
    }

    #[tokio::test]
    async fn test_malformed_output_is_visible_not_fatal() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Ok("Sorry, I can't parse that job.".to_string()),
            Ok("also not json".to_string()),
            Ok(r#"[{"question": "Q?", "answer": "A"}]"#.to_string()),
        ]));
        let result = ai_pipeline(llm).run(upload(RESUME), JOB).await;
        assert_eq!(result.missing, vec![SENTINEL_TITLE]);
        assert!(result.explanations[SENTINEL_TITLE].contains("parse that job"));
        assert!(result.score > 0.0);
    }

    struct HangingCompletion;

    #[async_trait]
    impl CompletionService for HangingCompletion {
        async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_upstream_times_out_into_failure_shape() {
        let llm: Arc<dyn CompletionService> = Arc::new(HangingCompletion);
        let pipeline = MatchPipeline::new(
            Arc::new(AiRequirementEngine::new(llm.clone())),
            llm,
            Duration::from_secs(30),
        );
        let result = pipeline.run(upload(RESUME), JOB).await;
        assert_failure_shape(&result);
        assert!(result.suggestions[0].answer.contains("timed out after 30s"));
    }

    #[tokio::test]
    async fn test_rule_engine_end_to_end_example() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Ok(
            r#"[{"question": "Is a valid license enough?", "answer": "Yes."}]"#.to_string(),
        )]));
        let pipeline = MatchPipeline::new(Arc::new(HardRuleEngine), llm.clone(), Duration::from_secs(5));

        let result = pipeline.run(upload(RESUME), JOB).await;

        assert_eq!(
            result.met,
            vec!["At least 3 years of experience", "Valid driver's license"]
        );
        assert!(result.missing.is_empty());
        assert_eq!(result.explanations.len(), 2);
        assert_eq!(llm.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_still_produces_result() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Ok(
            r#"[{"question": "Q?", "answer": "A"}]"#.to_string(),
        )]));
        let pipeline = MatchPipeline::new(Arc::new(HardRuleEngine), llm, Duration::from_secs(5));
        let broken = ResumeUpload {
            filename: "resume.pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 truncated"),
        };

        let result = pipeline.run(broken, JOB).await;

        assert!(result.met.is_empty());
        assert_eq!(result.missing.len(), 2);
        assert_eq!(result.score, 0.0);
    }
}
