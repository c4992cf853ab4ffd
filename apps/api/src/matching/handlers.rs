use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::matching::models::MatchResponse;
use crate::matching::pipeline::ResumeUpload;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────
// POST /upload-resume/
// ────────────────────────────────────────────────────────────

/// Multipart fields: `resume` (file part) and `job_description` (text part).
/// Once both are present the response is always 200, success or pipeline failure.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MatchResponse>, AppError> {
    let mut multipart = multipart?;
    let mut resume: Option<ResumeUpload> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("resume") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                // An unreadable file part degrades to an empty resume.
                let bytes = field.bytes().await.unwrap_or_else(|e| {
                    warn!("Could not read resume part '{filename}': {e}");
                    Bytes::new()
                });
                resume = Some(ResumeUpload { filename, bytes });
            }
            Some("job_description") => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Unreadable job_description field: {e}"))
                })?;
                job_description = Some(text);
            }
            _ => {}
        }
    }

    let resume =
        resume.ok_or_else(|| AppError::Validation("Missing 'resume' file field".to_string()))?;
    let job_description = job_description
        .ok_or_else(|| AppError::Validation("Missing 'job_description' field".to_string()))?;

    info!(
        filename = %resume.filename,
        bytes = resume.bytes.len(),
        job_chars = job_description.len(),
        "Resume upload received"
    );

    let result = state.pipeline.run(resume, &job_description).await;
    Ok(Json(MatchResponse::from(result)))
}
