// All completion prompts for the matching pipeline.
// Reuses the cross-cutting JSON fragment from llm_client::prompts.

/// System prompt for requirement extraction.
pub const EXTRACT_SYSTEM: &str = "You are an expert recruiter. \
    Extract a detailed JSON array of all explicit and implicit job requirements from the job description. \
    For each requirement include the field 'title' (a short, specific title) and 'rationale' \
    (a concise reason or context for why it is needed). \
    Only include requirements that could be checked on a resume: years of experience, education, \
    certifications, security clearance, work eligibility, skills, languages, work location, schedule. \
    Format: [{\"title\": \"...\", \"rationale\": \"...\"}]";

/// Replace `{job_text}` before sending.
pub const EXTRACT_PROMPT_TEMPLATE: &str = "Job Description:\n{job_text}\n\nExtract the requirements as a JSON list.";

/// System prompt for requirement matching. Unclear evidence counts as not met.
pub const MATCH_SYSTEM: &str = "You are a careful HR assistant. \
    For each job requirement below, decide whether the candidate resume CLEARLY meets it. \
    For each requirement output an object \
    {\"id\": <the requirement id, copied exactly>, \"title\": <the requirement title>, \
    \"met\": true or false, \"justification\": <very short explanation>}. \
    Be strict: if the requirement is not CLEARLY met in the resume, set \"met\": false. \
    Return exactly one object per requirement and never rename the id.";

/// Replace `{requirements_json}` and `{resume_text}` before sending.
pub const MATCH_PROMPT_TEMPLATE: &str = "Job requirements:\n{requirements_json}\n\n\
    Candidate resume:\n{resume_text}\n\n\
    Return a JSON array as specified.";

/// System prompt for interview-question suggestions.
pub const SUGGEST_SYSTEM: &str = "You are a smart job matching assistant. \
    Analyze the job description and the resume. \
    1. Suggest up to 5 highly relevant, context-specific questions a candidate might ask about \
    their fit for or preparation for this job. Do NOT use generic questions; infer them from this specific job. \
    2. For each question give a clear answer based on the resume and the job description. \
    Format: [{\"question\": \"...\", \"answer\": \"...\"}]";

/// Replace `{job_text}` and `{resume_text}` before sending.
pub const SUGGEST_PROMPT_TEMPLATE: &str = "Job Description:\n{job_text}\n\nResume:\n{resume_text}\n\n\
    Return only the JSON list.";

pub const MAX_SUGGESTIONS: usize = 5;

/// Sampling parameters per call: (temperature, max_tokens).
pub const EXTRACT_SAMPLING: (f32, u32) = (0.2, 800);
pub const MATCH_SAMPLING: (f32, u32) = (0.2, 1800);
pub const SUGGEST_SAMPLING: (f32, u32) = (0.3, 700);
