// Shared prompt fragments.
// Each service that needs completion calls defines its own prompts.rs alongside it.

/// Appended to every system prompt that expects a JSON array back.
pub const JSON_ARRAY_ONLY: &str = "Respond with a JSON array only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";
