use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single checkable condition derived from a job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Synthetic identifier (`R1`, `R2`, …) assigned at extraction time.
    #[serde(default, skip_deserializing)]
    pub id: String,
    #[serde(alias = "requirement")]
    pub title: String,
    #[serde(default, alias = "explanation")]
    pub rationale: String,
}

/// Whether the resume clearly satisfies a requirement.
///
/// Only JSON `true` or a string equal to `"true"` (any case) counts as met;
/// every other value, including a missing field, is `NotMet`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MetStatus {
    Met,
    #[default]
    NotMet,
}

impl MetStatus {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(true) => MetStatus::Met,
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => MetStatus::Met,
            _ => MetStatus::NotMet,
        }
    }

    pub fn is_met(self) -> bool {
        self == MetStatus::Met
    }
}

impl From<bool> for MetStatus {
    fn from(met: bool) -> Self {
        if met {
            MetStatus::Met
        } else {
            MetStatus::NotMet
        }
    }
}

impl<'de> Deserialize<'de> for MetStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(MetStatus::from_value(&Value::deserialize(deserializer)?))
    }
}

/// A met/not-met judgment plus justification for one requirement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchVerdict {
    /// Echo of `Requirement::id`, when the model returned one.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, alias = "requirement")]
    pub title: String,
    #[serde(default)]
    pub met: MetStatus,
    #[serde(default, alias = "explanation", alias = "rationale")]
    pub justification: String,
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Requirement and verdict joined, with a display-ready explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRequirement {
    pub title: String,
    pub explanation: String,
    pub met: bool,
}

/// A suggested interview question grounded in both texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Per-request outcome. Constructed fresh, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Heuristic word-overlap score in `[0, 1]`; not a calibrated probability.
    pub score: f64,
    pub met: Vec<String>,
    pub missing: Vec<String>,
    pub explanations: BTreeMap<String, String>,
    pub suggestions: Vec<Suggestion>,
}

impl MatchResult {
    /// Same shape as a success, zeroed, with one suggestion describing the failure.
    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            met: Vec::new(),
            missing: Vec::new(),
            explanations: BTreeMap::new(),
            suggestions: vec![Suggestion {
                question: "Error".to_string(),
                answer: description.into(),
            }],
        }
    }
}

/// Wire shape of `POST /upload-resume/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub scores: Vec<f64>,
    pub met_requirements: Vec<String>,
    pub missing_requirements: Vec<String>,
    pub requirement_explanations: BTreeMap<String, String>,
    pub ai_suggestions: Vec<Suggestion>,
}

impl From<MatchResult> for MatchResponse {
    fn from(result: MatchResult) -> Self {
        Self {
            scores: vec![result.score],
            met_requirements: result.met,
            missing_requirements: result.missing,
            requirement_explanations: result.explanations,
            ai_suggestions: result.suggestions,
        }
    }
}
