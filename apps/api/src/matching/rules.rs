//! Hard-rule engine: deterministic requirement scan, no completion calls.
//!
//! Job text is scanned for a fixed set of checkable requirement patterns; each hit
//! becomes a requirement with a descriptive title. The resume is then scanned for
//! the matching evidence.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::llm_client::LlmError;
use crate::matching::engine::RequirementEngine;
use crate::matching::extractor::assign_ids;
use crate::matching::models::{MatchVerdict, MetStatus, Requirement};

static YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b").expect("years pattern is valid")
});

struct KeywordRule {
    title: &'static str,
    rationale: &'static str,
    evidence: &'static str,
    job: Regex,
    resume: Regex,
}

impl KeywordRule {
    fn new(
        title: &'static str,
        rationale: &'static str,
        evidence: &'static str,
        job: &str,
        resume: &str,
    ) -> Self {
        Self {
            title,
            rationale,
            evidence,
            job: Regex::new(job).expect("job pattern is valid"),
            resume: Regex::new(resume).expect("resume pattern is valid"),
        }
    }
}

static KEYWORD_RULES: LazyLock<Vec<KeywordRule>> = LazyLock::new(|| {
    vec![
        KeywordRule::new(
            "Valid driver's license",
            "The job description asks for a driver's license.",
            "a license",
            r"(?i)\bdriver(?:'|’)?s?\s+licen[cs]e\b|\bdriving\s+licen[cs]e\b",
            r"(?i)\blicen[cs]e\b",
        ),
        KeywordRule::new(
            "Bachelor's degree",
            "The job description asks for a university degree.",
            "a degree",
            r"(?i)\bbachelor(?:'|’)?s?\b|\b(?:university|college)\s+degree\b|\bdegree\s+in\b",
            r"(?i)\bbachelor|\bmaster|\bph\.?d\b|\bdegree\b|\bB\.?(?:Sc|S|A)\b|\bM\.?(?:Sc|S|A)\b",
        ),
        KeywordRule::new(
            "Security clearance",
            "The job description asks for a security clearance.",
            "a clearance",
            r"(?i)\bclearance\b",
            r"(?i)\bclearance\b",
        ),
        KeywordRule::new(
            "Authorized to work",
            "The job description asks for work authorization.",
            "work authorization",
            r"(?i)\bauthori[sz]ed\s+to\s+work\b|\bwork\s+authori[sz]ation\b|\beligib(?:le|ility)\s+to\s+work\b|\bright\s+to\s+work\b",
            r"(?i)\bauthori[sz]ed\s+to\s+work\b|\bwork\s+authori[sz]ation\b|\bcitizen|\bpermanent\s+resident\b|\bwork\s+permit\b|\bright\s+to\s+work\b|\bgreen\s+card\b",
        ),
        KeywordRule::new(
            "Professional certification",
            "The job description asks for a professional certification.",
            "a certification",
            r"(?i)\bcertifi(?:ed|cations?)\b",
            r"(?i)\bcertifi(?:ed|cates?|cations?)\b",
        ),
    ]
});

/// Largest "N years" figure in `text`.
fn max_years(text: &str) -> Option<u32> {
    YEARS
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
}

fn years_title(years: u32) -> String {
    format!("At least {years} years of experience")
}

/// Requirements found in the job text, in rule order.
pub fn extract_rule_requirements(job_text: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();

    if let Some(years) = max_years(job_text) {
        requirements.push(Requirement {
            id: String::new(),
            title: years_title(years),
            rationale: format!("The job description asks for {years} years of experience."),
        });
    }

    requirements.extend(
        KEYWORD_RULES
            .iter()
            .filter(|rule| rule.job.is_match(job_text))
            .map(|rule| Requirement {
                id: String::new(),
                title: rule.title.to_string(),
                rationale: rule.rationale.to_string(),
            }),
    );

    assign_ids(&mut requirements);
    requirements
}

/// One verdict per requirement; requirements no rule understands are not met.
pub fn judge_rule_requirements(resume_text: &str, requirements: &[Requirement]) -> Vec<MatchVerdict> {
    requirements
        .iter()
        .map(|requirement| {
            let (met, justification) = judge_one(resume_text, &requirement.title);
            MatchVerdict {
                id: Some(requirement.id.clone()),
                title: requirement.title.clone(),
                met: MetStatus::from(met),
                justification,
            }
        })
        .collect()
}

fn judge_one(resume_text: &str, title: &str) -> (bool, String) {
    if let Some(rule) = KEYWORD_RULES.iter().find(|r| r.title == title) {
        return if rule.resume.is_match(resume_text) {
            (true, format!("The resume mentions {}.", rule.evidence))
        } else {
            (false, format!("No mention of {} found in the resume.", rule.evidence))
        };
    }

    if let Some(required) = max_years(title) {
        return match max_years(resume_text) {
            Some(stated) if stated >= required => {
                (true, format!("The resume states {stated} years of experience."))
            }
            Some(stated) => (
                false,
                format!("The resume states only {stated} years of experience."),
            ),
            None => (false, "The resume does not state years of experience.".to_string()),
        };
    }

    (false, "No hard rule covers this requirement.".to_string())
}

pub struct HardRuleEngine;

#[async_trait]
impl RequirementEngine for HardRuleEngine {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn extract(&self, job_text: &str) -> Result<Vec<Requirement>, LlmError> {
        Ok(extract_rule_requirements(job_text))
    }

    async fn judge(
        &self,
        resume_text: &str,
        requirements: &[Requirement],
    ) -> Result<Vec<MatchVerdict>, LlmError> {
        Ok(judge_rule_requirements(resume_text, requirements))
    }
}
