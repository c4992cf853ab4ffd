//! Joins requirements with verdicts and partitions them into met / missing.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::matching::explanation::{clean, join_explanation};
use crate::matching::models::{MatchVerdict, ReconciledRequirement, Requirement};

/// Added to the overlap denominator so an empty job description scores 0 instead of NaN.
const SCORE_EPSILON: f64 = 1e-5;

/// Reconciled verdicts plus the partition the response exposes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub requirements: Vec<ReconciledRequirement>,
}

impl Reconciliation {
    pub fn met(&self) -> Vec<String> {
        self.titles_where(true)
    }

    pub fn missing(&self) -> Vec<String> {
        self.titles_where(false)
    }

    pub fn explanations(&self) -> BTreeMap<String, String> {
        self.requirements
            .iter()
            .map(|r| (r.title.clone(), r.explanation.clone()))
            .collect()
    }

    fn titles_where(&self, met: bool) -> Vec<String> {
        self.requirements
            .iter()
            .filter(|r| r.met == met)
            .map(|r| r.title.clone())
            .collect()
    }
}

/// Joins each verdict to its requirement, by id when the verdict echoes one,
/// otherwise by exact title. Verdict order is preserved.
///
/// - a verdict with no matching requirement still gets an explanation (its justification);
/// - the first verdict for a title wins, so a title is never both met and missing;
/// - a requirement that received no verdict appears in neither list.
pub fn reconcile(requirements: &[Requirement], verdicts: &[MatchVerdict]) -> Reconciliation {
    let mut by_id: HashMap<&str, &Requirement> = HashMap::new();
    let mut by_title: HashMap<&str, &Requirement> = HashMap::new();
    for requirement in requirements {
        if !requirement.id.is_empty() {
            by_id.entry(requirement.id.as_str()).or_insert(requirement);
        }
        by_title.entry(requirement.title.as_str()).or_insert(requirement);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut reconciled = Vec::with_capacity(verdicts.len());

    for verdict in verdicts {
        let by_verdict_id = verdict
            .id
            .as_deref()
            .and_then(|id| by_id.get(id).copied());

        // An id hit means the requirement's own title is authoritative.
        let (title, requirement) = match by_verdict_id {
            Some(requirement) => (requirement.title.clone(), Some(requirement)),
            None => (
                verdict.title.clone(),
                by_title.get(verdict.title.as_str()).copied(),
            ),
        };

        if title.trim().is_empty() {
            warn!("Dropping verdict with no title and no known id");
            continue;
        }
        if !seen.insert(title.clone()) {
            debug!("Ignoring duplicate verdict for '{title}'");
            continue;
        }

        let rationale = requirement.map(|r| r.rationale.as_str()).unwrap_or_default();
        reconciled.push(ReconciledRequirement {
            explanation: clean(&join_explanation(rationale, &verdict.justification)),
            met: verdict.met.is_met(),
            title,
        });
    }

    let unjudged = requirements
        .iter()
        .filter(|r| !seen.contains(&r.title))
        .count();
    if unjudged > 0 {
        warn!("{unjudged} requirement(s) received no verdict and are left out of met/missing");
    }

    Reconciliation {
        requirements: reconciled,
    }
}

/// Fraction of the job's distinct words that also appear in the resume.
/// Case-insensitive, alphanumeric runs; always in `[0, 1)`.
pub fn overlap_score(resume_text: &str, job_text: &str) -> f64 {
    let resume_words = word_set(resume_text);
    let job_words = word_set(job_text);
    let overlap = job_words.intersection(&resume_words).count();
    overlap as f64 / (job_words.len() as f64 + SCORE_EPSILON)
}

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
