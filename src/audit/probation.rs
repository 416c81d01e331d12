//! Probation gate
//!
//! Every non-seed unit spends a fixed window on probation after creation.
//! Once the window has passed the unit is promoted if it was cited and its
//! feedback is not net-negative, and demoted otherwise. Demotion is not
//! terminal: a later citation promotes the unit on the next evaluation.
//!
//! The audit only reports demotion candidates; applying them is up to the
//! caller.

use crate::config::ProbationConfig;
use crate::substrate::{classify, Classification, KnowledgeUnit};
use crate::tracking::{CitationTracker, HelpfulnessScorer};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Probation state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbationState {
    Probation,
    Promoted,
    Demoted,
}

/// Why a unit is in its probation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbationReason {
    /// Seed units are always promoted
    Seed,
    /// Still inside the probation window
    InProbation,
    /// Creation time unknown; kept on probation
    UnknownAge,
    /// Past probation without a single citation
    NeverCitedAfterProbation,
    /// More negative than positive helpfulness signals
    NegativeHelpfulness,
    /// Cited, with non-negative feedback
    CitedDuringProbation,
}

/// State and reason for one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbationVerdict {
    pub state: ProbationState,
    pub reason: ProbationReason,
}

impl ProbationVerdict {
    fn new(state: ProbationState, reason: ProbationReason) -> Self {
        Self { state, reason }
    }
}

/// Evaluate one unit at `now`
pub fn evaluate(
    unit: &KnowledgeUnit,
    citations: &CitationTracker,
    helpfulness: &HelpfulnessScorer,
    config: &ProbationConfig,
    now: DateTime<Utc>,
) -> ProbationVerdict {
    if classify(unit) == Classification::Seed {
        return ProbationVerdict::new(ProbationState::Promoted, ProbationReason::Seed);
    }

    let Some(age) = unit.age(now) else {
        return ProbationVerdict::new(ProbationState::Probation, ProbationReason::UnknownAge);
    };
    if TimeDelta::try_days(config.window_days).map_or(true, |window| age < window) {
        return ProbationVerdict::new(ProbationState::Probation, ProbationReason::InProbation);
    }

    if citations.citation_count(&unit.id) == 0 {
        return ProbationVerdict::new(
            ProbationState::Demoted,
            ProbationReason::NeverCitedAfterProbation,
        );
    }

    if helpfulness
        .get(&unit.id)
        .is_some_and(|record| record.is_net_negative())
    {
        return ProbationVerdict::new(ProbationState::Demoted, ProbationReason::NegativeHelpfulness);
    }

    ProbationVerdict::new(ProbationState::Promoted, ProbationReason::CitedDuringProbation)
}

/// A unit the audit recommends demoting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemotionCandidate {
    pub id: String,
    pub title: String,
    pub reason: ProbationReason,
}

/// Result of a probation audit over the public corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbationAudit {
    pub ran_at: DateTime<Utc>,
    pub evaluated: usize,
    pub probation: usize,
    pub promoted: usize,
    pub demoted: usize,
    pub candidates: Vec<DemotionCandidate>,
}

/// Evaluate every public unit and collect demotion candidates
pub fn run_probation_audit(
    units: &[KnowledgeUnit],
    citations: &CitationTracker,
    helpfulness: &HelpfulnessScorer,
    config: &ProbationConfig,
    now: DateTime<Utc>,
) -> ProbationAudit {
    let mut audit = ProbationAudit {
        ran_at: now,
        evaluated: 0,
        probation: 0,
        promoted: 0,
        demoted: 0,
        candidates: Vec::new(),
    };

    for unit in units.iter().filter(|u| classify(u).is_public()) {
        audit.evaluated += 1;
        let verdict = evaluate(unit, citations, helpfulness, config, now);
        match verdict.state {
            ProbationState::Probation => audit.probation += 1,
            ProbationState::Promoted => audit.promoted += 1,
            ProbationState::Demoted => {
                audit.demoted += 1;
                audit.candidates.push(DemotionCandidate {
                    id: unit.id.clone(),
                    title: unit.title.clone(),
                    reason: verdict.reason,
                });
            }
        }
    }

    tracing::info!(
        "Probation audit: {} evaluated, {} promoted, {} on probation, {} demoted",
        audit.evaluated,
        audit.promoted,
        audit.probation,
        audit.demoted
    );
    audit
}
