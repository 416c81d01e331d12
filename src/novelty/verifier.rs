//! Novelty verifier and daily novelty ledger
//!
//! A candidate is compared against every public unit in the corpus with
//! lexical Jaccard similarity. The scan stops at the first unit at or above
//! the threshold. Candidates with too few tokens are rejected as trivial
//! without scanning.
//!
//! Verdicts are tallied per UTC day; the day's novelty rate drives the
//! generation quota.

use super::similarity::{jaccard, unit_tokens};
use crate::config::NoveltyConfig;
use crate::ledger::{round_rate, Granularity, TimeSeries};
use crate::substrate::{is_public, KnowledgeUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Outcome of a generation, as tallied in the daily ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyVerdict {
    Novel,
    Redundant,
    Trivial,
}

impl FromStr for NoveltyVerdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "novel" => Ok(NoveltyVerdict::Novel),
            "redundant" => Ok(NoveltyVerdict::Redundant),
            "trivial" => Ok(NoveltyVerdict::Trivial),
            other => Err(format!("unknown novelty verdict '{}'", other)),
        }
    }
}

/// Why a candidate was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyReason {
    /// Too few meaningful tokens to judge
    Trivial,
    /// At or above the similarity threshold with an existing unit
    Duplicate,
}

/// A corpus unit and its similarity to the candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarUnit {
    pub id: String,
    pub title: String,
    pub similarity: f64,
}

/// Result of a novelty check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyCheck {
    /// Whether the candidate is novel
    pub novel: bool,
    /// Rejection reason when not novel
    pub reason: Option<NoveltyReason>,
    /// Highest similarity observed during the scan
    pub max_similarity: f64,
    /// Matching unit for duplicates, closest unit otherwise
    pub closest: Option<SimilarUnit>,
}

impl NoveltyCheck {
    fn trivial() -> Self {
        Self {
            novel: false,
            reason: Some(NoveltyReason::Trivial),
            max_similarity: 0.0,
            closest: None,
        }
    }

    /// Ledger verdict for this check
    pub fn verdict(&self) -> NoveltyVerdict {
        match self.reason {
            Some(NoveltyReason::Trivial) => NoveltyVerdict::Trivial,
            Some(NoveltyReason::Duplicate) => NoveltyVerdict::Redundant,
            None => NoveltyVerdict::Novel,
        }
    }
}

/// Check `candidate` against the public units of `corpus`.
pub fn check_novelty(
    candidate: &KnowledgeUnit,
    corpus: &[KnowledgeUnit],
    config: &NoveltyConfig,
) -> NoveltyCheck {
    let entries = corpus.iter().map(|unit| (unit, None));
    scan(candidate, entries, config)
}

/// Public corpus with token sets computed once, for batch checks
pub struct NoveltyIndex<'a> {
    entries: Vec<(&'a KnowledgeUnit, HashSet<String>)>,
}

impl<'a> NoveltyIndex<'a> {
    /// Tokenize every public unit of `corpus`
    pub fn new(corpus: &'a [KnowledgeUnit]) -> Self {
        let entries = corpus
            .iter()
            .filter(|u| is_public(u))
            .map(|u| (u, unit_tokens(u)))
            .collect();
        Self { entries }
    }

    /// Same as [`check_novelty`] against the indexed corpus
    pub fn check(&self, candidate: &KnowledgeUnit, config: &NoveltyConfig) -> NoveltyCheck {
        let entries = self.entries.iter().map(|(unit, tokens)| (*unit, Some(tokens)));
        scan(candidate, entries, config)
    }

    /// Number of indexed public units
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scan<'a, I>(candidate: &KnowledgeUnit, entries: I, config: &NoveltyConfig) -> NoveltyCheck
where
    I: Iterator<Item = (&'a KnowledgeUnit, Option<&'a HashSet<String>>)>,
{
    let candidate_tokens = unit_tokens(candidate);
    if candidate_tokens.len() < config.min_tokens {
        return NoveltyCheck::trivial();
    }

    let mut max_similarity = 0.0_f64;
    let mut closest: Option<SimilarUnit> = None;

    for (unit, cached) in entries {
        if unit.id == candidate.id || !is_public(unit) {
            continue;
        }
        let similarity = match cached {
            Some(tokens) => jaccard(&candidate_tokens, tokens),
            None => jaccard(&candidate_tokens, &unit_tokens(unit)),
        };

        if similarity > max_similarity || closest.is_none() {
            max_similarity = max_similarity.max(similarity);
            closest = Some(SimilarUnit {
                id: unit.id.clone(),
                title: unit.title.clone(),
                similarity: round_rate(similarity),
            });
        }

        if similarity >= config.similarity_threshold {
            return NoveltyCheck {
                novel: false,
                reason: Some(NoveltyReason::Duplicate),
                max_similarity: round_rate(similarity),
                closest,
            };
        }
    }

    NoveltyCheck {
        novel: true,
        reason: None,
        max_similarity: round_rate(max_similarity),
        closest,
    }
}

/// Generation verdicts for one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoveltyDailyBucket {
    pub generated: u64,
    pub novel: u64,
    pub redundant: u64,
    pub trivial: u64,
}

impl NoveltyDailyBucket {
    /// Novel share of generations, `None` before any generation
    pub fn novelty_rate(&self) -> Option<f64> {
        (self.generated > 0).then(|| self.novel as f64 / self.generated as f64)
    }
}

/// Novelty over a trailing window of days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoveltyStats {
    pub days: i64,
    pub generated: u64,
    pub novel: u64,
    pub redundant: u64,
    pub trivial: u64,
    /// novel / generated, rounded to 3 decimals (0 without data)
    pub novelty_rate: f64,
}

/// Daily novelty verdict counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoveltyLedger {
    days: TimeSeries<NoveltyDailyBucket>,
}

impl NoveltyLedger {
    /// Create a ledger keeping at most `max_days` days
    pub fn new(max_days: usize) -> Self {
        Self {
            days: TimeSeries::new(Granularity::Day, max_days),
        }
    }

    /// Tally a verdict for the day containing `now`
    pub fn record_at(&mut self, verdict: NoveltyVerdict, now: DateTime<Utc>) {
        let Some(bucket) = self.days.bucket_mut(now) else {
            return;
        };
        bucket.generated += 1;
        match verdict {
            NoveltyVerdict::Novel => bucket.novel += 1,
            NoveltyVerdict::Redundant => bucket.redundant += 1,
            NoveltyVerdict::Trivial => bucket.trivial += 1,
        }
    }

    /// Tally a verdict given as a string; unknown verdicts are ignored.
    ///
    /// Returns whether anything was counted.
    pub fn record_str_at(&mut self, verdict: &str, now: DateTime<Utc>) -> bool {
        match verdict.parse::<NoveltyVerdict>() {
            Ok(v) => {
                self.record_at(v, now);
                true
            }
            Err(e) => {
                tracing::debug!("Ignoring generation record: {}", e);
                false
            }
        }
    }

    /// Bucket for the day containing `now`
    pub fn day(&self, now: DateTime<Utc>) -> Option<&NoveltyDailyBucket> {
        self.days.bucket(now)
    }

    /// Novelty rate for the day containing `now`; 1.0 before any generation
    pub fn today_rate(&self, now: DateTime<Utc>) -> f64 {
        self.day(now).and_then(|b| b.novelty_rate()).unwrap_or(1.0)
    }

    /// Totals over the trailing `days` ending at `now`, including today
    pub fn stats_at(&self, days: i64, now: DateTime<Utc>) -> NoveltyStats {
        let today = Granularity::Day.start(now);
        let cutoff = Granularity::Day.window_start(today, days.saturating_sub(1).max(0));
        let mut stats = NoveltyStats {
            days,
            generated: 0,
            novel: 0,
            redundant: 0,
            trivial: 0,
            novelty_rate: 0.0,
        };
        for bucket in self.days.since(cutoff) {
            stats.generated += bucket.generated;
            stats.novel += bucket.novel;
            stats.redundant += bucket.redundant;
            stats.trivial += bucket.trivial;
        }
        if stats.generated > 0 {
            stats.novelty_rate = round_rate(stats.novel as f64 / stats.generated as f64);
        }
        stats
    }

    /// Change the day capacity
    pub fn set_capacity(&mut self, max_days: usize) {
        self.days.set_capacity(max_days);
    }

    /// Number of days held
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether no day has been recorded
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
