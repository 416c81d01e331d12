//! Helpfulness scorer
//!
//! Each response-quality report names the units that were used. A unit's
//! score is `positive / (positive + negative)`, or 0.5 before any signal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Neutral score before any feedback signal
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Units must be used this often to appear among the least helpful
pub const MIN_USES_FOR_BOTTOM: u64 = 3;

/// Downstream feedback for one response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseQuality {
    /// Units used to build the response
    pub units_used: Vec<String>,
    /// The user carried on with the conversation
    #[serde(default)]
    pub user_continued: bool,
    /// The user asked a follow-up question
    #[serde(default)]
    pub user_asked_followup: bool,
    /// The user contradicted the response
    #[serde(default)]
    pub user_contradicted: bool,
}

impl ResponseQuality {
    /// Whether the feedback counts as a positive signal
    pub fn is_positive(&self) -> bool {
        self.user_continued || self.user_asked_followup
    }
}

/// Helpfulness ledger entry for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpfulnessRecord {
    /// Responses the unit contributed to
    pub times_used: u64,
    /// Positive feedback signals
    pub positive_signals: u64,
    /// Negative feedback signals
    pub negative_signals: u64,
    /// Derived score in [0, 1]
    pub score: f64,
}

impl Default for HelpfulnessRecord {
    fn default() -> Self {
        Self {
            times_used: 0,
            positive_signals: 0,
            negative_signals: 0,
            score: NEUTRAL_SCORE,
        }
    }
}

impl HelpfulnessRecord {
    fn rescore(&mut self) {
        let signals = self.positive_signals + self.negative_signals;
        self.score = if signals == 0 {
            NEUTRAL_SCORE
        } else {
            self.positive_signals as f64 / signals as f64
        };
    }

    /// More negative than positive signals
    pub fn is_net_negative(&self) -> bool {
        self.negative_signals > self.positive_signals
    }
}

/// A unit with its helpfulness record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredUnit {
    pub unit_id: String,
    #[serde(flatten)]
    pub record: HelpfulnessRecord,
}

/// Most and least helpful units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpfulnessRanking {
    /// Highest scores first
    pub top: Vec<ScoredUnit>,
    /// Lowest scores first, among units used at least three times
    pub bottom: Vec<ScoredUnit>,
}

/// Per-unit helpfulness ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpfulnessScorer {
    records: HashMap<String, HelpfulnessRecord>,
}

impl HelpfulnessScorer {
    /// Create an empty scorer
    pub fn new() -> Self {
        Self::default()
    }

    /// Update every referenced unit's record from one feedback report
    pub fn record(&mut self, quality: &ResponseQuality) {
        let positive = quality.is_positive();
        for unit_id in &quality.units_used {
            let record = self.records.entry(unit_id.clone()).or_default();
            record.times_used += 1;
            if positive {
                record.positive_signals += 1;
            }
            if quality.user_contradicted {
                record.negative_signals += 1;
            }
            record.rescore();
        }
    }

    /// Helpfulness record for a unit
    pub fn get(&self, unit_id: &str) -> Option<&HelpfulnessRecord> {
        self.records.get(unit_id)
    }

    /// Number of scored units
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no unit has been scored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Top `limit` units by score, and the bottom `limit` among units used
    /// at least three times. Ties break on unit ID for stable output.
    pub fn scores(&self, limit: usize) -> HelpfulnessRanking {
        let mut all: Vec<ScoredUnit> = self
            .records
            .iter()
            .map(|(id, record)| ScoredUnit {
                unit_id: id.clone(),
                record: record.clone(),
            })
            .collect();

        all.sort_by(|a, b| {
            b.record
                .score
                .partial_cmp(&a.record.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });
        let top: Vec<ScoredUnit> = all.iter().take(limit).cloned().collect();

        let mut bottom: Vec<ScoredUnit> = all
            .into_iter()
            .filter(|s| s.record.times_used >= MIN_USES_FOR_BOTTOM)
            .collect();
        bottom.sort_by(|a, b| {
            a.record
                .score
                .partial_cmp(&b.record.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });
        bottom.truncate(limit);

        HelpfulnessRanking { top, bottom }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(units: &[&str], continued: bool, contradicted: bool) -> ResponseQuality {
        ResponseQuality {
            units_used: units.iter().map(|s| s.to_string()).collect(),
            user_continued: continued,
            user_asked_followup: false,
            user_contradicted: contradicted,
        }
    }

    #[test]
    fn test_neutral_without_signals() {
        let mut scorer = HelpfulnessScorer::new();
        scorer.record(&feedback(&["u1"], false, false));
        let record = scorer.get("u1").unwrap();
        assert_eq!(record.times_used, 1);
        assert_eq!(record.score, NEUTRAL_SCORE);
    }

    #[test]
    fn test_score_ratio() {
        let mut scorer = HelpfulnessScorer::new();
        scorer.record(&feedback(&["u1"], true, false));
        scorer.record(&feedback(&["u1"], true, false));
        scorer.record(&feedback(&["u1"], true, false));
        scorer.record(&feedback(&["u1"], false, true));

        let record = scorer.get("u1").unwrap();
        assert_eq!(record.times_used, 4);
        assert_eq!(record.score, 0.75);
        assert!(!record.is_net_negative());
    }

    #[test]
    fn test_followup_counts_positive() {
        let mut scorer = HelpfulnessScorer::new();
        scorer.record(&ResponseQuality {
            units_used: vec!["u1".to_string()],
            user_asked_followup: true,
            ..Default::default()
        });
        assert_eq!(scorer.get("u1").unwrap().positive_signals, 1);
    }

    #[test]
    fn test_continued_and_contradicted_both_count() {
        let mut scorer = HelpfulnessScorer::new();
        scorer.record(&feedback(&["u1"], true, true));
        let record = scorer.get("u1").unwrap();
        assert_eq!(record.positive_signals, 1);
        assert_eq!(record.negative_signals, 1);
        assert_eq!(record.score, 0.5);
    }

    #[test]
    fn test_ranking() {
        let mut scorer = HelpfulnessScorer::new();
        for _ in 0..3 {
            scorer.record(&feedback(&["good"], true, false));
            scorer.record(&feedback(&["bad"], false, true));
        }
        scorer.record(&feedback(&["rare-bad"], false, true));

        let ranking = scorer.scores(2);
        assert_eq!(ranking.top.len(), 2);
        assert_eq!(ranking.top[0].unit_id, "good");
        assert_eq!(ranking.bottom.len(), 2);
        assert_eq!(ranking.bottom[0].unit_id, "bad");
        assert_eq!(ranking.bottom[1].unit_id, "good");
        assert!(ranking.bottom.iter().all(|s| s.unit_id != "rare-bad"));
    }
}
