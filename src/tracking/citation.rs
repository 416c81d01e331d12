//! Citation / utilization tracker
//!
//! Keeps one `CitationRecord` per unit, created lazily on the first
//! citation. Negative signals only update an existing record: a unit that
//! was never cited does not gain a record from a negative signal alone.

use crate::config::UtilizationConfig;
use crate::ledger::{round_rate, Granularity};
use crate::substrate::{is_public, KnowledgeUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Citation ledger entry for one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    /// Cumulative citations
    pub count: u64,
    /// First citation
    pub first_cited: DateTime<Utc>,
    /// Most recent citation
    pub last_cited: DateTime<Utc>,
    /// Citations followed by positive feedback
    pub positive_signals: u64,
    /// Citations or follow-ups with negative feedback
    pub negative_signals: u64,
}

/// Distribution of cited units by citation count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CitationDistribution {
    /// Exactly one citation
    pub once: usize,
    /// 2 to 10 citations
    pub few: usize,
    /// 11 to 100 citations
    pub many: usize,
    /// More than 100 citations
    pub heavy: usize,
}

/// Utilization of the public corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationStats {
    /// Public units considered
    pub public_units: usize,
    /// Public units cited at least once
    pub cited_units: usize,
    /// cited_units / public_units, rounded to 3 decimals
    pub utilization_rate: f64,
    /// Public units cited within the trailing window
    pub cited_in_window: usize,
    /// Window length in days
    pub window_days: i64,
    /// Cited units bucketed by citation count
    pub distribution: CitationDistribution,
    /// Never-cited public units older than N days, keyed by N
    pub dead_weight: BTreeMap<i64, usize>,
}

/// Per-unit citation ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationTracker {
    records: HashMap<String, CitationRecord>,
}

impl CitationTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a citation of `unit_id` at `now`, creating the record if needed
    pub fn record_citation_at(&mut self, unit_id: &str, positive: bool, now: DateTime<Utc>) {
        let record = self
            .records
            .entry(unit_id.to_string())
            .or_insert_with(|| CitationRecord {
                count: 0,
                first_cited: now,
                last_cited: now,
                positive_signals: 0,
                negative_signals: 0,
            });
        record.count += 1;
        record.last_cited = now;
        if positive {
            record.positive_signals += 1;
        } else {
            record.negative_signals += 1;
        }
        tracing::debug!(
            "Citation recorded for {} (count={}, positive={})",
            unit_id,
            record.count,
            positive
        );
    }

    /// Record a citation of `unit_id` now
    pub fn record_citation(&mut self, unit_id: &str, positive: bool) {
        self.record_citation_at(unit_id, positive, Utc::now());
    }

    /// Increment the negative counter of an existing record.
    ///
    /// Returns false, and changes nothing, when the unit was never cited.
    pub fn record_negative_signal(&mut self, unit_id: &str) -> bool {
        match self.records.get_mut(unit_id) {
            Some(record) => {
                record.negative_signals += 1;
                true
            }
            None => false,
        }
    }

    /// Citation record for a unit
    pub fn get(&self, unit_id: &str) -> Option<&CitationRecord> {
        self.records.get(unit_id)
    }

    /// Citation count for a unit (0 when never cited)
    pub fn citation_count(&self, unit_id: &str) -> u64 {
        self.records.get(unit_id).map(|r| r.count).unwrap_or(0)
    }

    /// Number of units with a record
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no unit has been cited
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Utilization of the public units in `units`
    pub fn utilization_stats_at(
        &self,
        units: &[KnowledgeUnit],
        days: i64,
        config: &UtilizationConfig,
        now: DateTime<Utc>,
    ) -> UtilizationStats {
        let window_start = Granularity::Day.window_start(now, days);
        let mut stats = UtilizationStats {
            public_units: 0,
            cited_units: 0,
            utilization_rate: 0.0,
            cited_in_window: 0,
            window_days: days,
            distribution: CitationDistribution::default(),
            dead_weight: config.dead_weight_days.iter().map(|d| (*d, 0)).collect(),
        };

        for unit in units.iter().filter(|u| is_public(u)) {
            stats.public_units += 1;
            match self.records.get(&unit.id).filter(|r| r.count > 0) {
                Some(record) => {
                    stats.cited_units += 1;
                    if record.last_cited >= window_start {
                        stats.cited_in_window += 1;
                    }
                    match record.count {
                        1 => stats.distribution.once += 1,
                        2..=10 => stats.distribution.few += 1,
                        11..=100 => stats.distribution.many += 1,
                        _ => stats.distribution.heavy += 1,
                    }
                }
                None => {
                    for (threshold, count) in stats.dead_weight.iter_mut() {
                        if unit.older_than_days(*threshold, now) {
                            *count += 1;
                        }
                    }
                }
            }
        }

        if stats.public_units > 0 {
            stats.utilization_rate =
                round_rate(stats.cited_units as f64 / stats.public_units as f64);
        }
        stats
    }
}
