//! Batch duplicate audit over recently created units

use crate::config::NoveltyConfig;
use crate::ledger::Granularity;
use crate::novelty::{NoveltyIndex, NoveltyLedger, NoveltyVerdict};
use crate::substrate::{is_public, KnowledgeUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recent unit that duplicates an existing one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedundantUnit {
    pub id: String,
    pub title: String,
    pub closest_id: String,
    pub closest_title: String,
    pub similarity: f64,
}

/// Result of a dedup audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupReport {
    pub run_id: Uuid,
    pub ran_at: DateTime<Utc>,
    pub window_hours: i64,
    /// Public units created inside the window
    pub checked: usize,
    pub novel: usize,
    pub redundant: usize,
    pub trivial: usize,
    /// First redundant units found, capped by `max_redundant_reported`
    pub redundant_units: Vec<RedundantUnit>,
}

/// Check every public unit created in the last `hours` against the rest of
/// the public corpus and tally each verdict into `ledger`.
///
/// Units with an unknown creation time are never inside the window.
pub fn run_dedup_audit(
    units: &[KnowledgeUnit],
    ledger: &mut NoveltyLedger,
    config: &NoveltyConfig,
    hours: i64,
    now: DateTime<Utc>,
) -> DedupReport {
    let window_start = Granularity::Hour.window_start(now, hours);
    let index = NoveltyIndex::new(units);
    let mut report = DedupReport {
        run_id: Uuid::new_v4(),
        ran_at: now,
        window_hours: hours,
        checked: 0,
        novel: 0,
        redundant: 0,
        trivial: 0,
        redundant_units: Vec::new(),
    };

    let recent = units
        .iter()
        .filter(|u| is_public(u))
        .filter(|u| u.created_at.is_some_and(|created| created >= window_start));

    for unit in recent {
        report.checked += 1;
        let check = index.check(unit, config);
        let verdict = check.verdict();
        ledger.record_at(verdict, now);

        match verdict {
            NoveltyVerdict::Novel => report.novel += 1,
            NoveltyVerdict::Trivial => report.trivial += 1,
            NoveltyVerdict::Redundant => {
                report.redundant += 1;
                if report.redundant_units.len() < config.max_redundant_reported {
                    if let Some(closest) = check.closest {
                        report.redundant_units.push(RedundantUnit {
                            id: unit.id.clone(),
                            title: unit.title.clone(),
                            closest_id: closest.id,
                            closest_title: closest.title,
                            similarity: closest.similarity,
                        });
                    }
                }
            }
        }
    }

    tracing::info!(
        run_id = %report.run_id,
        "Dedup audit ({}h): {} checked, {} novel, {} redundant, {} trivial",
        hours,
        report.checked,
        report.novel,
        report.redundant,
        report.trivial
    );
    report
}
