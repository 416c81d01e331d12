//! Substrate pruner
//!
//! One pass over the units, applying four rules per unit in order:
//!
//! 1. **Uncited**: public, non-seed, never cited, older than the scaffold
//!    age → `scaffold`
//! 2. **Harmful**: used at least `harmful_min_uses` times with negative
//!    signals above `harmful_negative_ratio` × positive → `deprecated`
//!    (may override rule 1)
//! 3. **Archived repair**: `repair` older than the archive age → `deprecated`
//! 4. **Orphaned shadow**: `shadow` whose parent is `deprecated` → `deprecated`
//!
//! Rule 4 sees reclassifications made earlier in the same pass. The pass
//! produces `Reclassification` events applied through the repository;
//! the unit count before and after is always identical.

use crate::config::PruningConfig;
use crate::error::{Error, Result};
use crate::substrate::{
    classify, Classification, KnowledgeUnit, PruneRule, Reclassification, UnitRepository,
};
use crate::tracking::{CitationTracker, HelpfulnessScorer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Counts of a pruning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneSummary {
    pub run_id: Uuid,
    pub ran_at: Option<DateTime<Utc>>,
    pub units_before: usize,
    pub units_after: usize,
    /// Rule 1 hits
    pub scaffolded: usize,
    /// Rule 2 hits
    pub harmful_deprecated: usize,
    /// Rule 3 hits
    pub repair_archived: usize,
    /// Rule 4 hits
    pub shadow_cascaded: usize,
    /// Distinct units whose classification changed
    pub total_pruned: usize,
}

/// Result of a pruning pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruneReport {
    #[serde(flatten)]
    pub summary: PruneSummary,
    /// Applied reclassifications, in unit order
    pub events: Vec<Reclassification>,
}

/// Compute the reclassifications of one pass without applying them
pub fn plan_pruning(
    units: &[KnowledgeUnit],
    citations: &CitationTracker,
    helpfulness: &HelpfulnessScorer,
    config: &PruningConfig,
    now: DateTime<Utc>,
) -> PruneReport {
    let mut working: HashMap<&str, Classification> =
        units.iter().map(|u| (u.id.as_str(), classify(u))).collect();
    let mut summary = PruneSummary {
        run_id: Uuid::new_v4(),
        ran_at: Some(now),
        units_before: units.len(),
        units_after: units.len(),
        ..Default::default()
    };
    let mut events = Vec::new();

    for unit in units {
        let original = classify(unit);
        let mut current = original;
        let mut applied: Option<PruneRule> = None;

        if current.is_public()
            && current != Classification::Seed
            && citations.citation_count(&unit.id) == 0
            && unit.older_than_days(config.scaffold_after_days, now)
        {
            current = Classification::Scaffold;
            applied = Some(PruneRule::Uncited);
            summary.scaffolded += 1;
        }

        if current != Classification::Deprecated {
            if let Some(record) = helpfulness.get(&unit.id) {
                let harmful = record.times_used >= config.harmful_min_uses
                    && record.negative_signals as f64
                        > config.harmful_negative_ratio * record.positive_signals as f64;
                if harmful {
                    current = Classification::Deprecated;
                    applied = Some(PruneRule::Harmful);
                    summary.harmful_deprecated += 1;
                }
            }
        }

        if current == Classification::Repair
            && unit.older_than_days(config.archive_repair_after_days, now)
        {
            current = Classification::Deprecated;
            applied = Some(PruneRule::ArchivedRepair);
            summary.repair_archived += 1;
        }

        if current == Classification::Shadow {
            let parent_deprecated = unit
                .parent_id()
                .and_then(|parent| working.get(parent))
                .is_some_and(|c| *c == Classification::Deprecated);
            if parent_deprecated {
                current = Classification::Deprecated;
                applied = Some(PruneRule::OrphanedShadow);
                summary.shadow_cascaded += 1;
            }
        }

        if let Some(rule) = applied.filter(|_| current != original) {
            working.insert(unit.id.as_str(), current);
            events.push(Reclassification {
                unit_id: unit.id.clone(),
                from: original,
                to: current,
                rule,
                at: now,
            });
        }
    }

    summary.total_pruned = events.len();
    PruneReport { summary, events }
}

/// Run a pruning pass and apply its reclassifications through `repo`
pub fn run_substrate_pruning<R: UnitRepository>(
    repo: &mut R,
    citations: &CitationTracker,
    helpfulness: &HelpfulnessScorer,
    config: &PruningConfig,
    now: DateTime<Utc>,
) -> Result<PruneReport> {
    let mut report = plan_pruning(repo.units(), citations, helpfulness, config, now);

    for event in &report.events {
        repo.apply(event)?;
    }

    report.summary.units_after = repo.len();
    if report.summary.units_after != report.summary.units_before {
        return Err(Error::Repository(format!(
            "unit count changed during pruning: {} -> {}",
            report.summary.units_before, report.summary.units_after
        )));
    }

    tracing::info!(
        run_id = %report.summary.run_id,
        "Pruned {} of {} units (scaffold={}, harmful={}, repair={}, shadow={})",
        report.summary.total_pruned,
        report.summary.units_before,
        report.summary.scaffolded,
        report.summary.harmful_deprecated,
        report.summary.repair_archived,
        report.summary.shadow_cascaded
    );
    Ok(report)
}
