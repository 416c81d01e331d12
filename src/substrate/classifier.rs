//! Knowledge-unit classifier
//!
//! Assigns every unit exactly one of eight labels. Four labels are public
//! (counted in the externally visible total), four are internal
//! infrastructure. Rules are evaluated in a fixed order, first match wins:
//!
//! 1. an already-valid stored classification
//! 2. `shadow` for internal-reasoning tier or shadow tags
//! 3. `repair` for units created by the repair/audit subsystem
//! 4. `cross-domain` / `compound` by tier
//! 5. `seed` for seed/bootstrap sources or seed authority
//! 6. `knowledge` otherwise

use super::unit::{KnowledgeUnit, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tags that mark a unit as internal reasoning
const SHADOW_TAGS: [&str; 2] = ["shadow", "internal-reasoning"];

/// Tags that mark a unit as produced by the repair subsystem
const REPAIR_TAGS: [&str; 2] = ["repair", "repair-cortex"];

/// Metadata keys that may name the creating subsystem
const CREATOR_KEYS: [&str; 4] = ["created_by", "createdBy", "origin", "generated_by"];

/// Sources that denote foundational units
const SEED_SOURCES: [&str; 2] = ["seed", "bootstrap"];

/// Taxonomy label of a knowledge unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Ordinary learned knowledge
    Knowledge,
    /// Foundational seed knowledge
    Seed,
    /// Knowledge compounded from several units
    Compound,
    /// Knowledge bridging domains
    CrossDomain,
    /// Internal reasoning trace
    Shadow,
    /// Produced by the repair/audit subsystem
    Repair,
    /// Stale unit kept as structural support
    Scaffold,
    /// Harmful or archived unit
    Deprecated,
}

impl Classification {
    /// All labels, public first
    pub const ALL: [Classification; 8] = [
        Classification::Knowledge,
        Classification::Seed,
        Classification::Compound,
        Classification::CrossDomain,
        Classification::Shadow,
        Classification::Repair,
        Classification::Scaffold,
        Classification::Deprecated,
    ];

    /// Whether the label counts toward the public total
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Classification::Knowledge
                | Classification::Seed
                | Classification::Compound
                | Classification::CrossDomain
        )
    }

    /// Stable string form
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Knowledge => "knowledge",
            Classification::Seed => "seed",
            Classification::Compound => "compound",
            Classification::CrossDomain => "cross-domain",
            Classification::Shadow => "shadow",
            Classification::Repair => "repair",
            Classification::Scaffold => "scaffold",
            Classification::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classification::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown classification '{}'", s))
    }
}

/// Classify a unit.
pub fn classify(unit: &KnowledgeUnit) -> Classification {
    if let Some(stored) = unit.classification {
        return stored;
    }

    if unit.tier == Some(Tier::InternalReasoning) || SHADOW_TAGS.iter().any(|t| unit.has_tag(t)) {
        return Classification::Shadow;
    }

    if is_repair_origin(unit) {
        return Classification::Repair;
    }

    match unit.tier {
        Some(Tier::CrossDomain) => return Classification::CrossDomain,
        Some(Tier::Compound) => return Classification::Compound,
        _ => {}
    }

    if is_seed_origin(unit) {
        return Classification::Seed;
    }

    Classification::Knowledge
}

/// Classify a possibly-missing unit; a missing unit is `knowledge`.
pub fn classify_option(unit: Option<&KnowledgeUnit>) -> Classification {
    unit.map(classify).unwrap_or(Classification::Knowledge)
}

/// Whether the unit counts toward the public total
pub fn is_public(unit: &KnowledgeUnit) -> bool {
    classify(unit).is_public()
}

/// Write the derived classification onto the unit. Idempotent.
pub fn apply_classification(unit: &mut KnowledgeUnit) -> Classification {
    let classification = classify(unit);
    unit.classification = Some(classification);
    classification
}

fn is_repair_origin(unit: &KnowledgeUnit) -> bool {
    let source_match = unit
        .source
        .as_deref()
        .is_some_and(|s| s.to_ascii_lowercase().contains("repair"));
    let tag_match = REPAIR_TAGS.iter().any(|t| unit.has_tag(t));
    let metadata_match = CREATOR_KEYS.iter().any(|key| {
        unit.metadata_str(key)
            .is_some_and(|v| v.to_ascii_lowercase().contains("repair"))
    });
    source_match || tag_match || metadata_match
}

fn is_seed_origin(unit: &KnowledgeUnit) -> bool {
    let source_match = unit
        .source
        .as_deref()
        .is_some_and(|s| SEED_SOURCES.iter().any(|seed| s.eq_ignore_ascii_case(seed)));
    let authority_match = unit
        .authority
        .as_ref()
        .and_then(|a| a.model.as_deref())
        .is_some_and(|m| m.eq_ignore_ascii_case("seed"));
    source_match || authority_match
}

/// Result of back-filling stored classifications
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Units whose classification field was missing and is now set
    pub migrated: usize,
    /// Units per label after migration
    pub counts: BTreeMap<Classification, usize>,
}

/// Back-fill missing classification fields, returning counts per label.
pub fn migrate(units: &mut [KnowledgeUnit]) -> MigrationReport {
    let mut report = MigrationReport::default();
    for unit in units.iter_mut() {
        if unit.classification.is_none() {
            report.migrated += 1;
        }
        let label = apply_classification(unit);
        *report.counts.entry(label).or_insert(0) += 1;
    }
    tracing::info!(
        "Classification migration complete: {} of {} units back-filled",
        report.migrated,
        units.len()
    );
    report
}

/// Public partition counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicCounts {
    pub total: usize,
    pub knowledge: usize,
    pub seed: usize,
    pub compound: usize,
    pub cross_domain: usize,
}

/// Internal partition counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InternalCounts {
    pub total: usize,
    pub shadow: usize,
    pub repair: usize,
    pub scaffold: usize,
    pub deprecated: usize,
}

/// Partition of a unit collection into public and internal labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstrateStats {
    /// Publicly counted units
    pub knowledge: PublicCounts,
    /// Internal infrastructure units
    pub internal: InternalCounts,
    /// Sum of both partitions
    pub grand_total: usize,
    /// Number of input units (main collection plus shadow store)
    pub input_total: usize,
}

impl SubstrateStats {
    /// The partition covers every input exactly once
    pub fn is_consistent(&self) -> bool {
        self.knowledge.total + self.internal.total == self.grand_total
            && self.grand_total == self.input_total
    }

    fn count(&mut self, label: Classification) {
        match label {
            Classification::Knowledge => self.knowledge.knowledge += 1,
            Classification::Seed => self.knowledge.seed += 1,
            Classification::Compound => self.knowledge.compound += 1,
            Classification::CrossDomain => self.knowledge.cross_domain += 1,
            Classification::Shadow => self.internal.shadow += 1,
            Classification::Repair => self.internal.repair += 1,
            Classification::Scaffold => self.internal.scaffold += 1,
            Classification::Deprecated => self.internal.deprecated += 1,
        }
        if label.is_public() {
            self.knowledge.total += 1;
        } else {
            self.internal.total += 1;
        }
        self.grand_total += 1;
    }
}

/// Partition `units`, plus an optional separately stored shadow collection,
/// into public and internal counts.
///
/// Units in `shadow_store` are counted as `shadow` regardless of their own
/// fields.
pub fn compute_substrate_stats(
    units: &[KnowledgeUnit],
    shadow_store: Option<&[KnowledgeUnit]>,
) -> SubstrateStats {
    let mut stats = SubstrateStats::default();

    for unit in units {
        stats.count(classify(unit));
    }

    let shadow = shadow_store.unwrap_or(&[]);
    for _ in shadow {
        stats.count(Classification::Shadow);
    }

    stats.input_total = units.len() + shadow.len();

    if !stats.is_consistent() {
        tracing::warn!(
            "Substrate partition mismatch: public={} internal={} grand_total={} inputs={}",
            stats.knowledge.total,
            stats.internal.total,
            stats.grand_total,
            stats.input_total
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::unit::UnitBuilder;

    fn sample_units() -> Vec<KnowledgeUnit> {
        vec![
            UnitBuilder::new("k").title("plain").build(),
            UnitBuilder::new("s").source("seed").build(),
            UnitBuilder::new("c").tier(Tier::Compound).build(),
            UnitBuilder::new("x").tier(Tier::CrossDomain).build(),
            UnitBuilder::new("sh").tier(Tier::InternalReasoning).build(),
            UnitBuilder::new("r").source("repair-cortex").build(),
            UnitBuilder::new("sc")
                .classification(Classification::Scaffold)
                .build(),
            UnitBuilder::new("d")
                .classification(Classification::Deprecated)
                .build(),
        ]
    }

    #[test]
    fn test_classify_missing_is_knowledge() {
        assert_eq!(classify_option(None), Classification::Knowledge);
        let unit = UnitBuilder::new("u").build();
        assert_eq!(classify_option(Some(&unit)), Classification::Knowledge);
    }

    #[test]
    fn test_stored_classification_wins() {
        let unit = UnitBuilder::new("u")
            .tier(Tier::InternalReasoning)
            .classification(Classification::Seed)
            .build();
        assert_eq!(classify(&unit), Classification::Seed);
    }

    #[test]
    fn test_shadow_before_repair() {
        let unit = UnitBuilder::new("u")
            .tag("shadow")
            .source("repair-cortex")
            .build();
        assert_eq!(classify(&unit), Classification::Shadow);
    }

    #[test]
    fn test_repair_detection_paths() {
        let by_source = UnitBuilder::new("a").source("Repair-Loop").build();
        let by_tag = UnitBuilder::new("b").tag("repair").build();
        let by_meta = UnitBuilder::new("c")
            .metadata("created_by", serde_json::json!("repair_cortex"))
            .build();
        for unit in [by_source, by_tag, by_meta] {
            assert_eq!(classify(&unit), Classification::Repair, "unit {}", unit.id);
        }
    }

    #[test]
    fn test_repair_before_tier() {
        let unit = UnitBuilder::new("u")
            .tier(Tier::Compound)
            .tag("repair")
            .build();
        assert_eq!(classify(&unit), Classification::Repair);
    }

    #[test]
    fn test_tier_before_seed() {
        let unit = UnitBuilder::new("u")
            .tier(Tier::CrossDomain)
            .source("seed")
            .build();
        assert_eq!(classify(&unit), Classification::CrossDomain);
    }

    #[test]
    fn test_seed_detection() {
        let by_source = UnitBuilder::new("a").source("bootstrap").build();
        let by_authority = UnitBuilder::new("b").authority_model("seed").build();
        assert_eq!(classify(&by_source), Classification::Seed);
        assert_eq!(classify(&by_authority), Classification::Seed);
    }

    #[test]
    fn test_is_public_matches_label_group() {
        for unit in sample_units() {
            let label = classify(&unit);
            assert!(Classification::ALL.contains(&label));
            assert_eq!(is_public(&unit), label.is_public());
        }
    }

    #[test]
    fn test_apply_classification_idempotent() {
        let mut unit = UnitBuilder::new("u").tier(Tier::Compound).build();
        assert_eq!(apply_classification(&mut unit), Classification::Compound);
        assert_eq!(apply_classification(&mut unit), Classification::Compound);
        assert_eq!(unit.classification, Some(Classification::Compound));
    }

    #[test]
    fn test_migrate_backfills() {
        let mut units = sample_units();
        let report = migrate(&mut units);
        assert_eq!(report.migrated, 6);
        assert_eq!(report.counts.values().sum::<usize>(), 8);
        assert!(units.iter().all(|u| u.classification.is_some()));

        let again = migrate(&mut units);
        assert_eq!(again.migrated, 0);
        assert_eq!(again.counts, report.counts);
    }

    #[test]
    fn test_substrate_stats_partition() {
        let units = sample_units();
        let stats = compute_substrate_stats(&units, None);
        assert_eq!(stats.knowledge.total, 4);
        assert_eq!(stats.internal.total, 4);
        assert_eq!(stats.knowledge.total + stats.internal.total, units.len());
        assert_eq!(stats.grand_total, units.len());
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_substrate_stats_with_shadow_store() {
        let units = sample_units();
        let shadows = vec![
            UnitBuilder::new("ext-1").build(),
            UnitBuilder::new("ext-2").build(),
        ];
        let stats = compute_substrate_stats(&units, Some(&shadows));
        assert_eq!(stats.internal.shadow, 3);
        assert_eq!(stats.grand_total, units.len() + shadows.len());
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_classification_string_forms() {
        for label in Classification::ALL {
            assert_eq!(label.as_str().parse::<Classification>().unwrap(), label);
            let json = serde_json::to_string(&label).unwrap();
            assert_eq!(json, format!("\"{}\"", label));
        }
        assert!("mystery".parse::<Classification>().is_err());
    }
}
