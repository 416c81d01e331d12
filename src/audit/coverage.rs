//! Domain coverage analyzer
//!
//! Public units are grouped by primary tag. Small domains with high
//! utilization are flagged as starving (demand outstrips supply); large
//! domains with low utilization as saturated.

use crate::config::CoverageConfig;
use crate::ledger::round_rate;
use crate::substrate::{is_public, KnowledgeUnit};
use crate::tracking::CitationTracker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-domain counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainStats {
    pub units: usize,
    pub cited: usize,
    /// cited / units
    pub utilization: f64,
    /// units / total public units
    pub share: f64,
}

/// Coverage across all domains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainCoverage {
    pub total_units: usize,
    /// Herfindahl index: sum of squared domain shares
    pub concentration_index: f64,
    pub domains: BTreeMap<String, DomainStats>,
    pub starving: Vec<String>,
    pub saturated: Vec<String>,
}

/// Compute per-domain utilization and concentration of the public units
pub fn domain_coverage(
    units: &[KnowledgeUnit],
    citations: &CitationTracker,
    config: &CoverageConfig,
) -> DomainCoverage {
    let mut coverage = DomainCoverage::default();

    for unit in units.iter().filter(|u| is_public(u)) {
        coverage.total_units += 1;
        let stats = coverage
            .domains
            .entry(unit.primary_tag().to_string())
            .or_default();
        stats.units += 1;
        if citations.citation_count(&unit.id) > 0 {
            stats.cited += 1;
        }
    }

    if coverage.total_units == 0 {
        return coverage;
    }

    let total = coverage.total_units as f64;
    let mut concentration = 0.0;
    for (domain, stats) in coverage.domains.iter_mut() {
        let share = stats.units as f64 / total;
        concentration += share * share;
        let utilization = stats.cited as f64 / stats.units as f64;
        stats.share = round_rate(share);
        stats.utilization = round_rate(utilization);

        if stats.units < config.starving_max_units
            && utilization > config.starving_min_utilization
        {
            coverage.starving.push(domain.clone());
        }
        if stats.units > config.saturated_min_units
            && utilization < config.saturated_max_utilization
        {
            coverage.saturated.push(domain.clone());
        }
    }
    coverage.concentration_index = round_rate(concentration);
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{Classification, UnitBuilder};

    fn tagged(id: &str, tag: &str) -> KnowledgeUnit {
        UnitBuilder::new(id).tag(tag).build()
    }

    #[test]
    fn test_uncited_domains() {
        let units = vec![
            tagged("m1", "math"),
            tagged("m2", "math"),
            tagged("m3", "math"),
            tagged("s1", "science"),
            tagged("s2", "science"),
        ];
        let coverage = domain_coverage(&units, &CitationTracker::new(), &CoverageConfig::default());

        assert_eq!(coverage.total_units, 5);
        assert_eq!(coverage.domains["math"].units, 3);
        assert_eq!(coverage.domains["science"].units, 2);
        assert_eq!(coverage.domains["math"].utilization, 0.0);
        assert_eq!(coverage.domains["science"].utilization, 0.0);
        // 0.6² + 0.4²
        assert_eq!(coverage.concentration_index, 0.52);
        assert!(coverage.starving.is_empty());
        assert!(coverage.saturated.is_empty());
    }

    #[test]
    fn test_starving_domain() {
        let units = vec![tagged("a", "rust"), tagged("b", "rust"), UnitBuilder::new("c").build()];
        let mut citations = CitationTracker::new();
        citations.record_citation("a", true);

        let coverage = domain_coverage(&units, &citations, &CoverageConfig::default());
        assert_eq!(coverage.domains["rust"].utilization, 0.5);
        assert_eq!(coverage.domains["untagged"].units, 1);
        assert_eq!(coverage.starving, vec!["rust".to_string()]);
    }

    #[test]
    fn test_saturated_domain() {
        let config = CoverageConfig {
            saturated_min_units: 3,
            ..Default::default()
        };
        let units: Vec<KnowledgeUnit> = (0..4)
            .map(|i| tagged(&format!("h{}", i), "history"))
            .collect();
        let coverage = domain_coverage(&units, &CitationTracker::new(), &config);
        assert_eq!(coverage.saturated, vec!["history".to_string()]);
        assert_eq!(coverage.concentration_index, 1.0);
    }

    #[test]
    fn test_thresholds_use_unrounded_utilization() {
        // 1/3 and 2/3 sit between the thresholds and their 3-decimal roundings
        let config = CoverageConfig {
            starving_min_utilization: 0.3331,
            saturated_min_units: 2,
            saturated_max_utilization: 0.6669,
            ..Default::default()
        };
        let units = vec![
            tagged("a1", "art"),
            tagged("a2", "art"),
            tagged("a3", "art"),
            tagged("b1", "biology"),
            tagged("b2", "biology"),
            tagged("b3", "biology"),
        ];
        let mut citations = CitationTracker::new();
        for id in ["a1", "b1", "b2"] {
            citations.record_citation(id, true);
        }

        let coverage = domain_coverage(&units, &citations, &config);
        assert_eq!(coverage.domains["art"].utilization, 0.333);
        assert_eq!(coverage.domains["biology"].utilization, 0.667);
        assert!(coverage.starving.contains(&"art".to_string()));
        assert!(coverage.saturated.contains(&"biology".to_string()));
    }

    #[test]
    fn test_internal_units_ignored() {
        let units = vec![
            tagged("a", "math"),
            UnitBuilder::new("b")
                .tag("math")
                .classification(Classification::Scaffold)
                .build(),
        ];
        let coverage = domain_coverage(&units, &CitationTracker::new(), &CoverageConfig::default());
        assert_eq!(coverage.total_units, 1);
        assert_eq!(coverage.domains["math"].units, 1);
    }

    #[test]
    fn test_empty_corpus() {
        let coverage = domain_coverage(&[], &CitationTracker::new(), &CoverageConfig::default());
        assert_eq!(coverage, DomainCoverage::default());
    }
}
