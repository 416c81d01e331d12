//! Dashboard aggregator
//!
//! Three headline signals of whether the corpus is improving: retrieval
//! hit rate trend, novelty rate and utilization rate. The public unit
//! count and cost per query are computed by the host and only named here.

use crate::config::LearningConfig;
use crate::novelty::{recommended_evolution_ratio, NoveltyLedger, NoveltyStats};
use crate::substrate::KnowledgeUnit;
use crate::tracking::{CitationTracker, RetrievalTracker, RetrievalTrend, UtilizationStats};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Window of the novelty and utilization sections
pub const DASHBOARD_WINDOW_DAYS: i64 = 7;

/// Headline numbers supplied by the host, not by this engine
pub const EXTERNAL_METRICS: [&str; 2] = ["public_unit_count", "cost_per_query"];

/// Composed dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub retrieval: RetrievalTrend,
    pub novelty: NoveltyStats,
    pub utilization: UtilizationStats,
    pub recommended_evolution_ratio: f64,
    pub external_metrics: Vec<String>,
}

/// Compose the dashboard at `now`
pub fn build_dashboard(
    units: &[KnowledgeUnit],
    retrieval: &RetrievalTracker,
    novelty: &NoveltyLedger,
    citations: &CitationTracker,
    config: &LearningConfig,
    now: DateTime<Utc>,
) -> Dashboard {
    Dashboard {
        generated_at: now,
        retrieval: retrieval.trend_at(&config.retrieval, now),
        novelty: novelty.stats_at(DASHBOARD_WINDOW_DAYS, now),
        utilization: citations.utilization_stats_at(
            units,
            DASHBOARD_WINDOW_DAYS,
            &config.utilization,
            now,
        ),
        recommended_evolution_ratio: recommended_evolution_ratio(
            &config.quota,
            novelty.today_rate(now),
        ),
        external_metrics: EXTERNAL_METRICS.iter().map(|m| m.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::novelty::NoveltyVerdict;
    use crate::substrate::UnitBuilder;
    use crate::tracking::{QueryMethod, TrendDirection};

    #[test]
    fn test_dashboard_utilization() {
        let now = Utc::now();
        let config = LearningConfig::default();
        let units: Vec<KnowledgeUnit> = (0..5)
            .map(|i| UnitBuilder::new(format!("u{}", i)).build())
            .collect();
        let mut citations = CitationTracker::new();
        citations.record_citation_at("u0", true, now);
        citations.record_citation_at("u3", true, now);

        let dashboard = build_dashboard(
            &units,
            &RetrievalTracker::new(config.retrieval.max_buckets),
            &NoveltyLedger::new(config.novelty.max_daily_buckets),
            &citations,
            &config,
            now,
        );

        assert_eq!(dashboard.utilization.public_units, 5);
        assert_eq!(dashboard.utilization.cited_units, 2);
        assert_eq!(dashboard.utilization.utilization_rate, 0.4);
        assert_eq!(dashboard.retrieval.direction, TrendDirection::Stable);
        assert_eq!(dashboard.novelty.generated, 0);
        assert_eq!(dashboard.external_metrics, vec!["public_unit_count", "cost_per_query"]);
    }

    #[test]
    fn test_dashboard_reflects_low_novelty() {
        let now = Utc::now();
        let config = LearningConfig::default();
        let mut retrieval = RetrievalTracker::new(config.retrieval.max_buckets);
        retrieval.record_at(QueryMethod::Cache, now);
        let mut novelty = NoveltyLedger::new(config.novelty.max_daily_buckets);
        for _ in 0..9 {
            novelty.record_at(NoveltyVerdict::Redundant, now);
        }
        novelty.record_at(NoveltyVerdict::Novel, now);

        let citations = CitationTracker::new();
        let dashboard = build_dashboard(&[], &retrieval, &novelty, &citations, &config, now);
        assert_eq!(dashboard.novelty.generated, 10);
        assert_eq!(dashboard.novelty.novelty_rate, 0.1);
        assert_eq!(dashboard.retrieval.short.total, 1);
        assert!((dashboard.recommended_evolution_ratio - 0.6).abs() < 1e-9);
    }
}
