//! Learning store, the aggregate root
//!
//! `LearningStore` owns every ledger the engine keeps: hourly retrieval
//! buckets, the citation and helpfulness ledgers, daily novelty buckets,
//! generation counters and the prune/dedup run histories. It is constructed
//! explicitly and passed to callers; there is no global instance.
//!
//! The store is a cache over state that must be persisted elsewhere.
//! [`LearningStore::snapshot`] and [`LearningStore::restore`] define the
//! contract with that persistence layer.
//!
//! `LearningStore` itself is not synchronized. Multi-threaded hosts use
//! [`SharedLearningStore`], which serializes every mutation behind one lock.

use crate::audit::{
    self, Dashboard, DedupReport, DomainCoverage, ProbationAudit, ProbationVerdict, PruneReport,
    PruneSummary,
};
use crate::config::LearningConfig;
use crate::error::{Error, Result};
use crate::ledger::BoundedHistory;
use crate::novelty::{
    self, NoveltyCheck, NoveltyLedger, NoveltyStats, NoveltyVerdict, QuotaDecision,
    QuotaGovernor,
};
use crate::substrate::{KnowledgeUnit, UnitRepository};
use crate::tracking::{
    CitationTracker, HelpfulnessRanking, HelpfulnessScorer, HitRate, QueryMethod,
    ResponseQuality, RetrievalTracker, RetrievalTrend, UtilizationStats,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Serializable state of a `LearningStore`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningState {
    pub retrieval: RetrievalTracker,
    pub citations: CitationTracker,
    pub helpfulness: HelpfulnessScorer,
    pub novelty: NoveltyLedger,
    pub quota: QuotaGovernor,
    pub prune_history: BoundedHistory<PruneSummary>,
    pub dedup_history: BoundedHistory<DedupReport>,
}

impl LearningState {
    fn new(config: &LearningConfig) -> Self {
        Self {
            retrieval: RetrievalTracker::new(config.retrieval.max_buckets),
            citations: CitationTracker::new(),
            helpfulness: HelpfulnessScorer::new(),
            novelty: NoveltyLedger::new(config.novelty.max_daily_buckets),
            quota: QuotaGovernor::new(),
            prune_history: BoundedHistory::new(config.pruning.max_history),
            dedup_history: BoundedHistory::new(config.novelty.max_history),
        }
    }

    fn apply_capacities(&mut self, config: &LearningConfig) {
        self.retrieval.set_capacity(config.retrieval.max_buckets);
        self.novelty.set_capacity(config.novelty.max_daily_buckets);
        self.prune_history.set_capacity(config.pruning.max_history);
        self.dedup_history.set_capacity(config.novelty.max_history);
    }
}

/// Aggregate root over all learning ledgers
#[derive(Debug, Clone)]
pub struct LearningStore {
    config: LearningConfig,
    state: LearningState,
}

impl Default for LearningStore {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}

impl LearningStore {
    /// Create a store with empty ledgers
    pub fn new(config: LearningConfig) -> Self {
        let state = LearningState::new(&config);
        Self { config, state }
    }

    /// Rebuild a store from persisted state, re-applying the configured
    /// capacities (oldest entries beyond them are dropped)
    pub fn restore(config: LearningConfig, mut state: LearningState) -> Self {
        state.apply_capacities(&config);
        Self { config, state }
    }

    /// Active configuration
    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Copy of the current state for persistence
    pub fn snapshot(&self) -> LearningState {
        self.state.clone()
    }

    /// Serialize the current state to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    /// Restore a store from a JSON snapshot
    pub fn from_json(config: LearningConfig, json: &str) -> Result<Self> {
        let state: LearningState = serde_json::from_str(json)
            .map_err(|e| Error::Snapshot(format!("invalid learning state: {}", e)))?;
        Ok(Self::restore(config, state))
    }

    // ---- retrieval ----

    /// Record how a query was satisfied at `now`
    pub fn record_query_method_at(&mut self, method: QueryMethod, now: DateTime<Utc>) {
        self.state.retrieval.record_at(method, now);
    }

    /// Record how a query was satisfied
    pub fn record_query_method(&mut self, method: QueryMethod) {
        self.record_query_method_at(method, Utc::now());
    }

    /// Record a query method given as a string; unknown methods are ignored.
    ///
    /// Returns whether anything was counted.
    pub fn record_query_method_str(&mut self, method: &str) -> bool {
        match method.parse::<QueryMethod>() {
            Ok(m) => {
                self.record_query_method(m);
                true
            }
            Err(e) => {
                tracing::debug!("Ignoring query method: {}", e);
                false
            }
        }
    }

    /// Hit rate over the trailing `hours` ending at `now`
    pub fn hit_rate_at(&self, hours: i64, now: DateTime<Utc>) -> HitRate {
        self.state.retrieval.hit_rate_at(hours, now)
    }

    /// Hit rate over the trailing `hours`
    pub fn hit_rate(&self, hours: i64) -> HitRate {
        self.hit_rate_at(hours, Utc::now())
    }

    /// Short-window vs long-window hit rate at `now`
    pub fn retrieval_trend_at(&self, now: DateTime<Utc>) -> RetrievalTrend {
        self.state.retrieval.trend_at(&self.config.retrieval, now)
    }

    /// Short-window vs long-window hit rate
    pub fn retrieval_trend(&self) -> RetrievalTrend {
        self.retrieval_trend_at(Utc::now())
    }

    // ---- citations and helpfulness ----

    /// Record a citation at `now`
    pub fn record_citation_at(&mut self, unit_id: &str, positive: bool, now: DateTime<Utc>) {
        self.state.citations.record_citation_at(unit_id, positive, now);
    }

    /// Record a citation
    pub fn record_citation(&mut self, unit_id: &str, positive: bool) {
        self.record_citation_at(unit_id, positive, Utc::now());
    }

    /// Add a negative signal to an already-cited unit.
    ///
    /// Units never cited are left without a record and false is returned.
    pub fn record_negative_signal(&mut self, unit_id: &str) -> bool {
        self.state.citations.record_negative_signal(unit_id)
    }

    /// Feed response feedback into the helpfulness scorer and cite every
    /// unit used, positively unless the user contradicted the response
    pub fn record_response_quality_at(&mut self, quality: &ResponseQuality, now: DateTime<Utc>) {
        self.state.helpfulness.record(quality);
        let positive = !quality.user_contradicted;
        for unit_id in &quality.units_used {
            self.state.citations.record_citation_at(unit_id, positive, now);
        }
    }

    /// Feed response feedback, now
    pub fn record_response_quality(&mut self, quality: &ResponseQuality) {
        self.record_response_quality_at(quality, Utc::now());
    }

    /// Citation ledger
    pub fn citations(&self) -> &CitationTracker {
        &self.state.citations
    }

    /// Helpfulness ledger
    pub fn helpfulness(&self) -> &HelpfulnessScorer {
        &self.state.helpfulness
    }

    /// Most and least helpful units
    pub fn helpfulness_scores(&self, limit: usize) -> HelpfulnessRanking {
        self.state.helpfulness.scores(limit)
    }

    /// Utilization of the public units over a `days` window at `now`
    pub fn utilization_stats_at(
        &self,
        units: &[KnowledgeUnit],
        days: i64,
        now: DateTime<Utc>,
    ) -> UtilizationStats {
        self.state
            .citations
            .utilization_stats_at(units, days, &self.config.utilization, now)
    }

    /// Utilization of the public units over a `days` window
    pub fn utilization_stats(&self, units: &[KnowledgeUnit], days: i64) -> UtilizationStats {
        self.utilization_stats_at(units, days, Utc::now())
    }

    // ---- novelty and quota ----

    /// Check a candidate against the public units of `corpus`
    pub fn check_novelty(
        &self,
        candidate: &KnowledgeUnit,
        corpus: &[KnowledgeUnit],
    ) -> NoveltyCheck {
        novelty::check_novelty(candidate, corpus, &self.config.novelty)
    }

    /// Tally a generation verdict at `now`
    pub fn record_generation_verdict_at(&mut self, verdict: NoveltyVerdict, now: DateTime<Utc>) {
        self.state.novelty.record_at(verdict, now);
    }

    /// Tally a generation verdict
    pub fn record_generation_verdict(&mut self, verdict: NoveltyVerdict) {
        self.record_generation_verdict_at(verdict, Utc::now());
    }

    /// Tally a verdict string at `now`; unknown verdicts are ignored
    pub fn record_generation_at(&mut self, verdict: &str, now: DateTime<Utc>) -> bool {
        self.state.novelty.record_str_at(verdict, now)
    }

    /// Tally a verdict string; unknown verdicts are ignored
    pub fn record_generation(&mut self, verdict: &str) -> bool {
        self.record_generation_at(verdict, Utc::now())
    }

    /// Novelty totals over the trailing `days` ending at `now`
    pub fn novelty_stats_at(&self, days: i64, now: DateTime<Utc>) -> NoveltyStats {
        self.state.novelty.stats_at(days, now)
    }

    /// Novelty totals over the trailing `days`
    pub fn novelty_stats(&self, days: i64) -> NoveltyStats {
        self.novelty_stats_at(days, Utc::now())
    }

    /// Whether one more generation fits at `now`. Does not count it.
    pub fn check_quota_at(&self, now: DateTime<Utc>) -> QuotaDecision {
        let rate = self.state.novelty.today_rate(now);
        self.state.quota.check_at(&self.config.quota, rate, now)
    }

    /// Whether one more generation fits. Does not count it.
    pub fn check_quota(&self) -> QuotaDecision {
        self.check_quota_at(Utc::now())
    }

    /// Count one generation at `now`
    pub fn record_used_at(&mut self, now: DateTime<Utc>) {
        self.state.quota.record_used_at(now);
    }

    /// Count one generation
    pub fn record_used(&mut self) {
        self.record_used_at(Utc::now());
    }

    /// Check the quota and count the generation if allowed, in one step
    pub fn try_consume_at(&mut self, now: DateTime<Utc>) -> QuotaDecision {
        let rate = self.state.novelty.today_rate(now);
        self.state.quota.try_consume_at(&self.config.quota, rate, now)
    }

    /// Check the quota and count the generation if allowed, in one step
    pub fn try_consume(&mut self) -> QuotaDecision {
        self.try_consume_at(Utc::now())
    }

    /// Share of work to spend evolving existing units at `now`
    pub fn recommended_evolution_ratio_at(&self, now: DateTime<Utc>) -> f64 {
        novelty::recommended_evolution_ratio(&self.config.quota, self.state.novelty.today_rate(now))
    }

    /// Share of work to spend evolving existing units
    pub fn recommended_evolution_ratio(&self) -> f64 {
        self.recommended_evolution_ratio_at(Utc::now())
    }

    // ---- audits ----

    /// Probation state of one unit at `now`
    pub fn probation_status_at(
        &self,
        unit: &KnowledgeUnit,
        now: DateTime<Utc>,
    ) -> ProbationVerdict {
        audit::evaluate(
            unit,
            &self.state.citations,
            &self.state.helpfulness,
            &self.config.probation,
            now,
        )
    }

    /// Probation state of one unit
    pub fn probation_status(&self, unit: &KnowledgeUnit) -> ProbationVerdict {
        self.probation_status_at(unit, Utc::now())
    }

    /// Evaluate every public unit at `now`
    pub fn run_probation_audit_at(
        &self,
        units: &[KnowledgeUnit],
        now: DateTime<Utc>,
    ) -> ProbationAudit {
        audit::run_probation_audit(
            units,
            &self.state.citations,
            &self.state.helpfulness,
            &self.config.probation,
            now,
        )
    }

    /// Evaluate every public unit
    pub fn run_probation_audit(&self, units: &[KnowledgeUnit]) -> ProbationAudit {
        self.run_probation_audit_at(units, Utc::now())
    }

    /// Reclassify stale, harmful and orphaned units in `repo` at `now` and
    /// record the run summary
    pub fn run_substrate_pruning_at<R: UnitRepository>(
        &mut self,
        repo: &mut R,
        now: DateTime<Utc>,
    ) -> Result<PruneReport> {
        let report = audit::run_substrate_pruning(
            repo,
            &self.state.citations,
            &self.state.helpfulness,
            &self.config.pruning,
            now,
        )?;
        self.state.prune_history.push(report.summary.clone());
        Ok(report)
    }

    /// Reclassify stale, harmful and orphaned units in `repo`
    pub fn run_substrate_pruning<R: UnitRepository>(
        &mut self,
        repo: &mut R,
    ) -> Result<PruneReport> {
        self.run_substrate_pruning_at(repo, Utc::now())
    }

    /// Past pruning summaries, oldest first
    pub fn prune_history(&self) -> &BoundedHistory<PruneSummary> {
        &self.state.prune_history
    }

    /// Duplicate-scan the units created in the last `hours` at `now`
    pub fn run_dedup_audit_at(
        &mut self,
        units: &[KnowledgeUnit],
        hours: i64,
        now: DateTime<Utc>,
    ) -> DedupReport {
        let report = audit::run_dedup_audit(
            units,
            &mut self.state.novelty,
            &self.config.novelty,
            hours,
            now,
        );
        self.state.dedup_history.push(report.clone());
        report
    }

    /// Duplicate-scan the units created in the last `hours`
    pub fn run_dedup_audit(&mut self, units: &[KnowledgeUnit], hours: i64) -> DedupReport {
        self.run_dedup_audit_at(units, hours, Utc::now())
    }

    /// Past dedup reports, oldest first
    pub fn dedup_history(&self) -> &BoundedHistory<DedupReport> {
        &self.state.dedup_history
    }

    /// Per-domain utilization of the public units
    pub fn domain_coverage(&self, units: &[KnowledgeUnit]) -> DomainCoverage {
        audit::domain_coverage(units, &self.state.citations, &self.config.coverage)
    }

    /// Headline numbers at `now`
    pub fn dashboard_at(&self, units: &[KnowledgeUnit], now: DateTime<Utc>) -> Dashboard {
        audit::build_dashboard(
            units,
            &self.state.retrieval,
            &self.state.novelty,
            &self.state.citations,
            &self.config,
            now,
        )
    }

    /// Headline numbers
    pub fn dashboard(&self, units: &[KnowledgeUnit]) -> Dashboard {
        self.dashboard_at(units, Utc::now())
    }
}

/// `LearningStore` behind one async lock, for concurrent hosts.
///
/// Every mutation takes the write lock for its full duration, so the
/// quota check and increment in `try_consume_generation` cannot interleave
/// with another caller's.
#[derive(Debug, Clone, Default)]
pub struct SharedLearningStore {
    inner: Arc<RwLock<LearningStore>>,
}

impl SharedLearningStore {
    /// Wrap a store
    pub fn new(store: LearningStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Copy of the active configuration
    pub async fn config(&self) -> LearningConfig {
        self.inner.read().await.config().clone()
    }

    /// Record how a query was satisfied
    pub async fn record_query_method(&self, method: QueryMethod) {
        self.inner.write().await.record_query_method(method);
    }

    /// Record a citation
    pub async fn record_citation(&self, unit_id: &str, positive: bool) {
        self.inner.write().await.record_citation(unit_id, positive);
    }

    /// Add a negative signal to an already-cited unit
    pub async fn record_negative_signal(&self, unit_id: &str) -> bool {
        self.inner.write().await.record_negative_signal(unit_id)
    }

    /// Feed response feedback
    pub async fn record_response_quality(&self, quality: &ResponseQuality) {
        self.inner.write().await.record_response_quality(quality);
    }

    /// Tally a verdict string; unknown verdicts are ignored
    pub async fn record_generation(&self, verdict: &str) -> bool {
        self.inner.write().await.record_generation(verdict)
    }

    /// Quota check without counting
    pub async fn check_quota(&self) -> QuotaDecision {
        self.inner.read().await.check_quota()
    }

    /// Atomic quota check and increment
    pub async fn try_consume_generation(&self) -> QuotaDecision {
        self.inner.write().await.try_consume()
    }

    /// Atomic quota check and increment at `now`
    pub async fn try_consume_generation_at(&self, now: DateTime<Utc>) -> QuotaDecision {
        self.inner.write().await.try_consume_at(now)
    }

    /// Evaluate every public unit
    pub async fn run_probation_audit(&self, units: &[KnowledgeUnit]) -> ProbationAudit {
        self.inner.read().await.run_probation_audit(units)
    }

    /// Reclassify stale, harmful and orphaned units in `repo`
    pub async fn run_substrate_pruning<R: UnitRepository>(
        &self,
        repo: &mut R,
    ) -> Result<PruneReport> {
        self.inner.write().await.run_substrate_pruning(repo)
    }

    /// Duplicate-scan the units created in the last `hours`
    pub async fn run_dedup_audit(&self, units: &[KnowledgeUnit], hours: i64) -> DedupReport {
        self.inner.write().await.run_dedup_audit(units, hours)
    }

    /// Per-domain utilization of the public units
    pub async fn domain_coverage(&self, units: &[KnowledgeUnit]) -> DomainCoverage {
        self.inner.read().await.domain_coverage(units)
    }

    /// Headline numbers
    pub async fn dashboard(&self, units: &[KnowledgeUnit]) -> Dashboard {
        self.inner.read().await.dashboard(units)
    }

    /// Copy of the current state for persistence
    pub async fn snapshot(&self) -> LearningState {
        self.inner.read().await.snapshot()
    }

    /// Serialize the current state to JSON
    pub async fn to_json(&self) -> Result<String> {
        self.inner.read().await.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::novelty::QuotaDenial;
    use crate::substrate::{Classification, InMemoryUnitRepository, UnitBuilder};
    use chrono::{TimeDelta, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_low_novelty_shrinks_hourly_quota() {
        let mut store = LearningStore::default();
        let now = noon();
        for _ in 0..9 {
            assert!(store.record_generation_at("redundant", now));
        }
        assert!(store.record_generation_at("novel", now));

        let decision = store.check_quota_at(now);
        assert!(decision.allowed);
        assert_eq!(decision.novelty_rate, 0.1);
        assert_eq!(decision.hourly.limit, 5);
        assert_eq!(decision.daily.limit, 50);
    }

    #[test]
    fn test_unknown_generation_verdict_ignored() {
        let mut store = LearningStore::default();
        assert!(!store.record_generation_at("maybe", noon()));
        assert_eq!(store.novelty_stats_at(7, noon()).generated, 0);
        assert_eq!(store.check_quota_at(noon()).novelty_rate, 1.0);
    }

    #[test]
    fn test_try_consume_stops_at_limit() {
        let mut store = LearningStore::default();
        let now = noon();
        for _ in 0..10 {
            store.record_generation_verdict_at(NoveltyVerdict::Redundant, now);
        }
        let admitted = (0..20).filter(|_| store.try_consume_at(now).allowed).count();
        assert_eq!(admitted, 5);

        let denied = store.try_consume_at(now);
        assert_eq!(denied.reason, Some(QuotaDenial::HourlyLimitReached));
        assert_eq!(denied.hourly.used, 5);
    }

    #[test]
    fn test_response_quality_cites_units() {
        let mut store = LearningStore::default();
        store.record_response_quality_at(
            &ResponseQuality {
                units_used: vec!["a".to_string(), "b".to_string()],
                user_continued: true,
                ..Default::default()
            },
            noon(),
        );
        store.record_response_quality_at(
            &ResponseQuality {
                units_used: vec!["a".to_string()],
                user_contradicted: true,
                ..Default::default()
            },
            noon(),
        );

        let a = store.citations().get("a").unwrap();
        assert_eq!(a.count, 2);
        assert_eq!(a.positive_signals, 1);
        assert_eq!(a.negative_signals, 1);
        assert_eq!(store.helpfulness().get("a").unwrap().times_used, 2);
        assert_eq!(store.helpfulness().get("b").unwrap().score, 1.0);
    }

    #[test]
    fn test_negative_signal_requires_citation() {
        let mut store = LearningStore::default();
        assert!(!store.record_negative_signal("ghost"));
        assert!(store.citations().get("ghost").is_none());

        store.record_citation("real", true);
        assert!(store.record_negative_signal("real"));
        assert_eq!(store.citations().get("real").unwrap().negative_signals, 1);
    }

    #[test]
    fn test_query_method_strings() {
        let mut store = LearningStore::default();
        assert!(store.record_query_method_str("cache"));
        assert!(store.record_query_method_str("generation"));
        assert!(!store.record_query_method_str("telepathy"));

        let rate = store.hit_rate(24);
        assert_eq!(rate.total, 2);
        assert_eq!(rate.hit_rate, 0.5);
    }

    #[test]
    fn test_extreme_windows_saturate() {
        let mut store = LearningStore::default();
        store.record_query_method(QueryMethod::Cache);
        store.record_generation_verdict(NoveltyVerdict::Novel);

        assert_eq!(store.hit_rate(i64::MAX).total, 1);
        assert_eq!(store.hit_rate(i64::MIN).total, 0);
        assert_eq!(store.novelty_stats(i64::MAX).generated, 1);
        assert_eq!(store.utilization_stats(&[], i64::MAX).public_units, 0);
        assert_eq!(store.run_dedup_audit(&[], 10_000_000_000_000).checked, 0);
    }

    #[test]
    fn test_end_to_end_utilization() {
        let mut store = LearningStore::default();
        let units: Vec<KnowledgeUnit> = (0..5)
            .map(|i| UnitBuilder::new(format!("u{}", i)).build())
            .collect();
        store.record_citation("u1", true);
        store.record_citation("u4", true);

        let stats = store.utilization_stats(&units, 7);
        assert_eq!(stats.utilization_rate, 0.4);
        assert_eq!(store.dashboard(&units).utilization.utilization_rate, 0.4);
    }

    #[test]
    fn test_end_to_end_domain_coverage() {
        let store = LearningStore::default();
        let units = vec![
            UnitBuilder::new("m1").tag("math").build(),
            UnitBuilder::new("m2").tag("math").build(),
            UnitBuilder::new("m3").tag("math").build(),
            UnitBuilder::new("s1").tag("science").build(),
            UnitBuilder::new("s2").tag("science").build(),
        ];
        let coverage = store.domain_coverage(&units);
        assert_eq!(coverage.domains["math"].units, 3);
        assert_eq!(coverage.domains["science"].units, 2);
        assert_eq!(coverage.domains["math"].utilization, 0.0);
        assert_eq!(coverage.domains["science"].utilization, 0.0);
    }

    #[test]
    fn test_pruning_records_history() {
        let config = LearningConfig {
            pruning: crate::config::PruningConfig {
                max_history: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut store = LearningStore::new(config);
        let now = noon();
        let mut repo = InMemoryUnitRepository::new(vec![
            UnitBuilder::new("stale").created_at(now - TimeDelta::days(70)).build(),
            UnitBuilder::new("fresh").created_at(now).build(),
        ]);

        let report = store.run_substrate_pruning_at(&mut repo, now).unwrap();
        assert_eq!(report.summary.scaffolded, 1);
        assert_eq!(repo.len(), 2);
        assert_eq!(
            repo.get("stale").unwrap().classification,
            Some(Classification::Scaffold)
        );

        store.run_substrate_pruning_at(&mut repo, now).unwrap();
        store.run_substrate_pruning_at(&mut repo, now).unwrap();
        assert_eq!(store.prune_history().len(), 2);
        assert_eq!(store.prune_history().latest().unwrap().total_pruned, 0);
    }

    #[test]
    fn test_dedup_feeds_novelty_ledger() {
        let mut store = LearningStore::default();
        let now = noon();
        let text = "borrow checker enforces aliasing rules at compile time";
        let units = vec![
            UnitBuilder::new("a").summary(text).created_at(now - TimeDelta::hours(1)).build(),
            UnitBuilder::new("b").summary(text).created_at(now - TimeDelta::hours(2)).build(),
        ];
        let report = store.run_dedup_audit_at(&units, 24, now);
        assert_eq!(report.redundant, 2);
        assert_eq!(store.novelty_stats_at(1, now).redundant, 2);
        assert_eq!(store.dedup_history().len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut store = LearningStore::default();
        let now = noon();
        store.record_query_method_at(QueryMethod::Retrieval, now);
        store.record_citation_at("u1", true, now);
        store.record_generation_verdict_at(NoveltyVerdict::Novel, now);
        store.record_used_at(now);

        let json = store.to_json().unwrap();
        let restored = LearningStore::from_json(LearningConfig::default(), &json).unwrap();

        assert_eq!(restored.citations().citation_count("u1"), 1);
        assert_eq!(restored.hit_rate_at(1, now).total, 1);
        assert_eq!(restored.novelty_stats_at(1, now).novel, 1);
        assert_eq!(restored.check_quota_at(now).hourly.used, 1);
    }

    #[test]
    fn test_restore_applies_capacities() {
        let mut store = LearningStore::default();
        let start = noon();
        for d in 0..10 {
            store.record_generation_verdict_at(NoveltyVerdict::Novel, start + TimeDelta::days(d));
        }
        let config = LearningConfig {
            novelty: crate::config::NoveltyConfig {
                max_daily_buckets: 3,
                ..Default::default()
            },
            ..Default::default()
        };
        let restored = LearningStore::restore(config, store.snapshot());
        assert_eq!(restored.snapshot().novelty.len(), 3);
    }

    #[test]
    fn test_invalid_snapshot() {
        let err = LearningStore::from_json(LearningConfig::default(), "{not json").unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_shared_store_try_consume_is_atomic() {
        let config = LearningConfig {
            quota: crate::config::QuotaConfig {
                base_hourly_limit: 8,
                base_daily_limit: 1000,
                ..Default::default()
            },
            ..Default::default()
        };
        let shared = SharedLearningStore::new(LearningStore::new(config));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = shared.clone();
            handles.push(tokio::spawn(async move {
                store.try_consume_generation_at(noon()).await.allowed
            }));
        }
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 8);
        assert_eq!(shared.snapshot().await.quota.counters().hour_count, 8);
    }

    #[tokio::test]
    async fn test_shared_store_records() {
        let shared = SharedLearningStore::default();
        shared.record_query_method(QueryMethod::Cache).await;
        shared.record_citation("u1", true).await;
        assert!(shared.record_negative_signal("u1").await);
        assert!(shared.record_generation("novel").await);
        shared
            .record_response_quality(&ResponseQuality {
                units_used: vec!["u2".to_string()],
                user_asked_followup: true,
                ..Default::default()
            })
            .await;

        let state = shared.snapshot().await;
        assert_eq!(state.citations.citation_count("u1"), 1);
        assert_eq!(state.citations.citation_count("u2"), 1);
        assert_eq!(state.helpfulness.len(), 1);
        assert!(shared.check_quota().await.allowed);
        assert!(shared.to_json().await.unwrap().contains("\"citations\""));
    }
}
