//! Batch audits over the unit corpus
//!
//! - [`probation`]: promotion/demotion gate for new units
//! - [`pruner`]: reclassification of stale, harmful and orphaned units
//! - [`dedup`]: duplicate scan of recently created units
//! - [`coverage`]: per-domain utilization and concentration
//! - [`dashboard`]: headline numbers composed from the trackers
//!
//! Audits read the trackers and the unit slice; only the pruner writes,
//! and only through the [`UnitRepository`](crate::substrate::UnitRepository)
//! seam.

pub mod coverage;
pub mod dashboard;
pub mod dedup;
pub mod probation;
pub mod pruner;

pub use coverage::{domain_coverage, DomainCoverage, DomainStats};
pub use dashboard::{build_dashboard, Dashboard, DASHBOARD_WINDOW_DAYS, EXTERNAL_METRICS};
pub use dedup::{run_dedup_audit, DedupReport, RedundantUnit};
pub use probation::{
    evaluate, run_probation_audit, DemotionCandidate, ProbationAudit, ProbationReason,
    ProbationState, ProbationVerdict,
};
pub use pruner::{plan_pruning, run_substrate_pruning, PruneReport, PruneSummary};
