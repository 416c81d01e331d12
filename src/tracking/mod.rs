//! Usage tracking: how queries are satisfied and which units earn their keep
//!
//! - [`retrieval`]: hourly cache/retrieval/generation counters
//! - [`citation`]: per-unit citation ledger and utilization statistics
//! - [`helpfulness`]: per-unit score from response-quality feedback

pub mod citation;
pub mod helpfulness;
pub mod retrieval;

pub use citation::{CitationDistribution, CitationRecord, CitationTracker, UtilizationStats};
pub use helpfulness::{
    HelpfulnessRanking, HelpfulnessRecord, HelpfulnessScorer, ResponseQuality, ScoredUnit,
};
pub use retrieval::{
    HitRate, MethodBreakdown, QueryMethod, RetrievalBucket, RetrievalTracker, RetrievalTrend,
    TrendDirection,
};
