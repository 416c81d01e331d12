//! Retrieval hit-rate tracker
//!
//! Counts, per UTC hour, how each query was satisfied: from cache, by
//! retrieving stored units, or only by full generation. The hit rate is
//! the share of queries that did not need generation.

use crate::config::RetrievalConfig;
use crate::ledger::{round_rate, Granularity, TimeSeries};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a query was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMethod {
    /// Answered from a response cache
    Cache,
    /// Answered from retrieved units
    Retrieval,
    /// Required full generation
    Generation,
}

impl FromStr for QueryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache" => Ok(QueryMethod::Cache),
            "retrieval" => Ok(QueryMethod::Retrieval),
            "generation" => Ok(QueryMethod::Generation),
            other => Err(format!("unknown query method '{}'", other)),
        }
    }
}

/// Query counts for one hour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalBucket {
    pub cache: u64,
    pub retrieval: u64,
    pub generation: u64,
    pub total: u64,
}

/// Fraction of queries per method
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MethodBreakdown {
    pub cache: f64,
    pub retrieval: f64,
    pub generation: f64,
}

/// Hit rate over a trailing window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitRate {
    /// Window length in hours
    pub hours: i64,
    /// Queries in the window
    pub total: u64,
    /// (cache + retrieval) / total, rounded to 3 decimals
    pub hit_rate: f64,
    /// Per-method fractions
    pub breakdown: MethodBreakdown,
}

/// Direction of the hit rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Short-window hit rate compared with the long window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalTrend {
    pub short: HitRate,
    pub long: HitRate,
    pub direction: TrendDirection,
}

/// Hourly rolling counters of query satisfaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTracker {
    buckets: TimeSeries<RetrievalBucket>,
}

impl RetrievalTracker {
    /// Create a tracker keeping at most `max_buckets` hours
    pub fn new(max_buckets: usize) -> Self {
        Self {
            buckets: TimeSeries::new(Granularity::Hour, max_buckets),
        }
    }

    /// Record how a query was satisfied, now
    pub fn record(&mut self, method: QueryMethod) {
        self.record_at(method, Utc::now());
    }

    /// Record how a query was satisfied at `now`
    pub fn record_at(&mut self, method: QueryMethod, now: DateTime<Utc>) {
        let Some(bucket) = self.buckets.bucket_mut(now) else {
            return;
        };
        match method {
            QueryMethod::Cache => bucket.cache += 1,
            QueryMethod::Retrieval => bucket.retrieval += 1,
            QueryMethod::Generation => bucket.generation += 1,
        }
        bucket.total += 1;
    }

    /// Hit rate over the trailing `hours` ending at `now`
    pub fn hit_rate_at(&self, hours: i64, now: DateTime<Utc>) -> HitRate {
        let cutoff = Granularity::Hour.window_start(now, hours);
        let sum = self
            .buckets
            .since(cutoff)
            .fold(RetrievalBucket::default(), |mut acc, b| {
                acc.cache += b.cache;
                acc.retrieval += b.retrieval;
                acc.generation += b.generation;
                acc.total += b.total;
                acc
            });

        let fraction = |n: u64| {
            if sum.total == 0 {
                0.0
            } else {
                round_rate(n as f64 / sum.total as f64)
            }
        };

        HitRate {
            hours,
            total: sum.total,
            hit_rate: fraction(sum.cache + sum.retrieval),
            breakdown: MethodBreakdown {
                cache: fraction(sum.cache),
                retrieval: fraction(sum.retrieval),
                generation: fraction(sum.generation),
            },
        }
    }

    /// Compare the short-window hit rate against the long window
    pub fn trend_at(&self, config: &RetrievalConfig, now: DateTime<Utc>) -> RetrievalTrend {
        let short = self.hit_rate_at(config.short_window_hours, now);
        let long = self.hit_rate_at(config.long_window_hours, now);

        let direction = if short.hit_rate > long.hit_rate + config.trend_epsilon {
            TrendDirection::Increasing
        } else if short.hit_rate < long.hit_rate - config.trend_epsilon {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };

        RetrievalTrend {
            short,
            long,
            direction,
        }
    }

    /// Change the bucket capacity
    pub fn set_capacity(&mut self, max_buckets: usize) {
        self.buckets.set_capacity(max_buckets);
    }

    /// Underlying hourly buckets
    pub fn buckets(&self) -> &TimeSeries<RetrievalBucket> {
        &self.buckets
    }
}
