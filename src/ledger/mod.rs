//! Ledger primitives shared by the trackers
//!
//! Calendar-keyed bounded time series (hourly retrieval buckets, daily
//! novelty buckets) and bounded run histories.

pub mod series;

pub use series::{BoundedHistory, Bucket, Granularity, TimeSeries};

/// Round a rate to three decimals
pub fn round_rate(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
