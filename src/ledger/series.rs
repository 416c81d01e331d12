//! Keyed, capacity-bounded time series and run history
//!
//! `TimeSeries` replaces ad-hoc "truncated ISO string" bucket rotation with
//! an explicit type: each bucket carries its calendar key and start instant,
//! buckets stay ordered by start, and the oldest buckets are evicted in the
//! same call once capacity is exceeded.
//!
//! `BoundedHistory` is the same FIFO discipline for run summaries.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Calendar granularity of a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One bucket per UTC hour, keyed `YYYY-MM-DDTHH`
    Hour,
    /// One bucket per UTC day, keyed `YYYY-MM-DD`
    Day,
}

impl Granularity {
    /// Calendar key for `at`
    pub fn key(self, at: DateTime<Utc>) -> String {
        match self {
            Granularity::Hour => at.format("%Y-%m-%dT%H").to_string(),
            Granularity::Day => at.format("%Y-%m-%d").to_string(),
        }
    }

    /// Start of the calendar period containing `at`
    pub fn start(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let span = match self {
            Granularity::Hour => TimeDelta::hours(1),
            Granularity::Day => TimeDelta::days(1),
        };
        at.duration_trunc(span).unwrap_or(at)
    }

    /// `now` moved back by `periods` hours or days.
    ///
    /// Windows too large for chrono saturate at the representable range.
    pub fn window_start(self, now: DateTime<Utc>, periods: i64) -> DateTime<Utc> {
        let span = match self {
            Granularity::Hour => TimeDelta::try_hours(periods),
            Granularity::Day => TimeDelta::try_days(periods),
        };
        match span.and_then(|d| now.checked_sub_signed(d)) {
            Some(start) => start,
            None if periods < 0 => DateTime::<Utc>::MAX_UTC,
            None => DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// A single bucket of a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket<B> {
    /// Calendar key
    pub key: String,
    /// Start of the bucket's period
    pub start: DateTime<Utc>,
    /// Bucket payload
    pub data: B,
}

/// Capacity-bounded series of calendar buckets, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries<B> {
    granularity: Granularity,
    capacity: usize,
    buckets: VecDeque<Bucket<B>>,
}

impl<B: Default> TimeSeries<B> {
    /// Create an empty series
    pub fn new(granularity: Granularity, capacity: usize) -> Self {
        Self {
            granularity,
            capacity: capacity.max(1),
            buckets: VecDeque::with_capacity(capacity.clamp(1, 1024)),
        }
    }

    /// Bucket for the period containing `at`, created on first use.
    ///
    /// New buckets are inserted in start order and the oldest ones beyond
    /// capacity are evicted before returning. A full series does not take a
    /// bucket older than everything it holds; `None` is returned instead.
    pub fn bucket_mut(&mut self, at: DateTime<Utc>) -> Option<&mut B> {
        let key = self.granularity.key(at);
        if let Some(pos) = self.buckets.iter().rposition(|b| b.key == key) {
            return self.buckets.get_mut(pos).map(|b| &mut b.data);
        }

        let start = self.granularity.start(at);
        let pos = self.buckets.partition_point(|b| b.start < start);
        if pos == 0 && self.buckets.len() >= self.capacity {
            tracing::debug!("Dropped {:?} bucket {} older than the series", self.granularity, key);
            return None;
        }

        self.buckets.insert(
            pos,
            Bucket {
                key,
                start,
                data: B::default(),
            },
        );
        let evicted = self.evict_overflow();
        if evicted > 0 {
            tracing::debug!("Evicted {} {:?} buckets", evicted, self.granularity);
        }
        pos.checked_sub(evicted)
            .and_then(|p| self.buckets.get_mut(p))
            .map(|b| &mut b.data)
    }

    /// Bucket for the period containing `at`, if one exists
    pub fn bucket(&self, at: DateTime<Utc>) -> Option<&B> {
        let key = self.granularity.key(at);
        self.buckets.iter().rev().find(|b| b.key == key).map(|b| &b.data)
    }

    /// Buckets whose period starts at or after `cutoff`
    pub fn since(&self, cutoff: DateTime<Utc>) -> impl Iterator<Item = &B> {
        self.buckets
            .iter()
            .filter(move |b| b.start >= cutoff)
            .map(|b| &b.data)
    }

    /// All buckets, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Bucket<B>> {
        self.buckets.iter()
    }

    /// Number of buckets held
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Maximum number of buckets
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest buckets if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict_overflow();
    }

    fn evict_overflow(&mut self) -> usize {
        let mut evicted = 0;
        while self.buckets.len() > self.capacity {
            self.buckets.pop_front();
            evicted += 1;
        }
        evicted
    }
}

/// FIFO history of run summaries with a fixed capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedHistory<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Append an entry, dropping the oldest when full
    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Change the capacity, dropping the oldest entries if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + TimeDelta::hours(h as i64)
    }

    #[test]
    fn test_keys_and_starts() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 13, 45, 12).unwrap();
        assert_eq!(Granularity::Hour.key(t), "2026-03-01T13");
        assert_eq!(Granularity::Day.key(t), "2026-03-01");
        assert_eq!(
            Granularity::Hour.start(t),
            Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap()
        );
        assert_eq!(
            Granularity::Day.start(t),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_same_key_reuses_bucket() {
        let mut series: TimeSeries<u32> = TimeSeries::new(Granularity::Hour, 10);
        *series.bucket_mut(at(1)).unwrap() += 1;
        *series.bucket_mut(at(1) + TimeDelta::minutes(30)).unwrap() += 1;
        assert_eq!(series.len(), 1);
        assert_eq!(series.bucket(at(1)), Some(&2));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut series: TimeSeries<u32> = TimeSeries::new(Granularity::Hour, 3);
        for h in 0..5 {
            *series.bucket_mut(at(h)).unwrap() += h;
        }
        assert_eq!(series.len(), 3);
        assert!(series.bucket(at(0)).is_none());
        assert!(series.bucket(at(1)).is_none());
        assert_eq!(series.bucket(at(4)), Some(&4));
        assert_eq!(series.iter().next().unwrap().key, "2026-03-01T02");
    }

    #[test]
    fn test_backdated_bucket_keeps_order() {
        let mut series: TimeSeries<u32> = TimeSeries::new(Granularity::Hour, 4);
        for h in [5, 7, 6] {
            *series.bucket_mut(at(h)).unwrap() += 1;
        }
        *series.bucket_mut(at(1)).unwrap() += 1;
        let keys: Vec<_> = series.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["2026-03-01T01", "2026-03-01T05", "2026-03-01T06", "2026-03-01T07"]
        );
    }

    #[test]
    fn test_full_series_drops_older_bucket() {
        let mut series: TimeSeries<u32> = TimeSeries::new(Granularity::Hour, 3);
        for h in [5, 7, 8] {
            *series.bucket_mut(at(h)).unwrap() += 1;
        }
        assert!(series.bucket_mut(at(1)).is_none());
        let keys: Vec<_> = series.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2026-03-01T05", "2026-03-01T07", "2026-03-01T08"]);

        // Backdated but newer than the oldest: the oldest goes
        *series.bucket_mut(at(6)).unwrap() += 10;
        let keys: Vec<_> = series.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2026-03-01T06", "2026-03-01T07", "2026-03-01T08"]);
        assert_eq!(series.bucket(at(6)), Some(&10));
    }

    #[test]
    fn test_window_start_saturates() {
        let now = at(12);
        assert_eq!(Granularity::Hour.window_start(now, 2), at(10));
        assert_eq!(Granularity::Day.window_start(now, 0), now);
        assert_eq!(Granularity::Hour.window_start(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(Granularity::Day.window_start(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(Granularity::Day.window_start(now, i64::MIN), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_since_window() {
        let mut series: TimeSeries<u32> = TimeSeries::new(Granularity::Hour, 10);
        for h in 0..6 {
            *series.bucket_mut(at(h)).unwrap() += 1;
        }
        let recent: u32 = series.since(at(3)).sum();
        assert_eq!(recent, 3);
    }

    #[test]
    fn test_shrink_capacity() {
        let mut series: TimeSeries<u32> = TimeSeries::new(Granularity::Day, 10);
        for d in 0..4 {
            series.bucket_mut(at(d * 24));
        }
        series.set_capacity(2);
        assert_eq!(series.len(), 2);
        assert_eq!(series.capacity(), 2);
    }

    #[test]
    fn test_bounded_history() {
        let mut history = BoundedHistory::new(2);
        history.push("a");
        history.push("b");
        history.push("c");
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(history.latest(), Some(&"c"));
    }

    #[test]
    fn test_series_serde_roundtrip() {
        let mut series: TimeSeries<u32> = TimeSeries::new(Granularity::Hour, 5);
        *series.bucket_mut(at(2)).unwrap() = 7;
        let json = serde_json::to_string(&series).unwrap();
        let restored: TimeSeries<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.bucket(at(2)), Some(&7));
        assert_eq!(restored.capacity(), 5);
    }
}
