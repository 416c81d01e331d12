//! Generation quota governor
//!
//! Limits how many new units may be generated per hour and per day. The
//! effective limits shrink as the day's novelty rate falls:
//!
//! | novelty rate | share of base limit |
//! |--------------|---------------------|
//! | < 0.30       | 25%                 |
//! | < 0.40       | 50%                 |
//! | < 0.70       | 75%                 |
//! | ≥ 0.70       | 100%                |
//!
//! `check` and `record_used` are separate for callers that generate between
//! the two; `try_consume` does both in one step and is what concurrent
//! callers must use.

use crate::config::QuotaConfig;
use crate::ledger::Granularity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Novelty band that selects the quota multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyBand {
    /// rate < 0.30
    Critical,
    /// 0.30 ≤ rate < 0.40
    Low,
    /// 0.40 ≤ rate < 0.70
    Moderate,
    /// rate ≥ 0.70
    Healthy,
}

impl NoveltyBand {
    /// Band for a novelty rate
    pub fn for_rate(rate: f64) -> Self {
        if rate < 0.30 {
            NoveltyBand::Critical
        } else if rate < 0.40 {
            NoveltyBand::Low
        } else if rate >= 0.70 {
            NoveltyBand::Healthy
        } else {
            NoveltyBand::Moderate
        }
    }

    /// Share of the base limit allowed in this band
    pub fn multiplier(self) -> f64 {
        match self {
            NoveltyBand::Critical => 0.25,
            NoveltyBand::Low => 0.5,
            NoveltyBand::Moderate => 0.75,
            NoveltyBand::Healthy => 1.0,
        }
    }
}

/// Effective limit for a base limit at a novelty rate, rounded up
pub fn effective_limit(base: u32, novelty_rate: f64) -> u32 {
    let scaled = base as f64 * NoveltyBand::for_rate(novelty_rate).multiplier();
    scaled.ceil() as u32
}

/// Which limit denied a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaDenial {
    HourlyLimitReached,
    DailyLimitReached,
}

/// Used/limit pair for one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: u32,
    pub limit: u32,
}

/// Result of a quota check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub reason: Option<QuotaDenial>,
    pub novelty_rate: f64,
    pub band: NoveltyBand,
    pub hourly: QuotaUsage,
    pub daily: QuotaUsage,
}

/// Hour and day generation counters keyed by calendar period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationCounters {
    pub hour_key: String,
    pub hour_count: u32,
    pub day_key: String,
    pub day_count: u32,
}

impl GenerationCounters {
    /// Generations so far in the hour containing `now`
    pub fn hourly_used(&self, now: DateTime<Utc>) -> u32 {
        if self.hour_key == Granularity::Hour.key(now) {
            self.hour_count
        } else {
            0
        }
    }

    /// Generations so far in the day containing `now`
    pub fn daily_used(&self, now: DateTime<Utc>) -> u32 {
        if self.day_key == Granularity::Day.key(now) {
            self.day_count
        } else {
            0
        }
    }

    fn roll(&mut self, now: DateTime<Utc>) {
        let hour_key = Granularity::Hour.key(now);
        if self.hour_key != hour_key {
            self.hour_key = hour_key;
            self.hour_count = 0;
        }
        let day_key = Granularity::Day.key(now);
        if self.day_key != day_key {
            self.day_key = day_key;
            self.day_count = 0;
        }
    }
}

/// Rate limiter whose limits follow the current novelty rate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotaGovernor {
    counters: GenerationCounters,
}

impl QuotaGovernor {
    /// Create a governor with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether one more generation fits at `now`
    pub fn check_at(
        &self,
        config: &QuotaConfig,
        novelty_rate: f64,
        now: DateTime<Utc>,
    ) -> QuotaDecision {
        let hourly = QuotaUsage {
            used: self.counters.hourly_used(now),
            limit: effective_limit(config.base_hourly_limit, novelty_rate),
        };
        let daily = QuotaUsage {
            used: self.counters.daily_used(now),
            limit: effective_limit(config.base_daily_limit, novelty_rate),
        };

        let reason = if hourly.used >= hourly.limit {
            Some(QuotaDenial::HourlyLimitReached)
        } else if daily.used >= daily.limit {
            Some(QuotaDenial::DailyLimitReached)
        } else {
            None
        };

        QuotaDecision {
            allowed: reason.is_none(),
            reason,
            novelty_rate,
            band: NoveltyBand::for_rate(novelty_rate),
            hourly,
            daily,
        }
    }

    /// Count one generation at `now`
    pub fn record_used_at(&mut self, now: DateTime<Utc>) {
        self.counters.roll(now);
        self.counters.hour_count += 1;
        self.counters.day_count += 1;
    }

    /// Check and, when allowed, count one generation
    pub fn try_consume_at(
        &mut self,
        config: &QuotaConfig,
        novelty_rate: f64,
        now: DateTime<Utc>,
    ) -> QuotaDecision {
        let mut decision = self.check_at(config, novelty_rate, now);
        if decision.allowed {
            self.record_used_at(now);
            decision.hourly.used += 1;
            decision.daily.used += 1;
        } else {
            tracing::debug!(
                "Generation denied: {:?} (novelty={:.3})",
                decision.reason,
                novelty_rate
            );
        }
        decision
    }

    /// Current counters
    pub fn counters(&self) -> &GenerationCounters {
        &self.counters
    }
}

/// Share of work cycles to spend evolving existing units rather than
/// generating new ones. Rises as novelty falls.
pub fn recommended_evolution_ratio(config: &QuotaConfig, novelty_rate: f64) -> f64 {
    let base = config.baseline_evolution_ratio;
    if novelty_rate < 0.30 {
        (base * 2.0).min(0.6)
    } else if novelty_rate < 0.40 {
        (base * 1.5).min(0.5)
    } else {
        base.max(config.min_evolution_ratio)
    }
}
