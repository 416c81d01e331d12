//! Learnguard configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main learnguard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Retrieval hit-rate tracking
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Novelty verification
    #[serde(default)]
    pub novelty: NoveltyConfig,

    /// Generation quota governor
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Probation gate
    #[serde(default)]
    pub probation: ProbationConfig,

    /// Substrate pruning
    #[serde(default)]
    pub pruning: PruningConfig,

    /// Domain coverage thresholds
    #[serde(default)]
    pub coverage: CoverageConfig,

    /// Utilization reporting
    #[serde(default)]
    pub utilization: UtilizationConfig,
}

impl LearningConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (`~/.config/learnguard/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join("learnguard").join("config.toml"))
    }

    /// Reject values that would make the ledgers or gates meaningless
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.max_buckets == 0 {
            return Err(Error::Config("retrieval.max_buckets must be > 0".to_string()));
        }
        if self.novelty.max_daily_buckets == 0 {
            return Err(Error::Config(
                "novelty.max_daily_buckets must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.novelty.similarity_threshold) {
            return Err(Error::Config(format!(
                "novelty.similarity_threshold must be within [0, 1], got {}",
                self.novelty.similarity_threshold
            )));
        }
        if self.pruning.max_history == 0 {
            return Err(Error::Config("pruning.max_history must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Retrieval hit-rate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Hourly buckets kept (720 = 30 days)
    pub max_buckets: usize,

    /// Minimum rate difference before a trend is reported
    pub trend_epsilon: f64,

    /// Short trend window in hours
    pub short_window_hours: i64,

    /// Long trend window in hours
    pub long_window_hours: i64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_buckets: 720,
            trend_epsilon: 0.02,
            short_window_hours: 24,
            long_window_hours: 24 * 7,
        }
    }
}

/// Novelty verifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoveltyConfig {
    /// Jaccard similarity at or above which a candidate is a duplicate
    pub similarity_threshold: f64,

    /// Candidates with fewer tokens are trivial
    pub min_tokens: usize,

    /// Daily novelty buckets kept
    pub max_daily_buckets: usize,

    /// Redundant units listed in a dedup audit report
    pub max_redundant_reported: usize,

    /// Dedup run summaries kept
    pub max_history: usize,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            min_tokens: 3,
            max_daily_buckets: 90,
            max_redundant_reported: 20,
            max_history: 30,
        }
    }
}

/// Generation quota configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Hourly generation limit at full novelty
    pub base_hourly_limit: u32,

    /// Daily generation limit at full novelty
    pub base_daily_limit: u32,

    /// Share of work cycles spent evolving existing units
    pub baseline_evolution_ratio: f64,

    /// Floor for the evolution ratio
    pub min_evolution_ratio: f64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            base_hourly_limit: 20,
            base_daily_limit: 200,
            baseline_evolution_ratio: 0.3,
            min_evolution_ratio: 0.2,
        }
    }
}

/// Probation gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbationConfig {
    /// Grace period after creation
    pub window_days: i64,
}

impl Default for ProbationConfig {
    fn default() -> Self {
        Self { window_days: 7 }
    }
}

/// Substrate pruning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PruningConfig {
    /// Uncited public units older than this become scaffold
    pub scaffold_after_days: i64,

    /// Repair units older than this are archived as deprecated
    pub archive_repair_after_days: i64,

    /// Minimum uses before a unit can be judged harmful
    pub harmful_min_uses: u64,

    /// Negative signals must exceed positive signals times this factor
    pub harmful_negative_ratio: f64,

    /// Prune run summaries kept
    pub max_history: usize,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            scaffold_after_days: 60,
            archive_repair_after_days: 90,
            harmful_min_uses: 5,
            harmful_negative_ratio: 2.0,
            max_history: 30,
        }
    }
}

/// Domain coverage thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Domains below this size can be starving
    pub starving_max_units: usize,

    /// Utilization above which a small domain is starving
    pub starving_min_utilization: f64,

    /// Domains above this size can be saturated
    pub saturated_min_units: usize,

    /// Utilization below which a large domain is saturated
    pub saturated_max_utilization: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            starving_max_units: 50,
            starving_min_utilization: 0.4,
            saturated_min_units: 1000,
            saturated_max_utilization: 0.15,
        }
    }
}

/// Utilization reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationConfig {
    /// Age thresholds (days) for never-cited "dead weight" counts
    pub dead_weight_days: Vec<i64>,
}

impl Default for UtilizationConfig {
    fn default() -> Self {
        Self {
            dead_weight_days: vec![7, 30],
        }
    }
}
