//! Substrate: the knowledge-unit model and its taxonomy
//!
//! Units are owned by an external repository; this module defines their
//! shape, the eight-label classifier, and the repository seam through
//! which reclassifications are written back.

pub mod classifier;
pub mod repository;
pub mod unit;

pub use classifier::{
    apply_classification, classify, classify_option, compute_substrate_stats, is_public, migrate,
    Classification, MigrationReport, SubstrateStats,
};
pub use repository::{InMemoryUnitRepository, PruneRule, Reclassification, UnitRepository};
pub use unit::{Authority, KnowledgeUnit, Tier, UnitBuilder};
