//! LearnGuard - Learning Verification & Substrate Integrity
//!
//! LearnGuard answers one question for a knowledge-accumulating system: is
//! the corpus of learned units actually improving, or just growing? It
//! classifies every unit into a fixed taxonomy, rejects near-duplicate
//! generations, tracks which units are ever cited and whether they help,
//! throttles generation when novelty falls, and reclassifies (never
//! deletes) units that stop earning their place.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  Host (request layer / scheduler)                 │
//! └──────┬──────────────────────┬──────────────────────────┬─────────┘
//!        │ record_*             │ check_quota / try_consume │ run_*
//! ┌──────▼──────────────────────▼──────────────────────────▼─────────┐
//! │                     LearningStore (aggregate root)                 │
//! │  ┌────────────────┐ ┌──────────────────┐ ┌─────────────────────┐ │
//! │  │    tracking    │ │     novelty      │ │        audit        │ │
//! │  │ - retrieval    │ │ - verifier       │ │ - probation gate    │ │
//! │  │ - citations    │ │ - daily ledger   │ │ - substrate pruner  │ │
//! │  │ - helpfulness  │ │ - quota governor │ │ - dedup / coverage  │ │
//! │  └────────────────┘ └──────────────────┘ │ - dashboard         │ │
//! │                                          └──────────┬──────────┘ │
//! └─────────────────────────────────────────────────────┼────────────┘
//!                                                       │ Reclassification
//! ┌─────────────────────────────────────────────────────▼────────────┐
//! │             UnitRepository (units owned by the host)              │
//! │        classifier: knowledge │ seed │ compound │ cross-domain     │
//! │                    shadow │ repair │ scaffold │ deprecated        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`substrate`]: unit model, classifier, repository seam
//! - [`ledger`]: keyed time series and bounded histories
//! - [`tracking`]: retrieval hit rate, citations, helpfulness
//! - [`novelty`]: duplicate detection and generation quota
//! - [`audit`]: probation, pruning, dedup, coverage, dashboard
//! - [`store`]: the aggregate root and its shared wrapper
//! - [`config`]: configuration management

pub mod audit;
pub mod config;
pub mod error;
pub mod ledger;
pub mod novelty;
pub mod store;
pub mod substrate;
pub mod tracking;

pub use config::LearningConfig;
pub use error::{Error, Result};
pub use store::{LearningState, LearningStore, SharedLearningStore};
