//! Novelty checks for newly generated knowledge
//!
//! - [`similarity`]: text extraction, tokenization, Jaccard index
//! - [`verifier`]: duplicate detection against the public corpus and the
//!   daily verdict ledger
//! - [`quota`]: generation limits that tighten as novelty falls

pub mod quota;
pub mod similarity;
pub mod verifier;

pub use quota::{
    effective_limit, recommended_evolution_ratio, GenerationCounters, NoveltyBand, QuotaDecision,
    QuotaDenial, QuotaGovernor, QuotaUsage,
};
pub use similarity::{extract_text, jaccard, tokenize, unit_tokens};
pub use verifier::{
    check_novelty, NoveltyCheck, NoveltyDailyBucket, NoveltyIndex, NoveltyLedger, NoveltyReason,
    NoveltyStats, NoveltyVerdict, SimilarUnit,
};
