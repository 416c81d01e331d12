//! Lexical similarity primitives
//!
//! Text is lower-cased, split on runs of non-alphanumeric characters, and
//! tokens of two characters or fewer are dropped. Similarity between two
//! token sets is their Jaccard index.

use crate::substrate::KnowledgeUnit;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Tokens must be longer than this many characters
const MIN_TOKEN_CHARS: usize = 2;

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("separator pattern is valid"))
}

/// Title, summary and notes of a unit, lower-cased and space-joined
pub fn extract_text(unit: &KnowledgeUnit) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(2 + unit.notes.len());
    parts.push(&unit.title);
    parts.push(&unit.summary);
    parts.extend(unit.notes.iter().map(String::as_str));
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Token set of `text`
pub fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    separator()
        .split(&lowered)
        .filter(|t| t.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Token set of a unit's text
pub fn unit_tokens(unit: &KnowledgeUnit) -> HashSet<String> {
    tokenize(&extract_text(unit))
}

/// Jaccard index `|A ∩ B| / |A ∪ B|`; two empty sets are identical (1.0)
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
