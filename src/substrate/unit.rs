//! Knowledge unit data types
//!
//! A `KnowledgeUnit` is owned by the external unit repository. The engine
//! reads every field but only ever writes `classification`,
//! `previous_classification` and `pruned_at` (through a
//! [`Reclassification`](super::repository::Reclassification)).
//!
//! Fields coming from storage are deserialized leniently: a malformed
//! timestamp, tier or classification degrades to `None` instead of failing
//! the whole record.

use super::classifier::Classification;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Metadata keys that may name a parent unit
const PARENT_KEYS: [&str; 2] = ["parent_id", "parentId"];

/// A single learned knowledge unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeUnit {
    /// Unique unit identifier
    pub id: String,
    /// Short title
    #[serde(default)]
    pub title: String,
    /// Textual summary used for similarity
    #[serde(default)]
    pub summary: String,
    /// Free-form notes, also used for similarity
    #[serde(default)]
    pub notes: Vec<String>,
    /// Structural tier
    #[serde(default, deserialize_with = "lenient")]
    pub tier: Option<Tier>,
    /// Stored classification label, if any
    #[serde(default, deserialize_with = "lenient")]
    pub classification: Option<Classification>,
    /// Origin descriptor (e.g. "seed", "repair-cortex", "user")
    #[serde(default)]
    pub source: Option<String>,
    /// Tags; the first tag is the primary domain
    #[serde(default)]
    pub tags: Vec<String>,
    /// Authority descriptor
    #[serde(default)]
    pub authority: Option<Authority>,
    /// Arbitrary metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Creation timestamp
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Classification before the last reclassification
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub previous_classification: Option<Classification>,
    /// When the unit was last reclassified by pruning
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub pruned_at: Option<DateTime<Utc>>,
}

impl KnowledgeUnit {
    /// Age of the unit at `now`, or `None` when the creation time is unknown.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at.map(|created| now - created)
    }

    /// Whether the unit is strictly older than `days` at `now`.
    /// Units with an unknown creation time are never "older", nor is anything
    /// older than a span chrono cannot represent.
    pub fn older_than_days(&self, days: i64, now: DateTime<Utc>) -> bool {
        match (self.age(now), Duration::try_days(days)) {
            (Some(age), Some(span)) => age > span,
            _ => false,
        }
    }

    /// Primary domain: the first tag, or "untagged"
    pub fn primary_tag(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or("untagged")
    }

    /// Whether the unit carries the given tag (case-insensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Parent unit referenced in metadata, if any
    pub fn parent_id(&self) -> Option<&str> {
        PARENT_KEYS
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(|v| v.as_str()))
            .filter(|id| !id.is_empty())
    }

    /// Metadata value as a string, if present
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Structural tier of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Ordinary single-source unit
    Ordinary,
    /// Unit compounded from several others
    Compound,
    /// Unit bridging more than one domain
    CrossDomain,
    /// Internal reasoning trace, never public
    InternalReasoning,
}

/// Authority descriptor of a unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Authority model, e.g. "seed" for foundational units
    #[serde(default)]
    pub model: Option<String>,
}

/// Deserialize an optional field, mapping malformed values to `None`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| match serde_json::from_value::<T>(raw.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring malformed unit field value {}: {}", raw, e);
            None
        }
    }))
}

/// Builder for constructing `KnowledgeUnit` instances
pub struct UnitBuilder {
    unit: KnowledgeUnit,
}

impl UnitBuilder {
    /// Create a new builder with the required identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            unit: KnowledgeUnit {
                id: id.into(),
                created_at: Some(Utc::now()),
                ..Default::default()
            },
        }
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.unit.title = title.into();
        self
    }

    /// Set the summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.unit.summary = summary.into();
        self
    }

    /// Add a notes entry
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.unit.notes.push(note.into());
        self
    }

    /// Set the tier
    pub fn tier(mut self, tier: Tier) -> Self {
        self.unit.tier = Some(tier);
        self
    }

    /// Set a stored classification
    pub fn classification(mut self, classification: Classification) -> Self {
        self.unit.classification = Some(classification);
        self
    }

    /// Set the source descriptor
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.unit.source = Some(source.into());
        self
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.unit.tags.push(tag.into());
        self
    }

    /// Set the authority model
    pub fn authority_model(mut self, model: impl Into<String>) -> Self {
        self.unit.authority = Some(Authority {
            model: Some(model.into()),
        });
        self
    }

    /// Add a metadata entry
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.unit.metadata.insert(key.into(), value);
        self
    }

    /// Reference a parent unit
    pub fn parent(self, parent_id: impl Into<String>) -> Self {
        self.metadata("parent_id", serde_json::Value::String(parent_id.into()))
    }

    /// Set the creation timestamp
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.unit.created_at = Some(at);
        self
    }

    /// Mark the creation timestamp as unknown
    pub fn unknown_age(mut self) -> Self {
        self.unit.created_at = None;
        self
    }

    /// Build the unit
    pub fn build(mut self) -> KnowledgeUnit {
        self.unit.updated_at = self.unit.created_at;
        self.unit
    }
}
