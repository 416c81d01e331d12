//! Unit repository seam and reclassification events
//!
//! The engine never mutates units directly during audits. Batch passes
//! produce `Reclassification` events that are applied through the
//! repository's update path, which only rewrites the classification
//! fields and never inserts or removes units.

use super::classifier::Classification;
use super::unit::KnowledgeUnit;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Why a unit was reclassified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneRule {
    /// Public, never cited, past the scaffold age
    Uncited,
    /// Repeatedly used with mostly negative feedback
    Harmful,
    /// Repair unit past the archive age
    ArchivedRepair,
    /// Shadow unit whose parent is deprecated
    OrphanedShadow,
}

/// A single classification change to apply to a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reclassification {
    /// Target unit
    pub unit_id: String,
    /// Classification before the change
    pub from: Classification,
    /// Classification after the change
    pub to: Classification,
    /// Last rule that decided the change
    pub rule: PruneRule,
    /// When the change was decided
    pub at: DateTime<Utc>,
}

/// Storage seam for knowledge units
pub trait UnitRepository {
    /// All units in iteration order
    fn units(&self) -> &[KnowledgeUnit];

    /// Look up a unit by ID
    fn get(&self, id: &str) -> Option<&KnowledgeUnit>;

    /// Apply a reclassification event
    fn apply(&mut self, event: &Reclassification) -> Result<()>;

    /// Number of units
    fn len(&self) -> usize {
        self.units().len()
    }

    /// Whether the repository holds no units
    fn is_empty(&self) -> bool {
        self.units().is_empty()
    }
}

/// In-memory unit repository with an ID index
#[derive(Debug, Clone, Default)]
pub struct InMemoryUnitRepository {
    units: Vec<KnowledgeUnit>,
    index: HashMap<String, usize>,
}

impl InMemoryUnitRepository {
    /// Create a repository from a list of units.
    ///
    /// Later duplicates of an ID replace earlier ones in place.
    pub fn new(units: Vec<KnowledgeUnit>) -> Self {
        let mut repo = Self::default();
        for unit in units {
            repo.upsert(unit);
        }
        repo
    }

    /// Load units from a JSON array file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let units: Vec<KnowledgeUnit> = serde_json::from_str(&content)?;
        Ok(Self::new(units))
    }

    /// Write units to a JSON array file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.units)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Insert or replace a unit, returning true when it was new
    pub fn upsert(&mut self, unit: KnowledgeUnit) -> bool {
        match self.index.get(&unit.id) {
            Some(&pos) => {
                self.units[pos] = unit;
                false
            }
            None => {
                self.index.insert(unit.id.clone(), self.units.len());
                self.units.push(unit);
                true
            }
        }
    }

    /// Mutable access to all units (classification migration)
    pub fn units_mut(&mut self) -> &mut [KnowledgeUnit] {
        &mut self.units
    }
}

impl UnitRepository for InMemoryUnitRepository {
    fn units(&self) -> &[KnowledgeUnit] {
        &self.units
    }

    fn get(&self, id: &str) -> Option<&KnowledgeUnit> {
        self.index.get(id).map(|&pos| &self.units[pos])
    }

    fn apply(&mut self, event: &Reclassification) -> Result<()> {
        let pos = *self
            .index
            .get(&event.unit_id)
            .ok_or_else(|| Error::Repository(format!("unknown unit '{}'", event.unit_id)))?;
        let unit = &mut self.units[pos];
        unit.previous_classification = Some(event.from);
        unit.classification = Some(event.to);
        unit.pruned_at = Some(event.at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::unit::UnitBuilder;

    fn event(id: &str) -> Reclassification {
        Reclassification {
            unit_id: id.to_string(),
            from: Classification::Knowledge,
            to: Classification::Scaffold,
            rule: PruneRule::Uncited,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let mut repo = InMemoryUnitRepository::new(vec![UnitBuilder::new("a").build()]);
        assert!(repo.upsert(UnitBuilder::new("b").build()));
        assert!(!repo.upsert(UnitBuilder::new("a").title("renamed").build()));
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get("a").unwrap().title, "renamed");
        assert!(repo.get("zzz").is_none());
    }

    #[test]
    fn test_apply_writes_markers_only() {
        let mut repo = InMemoryUnitRepository::new(vec![UnitBuilder::new("a").title("t").build()]);
        let ev = event("a");
        repo.apply(&ev).unwrap();

        let unit = repo.get("a").unwrap();
        assert_eq!(unit.classification, Some(Classification::Scaffold));
        assert_eq!(unit.previous_classification, Some(Classification::Knowledge));
        assert_eq!(unit.pruned_at, Some(ev.at));
        assert_eq!(unit.title, "t");
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_apply_unknown_unit() {
        let mut repo = InMemoryUnitRepository::default();
        let err = repo.apply(&event("ghost")).unwrap_err();
        assert!(matches!(err, Error::Repository(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.json");

        let repo = InMemoryUnitRepository::new(vec![
            UnitBuilder::new("a").tag("math").build(),
            UnitBuilder::new("b").tag("science").build(),
        ]);
        repo.save(&path).unwrap();

        let loaded = InMemoryUnitRepository::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("b").unwrap().primary_tag(), "science");
    }
}
