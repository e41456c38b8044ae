use std::collections::BTreeMap;
use std::sync::Arc;

use dashboard_core::DashboardConfig;
use dashboard_core::model::{ItemId, LevelChain, LevelId, ProgressRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::repository::{KeyValueStore, StorageError};

/// Persisted JSON shape of a progress record:
/// `{"checked": {...}, "currentLevel": "...", "unlockedLevels": [...]}`.
///
/// This mirrors the domain `ProgressRecord` so the store can read records
/// already saved by the browser dashboard without leaking the format into the
/// domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDocument {
    #[serde(default)]
    pub checked: BTreeMap<ItemId, bool>,
    #[serde(rename = "currentLevel")]
    pub current_level: LevelId,
    #[serde(rename = "unlockedLevels")]
    pub unlocked_levels: Vec<LevelId>,
}

impl ProgressDocument {
    #[must_use]
    pub fn from_record(record: &ProgressRecord) -> Self {
        Self {
            checked: record.checked_items().clone(),
            current_level: record.current_level().clone(),
            unlocked_levels: record.unlocked_levels().to_vec(),
        }
    }

    #[must_use]
    pub fn into_record(self) -> ProgressRecord {
        ProgressRecord::from_persisted(self.checked, self.current_level, self.unlocked_levels)
    }
}

/// How `ProgressStore::load_outcome` obtained its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet; defaults returned.
    Fresh(ProgressRecord),
    Loaded(ProgressRecord),
    /// A stored value existed but could not be used; defaults returned.
    Recovered {
        record: ProgressRecord,
        reason: String,
    },
}

impl LoadOutcome {
    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        match self {
            LoadOutcome::Fresh(record)
            | LoadOutcome::Loaded(record)
            | LoadOutcome::Recovered { record, .. } => record,
        }
    }

    #[must_use]
    pub fn into_record(self) -> ProgressRecord {
        match self {
            LoadOutcome::Fresh(record)
            | LoadOutcome::Loaded(record)
            | LoadOutcome::Recovered { record, .. } => record,
        }
    }
}

/// Reads and writes the progress record under one well-known key.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    chain: LevelChain,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &DashboardConfig) -> Self {
        Self {
            kv,
            key: config.storage_key().to_owned(),
            chain: config.chain().clone(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The record a new user starts with.
    #[must_use]
    pub fn default_record(&self) -> ProgressRecord {
        ProgressRecord::new(&self.chain)
    }

    /// Load the stored record, falling back to defaults when it is missing,
    /// unreadable or malformed. Nothing is written back.
    #[must_use]
    pub fn load(&self) -> ProgressRecord {
        self.load_outcome().into_record()
    }

    /// Like [`ProgressStore::load`], but reports where the record came from.
    #[must_use]
    pub fn load_outcome(&self) -> LoadOutcome {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no stored progress; using defaults");
                return LoadOutcome::Fresh(self.default_record());
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "progress unreadable; using defaults");
                return LoadOutcome::Recovered {
                    record: self.default_record(),
                    reason: err.to_string(),
                };
            }
        };

        match serde_json::from_str::<ProgressDocument>(&raw) {
            Ok(doc) => {
                debug!(
                    key = %self.key,
                    checked = doc.checked.len(),
                    unlocked = doc.unlocked_levels.len(),
                    "loaded progress"
                );
                LoadOutcome::Loaded(doc.into_record())
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding malformed progress");
                LoadOutcome::Recovered {
                    record: self.default_record(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Serialize `record` and replace the stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization fails or the backend rejects
    /// the write; the previously stored value is left as it was.
    pub fn save(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(&ProgressDocument::from_record(record))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(&self.key, &json)?;
        debug!(key = %self.key, bytes = json.len(), "saved progress");
        Ok(())
    }

    /// Drop the stored value and write the default record back.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete or the write fails.
    pub fn reset(&self) -> Result<ProgressRecord, StorageError> {
        self.kv.remove(&self.key)?;
        let record = self.default_record();
        self.save(&record)?;
        debug!(key = %self.key, "reset progress");
        Ok(record)
    }
}
