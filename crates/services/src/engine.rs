use std::sync::Arc;

use dashboard_core::DashboardConfig;
use dashboard_core::model::{
    ItemId, ItemKeyError, ItemKeySource, LevelChain, LevelDefinition, LevelId, ProgressRecord,
    ProgressSnapshot,
};
use dashboard_core::unlock::{self, UNLOCK_THRESHOLD};
use storage::{KeyValueStore, ProgressStore, StorageError};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::view::{LevelProgressView, ResetResult, SwitchResult, UnlockNotice, UpdateResult};

/// Owns the progress record for one session and derives everything the
/// dashboard renders from it.
///
/// Every mutation is written through to the store. A failed write is
/// reported on the returned result and the in-memory record stays
/// authoritative; the next successful write catches the store up.
pub struct ProgressEngine {
    config: DashboardConfig,
    store: ProgressStore,
    record: ProgressRecord,
    views: Vec<LevelProgressView>,
}

impl ProgressEngine {
    /// Load the session's record from `kv`.
    ///
    /// Missing or malformed stored progress yields the default record. The
    /// loaded record is repaired in memory (first level unlocked, current
    /// level unlocked) but not written until the next mutation.
    #[must_use]
    pub fn initialize(config: DashboardConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        let store = ProgressStore::new(kv, &config);
        let mut record = store.load();
        if record.normalize(config.chain()) {
            debug!(current = %record.current_level(), "repaired loaded progress");
        }
        info!(
            current = %record.current_level(),
            unlocked = record.unlocked_levels().len(),
            completed = record.total_completed(),
            "progress engine initialized"
        );
        Self {
            config,
            store,
            record,
            views: Vec::new(),
        }
    }

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    #[must_use]
    pub fn chain(&self) -> &LevelChain {
        self.config.chain()
    }

    /// Views from the most recent update, empty until the first one.
    #[must_use]
    pub fn views(&self) -> &[LevelProgressView] {
        &self.views
    }

    #[must_use]
    pub fn current_level(&self) -> &LevelId {
        self.record.current_level()
    }

    #[must_use]
    pub fn current_level_name(&self) -> &str {
        let current = self.record.current_level();
        self.chain()
            .display_name(current)
            .unwrap_or(current.as_str())
    }

    #[must_use]
    pub fn is_unlocked(&self, level: &LevelId) -> bool {
        self.record.is_unlocked(level)
    }

    /// Stored state for an item, used to restore checkboxes on load.
    #[must_use]
    pub fn is_checked(&self, item: &str) -> bool {
        self.record.is_checked(item)
    }

    /// Checked items in the record, regardless of level membership.
    #[must_use]
    pub fn total_completed(&self) -> usize {
        self.record.total_completed()
    }

    /// Key for a rendered item under the configured strategy.
    ///
    /// # Errors
    ///
    /// Returns `ItemKeyError` if the strategy needs an id the source lacks.
    pub fn item_key(&self, source: &ItemKeySource) -> Result<ItemId, ItemKeyError> {
        self.config.item_keys().derive(source)
    }

    /// Record an item change, then recompute every level and apply unlocks.
    ///
    /// `snapshot` lists each level's items. The state it reports for `item`
    /// is overridden by `checked`.
    pub fn set_item_checked(
        &mut self,
        item: impl Into<ItemId>,
        checked: bool,
        snapshot: &ProgressSnapshot,
    ) -> UpdateResult {
        let item = item.into();
        debug!(item = %item, checked, "item changed");
        self.record.set_checked(item.clone(), checked);
        self.refresh(snapshot, Some((&item, checked)))
    }

    /// Recompute every level from `snapshot` without changing any item, e.g.
    /// for the first render of a session.
    pub fn recompute(&mut self, snapshot: &ProgressSnapshot) -> UpdateResult {
        self.refresh(snapshot, None)
    }

    /// Make `level` the current level.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LevelLocked` if the level is not unlocked yet, or
    /// `EngineError::UnknownLevel` if it is not part of the chain. The record
    /// is unchanged in both cases.
    pub fn switch_level(&mut self, level: &LevelId) -> Result<SwitchResult, EngineError> {
        let chain = self.config.chain();
        let Some(def) = chain.get(level) else {
            return Err(EngineError::UnknownLevel(level.clone()));
        };
        if !self.record.is_unlocked(level) {
            let required = chain
                .predecessor(level)
                .map_or(chain.first().display_name(), LevelDefinition::display_name);
            info!(requested = %level, required, "rejected switch to locked level");
            return Err(EngineError::LevelLocked {
                requested: level.clone(),
                requested_name: def.display_name().to_owned(),
                required_level_name: required.to_owned(),
                threshold: UNLOCK_THRESHOLD,
            });
        }
        let display_name = def.display_name().to_owned();

        self.record.set_current_level(level);
        for view in &mut self.views {
            view.is_current = &view.level_id == level;
        }
        let persist_error = self.persist();
        debug!(current = %level, "switched level");

        Ok(SwitchResult {
            current_level: level.clone(),
            display_name,
            view: self
                .views
                .iter()
                .find(|view| &view.level_id == level)
                .cloned(),
            persist_error,
        })
    }

    /// Discard all progress and store the default record.
    ///
    /// The in-memory record is reset even if the store rejects the write.
    pub fn reset_all(&mut self) -> ResetResult {
        let (record, persist_error) = match self.store.reset() {
            Ok(record) => (record, None),
            Err(err) => {
                warn!(error = %err, "reset not persisted; keeping in-memory defaults");
                (self.store.default_record(), Some(err))
            }
        };
        self.record = record.clone();
        self.views.clear();
        info!("progress reset");
        ResetResult {
            record,
            persist_error,
        }
    }

    fn refresh(
        &mut self,
        snapshot: &ProgressSnapshot,
        toggled: Option<(&ItemId, bool)>,
    ) -> UpdateResult {
        let chain = self.config.chain();
        let completions = unlock::completions(chain, snapshot, toggled);
        let newly_unlocked = unlock::apply_unlocks(chain, &mut self.record, &completions);
        for level in &newly_unlocked {
            info!(level = %level, "level unlocked");
        }
        let persist_error = self.persist();

        let levels: Vec<LevelProgressView> = chain
            .iter()
            .map(|def| {
                let completion = completions.get(def.id()).copied().unwrap_or_default();
                LevelProgressView::build(chain, def, completion, &self.record, &newly_unlocked)
            })
            .collect();
        let notices = newly_unlocked
            .iter()
            .map(|id| UnlockNotice {
                level_id: id.clone(),
                display_name: chain.display_name(id).unwrap_or(id.as_str()).to_owned(),
            })
            .collect();
        let total_completed = completions.values().map(|c| c.completed).sum();

        self.views.clone_from(&levels);
        UpdateResult {
            levels,
            newly_unlocked,
            notices,
            total_completed,
            persist_error,
        }
    }

    fn persist(&self) -> Option<StorageError> {
        self.store
            .save(&self.record)
            .inspect_err(|err| {
                warn!(error = %err, "progress not persisted; keeping in-memory state");
            })
            .err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::model::{ItemKeyStrategy, ItemState};
    use storage::InMemoryStore;

    /// Store whose every call fails, like a browser with storage disabled.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("storage disabled".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("storage disabled".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("storage disabled".into()))
        }
    }

    fn three_items(checked: usize) -> ProgressSnapshot {
        let items = ["Install a VM", "Learn the shell", "Read RFC 791"]
            .iter()
            .enumerate()
            .map(|(i, label)| ItemState::new(*label, i < checked))
            .collect();
        ProgressSnapshot::new().with_level("level1", items)
    }

    #[test]
    fn broken_store_degrades_to_in_memory_session() {
        let mut engine = ProgressEngine::initialize(DashboardConfig::default(), Arc::new(BrokenStore));
        assert_eq!(engine.record(), &ProgressRecord::new(engine.chain()));

        let result = engine.set_item_checked("Read RFC 791", true, &three_items(2));
        assert!(!result.is_persisted());
        assert_eq!(result.newly_unlocked, vec![LevelId::new("level2")]);
        assert!(engine.is_unlocked(&LevelId::new("level2")));

        let switched = engine.switch_level(&LevelId::new("level2")).unwrap();
        assert!(switched.persist_error.is_some());
        assert_eq!(engine.current_level(), &LevelId::new("level2"));

        let reset = engine.reset_all();
        assert!(reset.persist_error.is_some());
        assert_eq!(engine.record(), &ProgressRecord::new(engine.chain()));
    }

    #[test]
    fn quota_failure_is_reconciled_by_next_write() {
        let kv = InMemoryStore::with_quota(160);
        let mut engine = ProgressEngine::initialize(DashboardConfig::default(), Arc::new(kv.clone()));

        let long = "x".repeat(120);
        let snapshot = ProgressSnapshot::new()
            .with_level("level1", vec![ItemState::new(long.as_str(), false)]);
        let result = engine.set_item_checked(long.as_str(), true, &snapshot);
        assert!(matches!(
            result.persist_error,
            Some(StorageError::QuotaExceeded { .. })
        ));
        assert!(engine.is_checked(&long));

        // Shrink the record back under quota by resetting; the store catches up.
        let reset = engine.reset_all();
        assert!(reset.persist_error.is_none());
        let raw = kv.get("cyber_dashboard_progress").unwrap().unwrap();
        assert!(!raw.contains(&long));
    }

    #[test]
    fn initialize_repairs_locked_current_level_without_writing() {
        let kv = InMemoryStore::new();
        let stored = r#"{"checked":{},"currentLevel":"level3","unlockedLevels":["level1"]}"#;
        kv.set("cyber_dashboard_progress", stored).unwrap();

        let engine = ProgressEngine::initialize(DashboardConfig::default(), Arc::new(kv.clone()));
        assert_eq!(engine.current_level(), &LevelId::new("level1"));
        assert_eq!(engine.current_level_name(), "Foundations");
        assert_eq!(
            kv.get("cyber_dashboard_progress").unwrap().as_deref(),
            Some(stored)
        );
    }

    #[test]
    fn unknown_level_is_rejected() {
        let mut engine =
            ProgressEngine::initialize(DashboardConfig::default(), Arc::new(InMemoryStore::new()));
        let err = engine.switch_level(&LevelId::new("level9")).unwrap_err();
        assert_eq!(err, EngineError::UnknownLevel(LevelId::new("level9")));
    }

    #[test]
    fn item_key_follows_configured_strategy() {
        let source = ItemKeySource::new(0)
            .with_label(" Capture a handshake ")
            .with_element_id("l2-wifi");
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());

        let engine = ProgressEngine::initialize(DashboardConfig::default(), Arc::clone(&kv));
        assert_eq!(engine.item_key(&source).unwrap().as_str(), "Capture a handshake");

        let explicit = DashboardConfig::default().with_item_keys(ItemKeyStrategy::Explicit);
        let engine = ProgressEngine::initialize(explicit, kv);
        assert_eq!(engine.item_key(&source).unwrap().as_str(), "l2-wifi");
    }
}
