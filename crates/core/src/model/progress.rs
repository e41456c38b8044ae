use std::collections::BTreeMap;

use crate::model::ids::{ItemId, LevelId};
use crate::model::level::LevelChain;

/// Persisted snapshot of a user's progress: checked items, the level last
/// viewed, and the levels unlocked so far.
///
/// The unlocked list only grows. `unlock` is the only way to add to it and
/// nothing removes from it; a fresh record comes from [`ProgressRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    checked: BTreeMap<ItemId, bool>,
    current_level: LevelId,
    unlocked_levels: Vec<LevelId>,
}

impl ProgressRecord {
    /// Default record: nothing checked, first level current and unlocked.
    #[must_use]
    pub fn new(chain: &LevelChain) -> Self {
        let first = chain.first_id().clone();
        Self {
            checked: BTreeMap::new(),
            current_level: first.clone(),
            unlocked_levels: vec![first],
        }
    }

    /// Rebuild a record exactly as it was stored.
    ///
    /// No invariants are enforced here; call [`ProgressRecord::normalize`]
    /// before handing the record to the engine.
    #[must_use]
    pub fn from_persisted(
        checked: BTreeMap<ItemId, bool>,
        current_level: LevelId,
        unlocked_levels: Vec<LevelId>,
    ) -> Self {
        Self {
            checked,
            current_level,
            unlocked_levels,
        }
    }

    /// Restore the record invariants against `chain`.
    ///
    /// Adds the first level to the unlocked set if missing and moves the
    /// current level back to the first level if it is not unlocked. Unknown
    /// ids are left in place. Returns `true` if anything changed.
    pub fn normalize(&mut self, chain: &LevelChain) -> bool {
        let first = chain.first_id();
        let mut changed = false;
        if !self.is_unlocked(first) {
            self.unlocked_levels.insert(0, first.clone());
            changed = true;
        }
        if !self.is_unlocked(&self.current_level) {
            self.current_level = first.clone();
            changed = true;
        }
        changed
    }

    #[must_use]
    pub fn checked_items(&self) -> &BTreeMap<ItemId, bool> {
        &self.checked
    }

    #[must_use]
    pub fn current_level(&self) -> &LevelId {
        &self.current_level
    }

    /// Unlocked levels in the order they were unlocked.
    #[must_use]
    pub fn unlocked_levels(&self) -> &[LevelId] {
        &self.unlocked_levels
    }

    #[must_use]
    pub fn is_unlocked(&self, level: &LevelId) -> bool {
        self.unlocked_levels.contains(level)
    }

    /// Whether `item` was last recorded as checked. Unknown items are unchecked.
    #[must_use]
    pub fn is_checked(&self, item: &str) -> bool {
        self.checked.get(item).copied().unwrap_or(false)
    }

    /// Number of items recorded as checked, regardless of level.
    #[must_use]
    pub fn total_completed(&self) -> usize {
        self.checked.values().filter(|checked| **checked).count()
    }

    /// Record the state of an item. Unchecking keeps the key with `false`.
    pub fn set_checked(&mut self, item: ItemId, checked: bool) {
        self.checked.insert(item, checked);
    }

    /// Add `level` to the unlocked set. Returns `true` if it was not there.
    pub fn unlock(&mut self, level: LevelId) -> bool {
        if self.is_unlocked(&level) {
            return false;
        }
        self.unlocked_levels.push(level);
        true
    }

    /// Make `level` current if it is unlocked. Returns `false` otherwise and
    /// leaves the record untouched.
    pub fn set_current_level(&mut self, level: &LevelId) -> bool {
        if !self.is_unlocked(level) {
            return false;
        }
        if &self.current_level != level {
            self.current_level = level.clone();
        }
        true
    }
}
