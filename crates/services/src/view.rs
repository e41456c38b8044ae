use std::fmt;

use dashboard_core::model::{LevelChain, LevelDefinition, LevelId, ProgressRecord};
use dashboard_core::{LevelCompletion, UnlockStatus};
use storage::StorageError;

/// The level after this one, and whether the last update unlocked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextLevel {
    pub level_id: LevelId,
    pub newly_unlocked: bool,
}

/// Render-ready progress for one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelProgressView {
    pub level_id: LevelId,
    pub display_name: String,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub is_unlocked: bool,
    pub is_current: bool,
    pub next: Option<NextLevel>,
    pub status: UnlockStatus,
}

impl LevelProgressView {
    pub(crate) fn build(
        chain: &LevelChain,
        def: &LevelDefinition,
        completion: LevelCompletion,
        record: &ProgressRecord,
        newly_unlocked: &[LevelId],
    ) -> Self {
        Self {
            level_id: def.id().clone(),
            display_name: def.display_name().to_owned(),
            completed: completion.completed,
            total: completion.total,
            percent: completion.percent(),
            is_unlocked: record.is_unlocked(def.id()),
            is_current: record.current_level() == def.id(),
            next: def.unlocks().map(|next| NextLevel {
                level_id: next.clone(),
                newly_unlocked: newly_unlocked.contains(next),
            }),
            status: UnlockStatus::for_level(chain, def, completion),
        }
    }

    /// Progress line shown on the level card.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Progress: {} / {} projects ({}%)",
            self.completed, self.total, self.percent
        )
    }
}

/// Toast shown when a level becomes available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockNotice {
    pub level_id: LevelId,
    pub display_name: String,
}

impl fmt::Display for UnlockNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level Unlocked: {}", self.display_name)
    }
}

/// Result of a checkbox change or a full recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// One view per level, in chain order.
    pub levels: Vec<LevelProgressView>,
    pub newly_unlocked: Vec<LevelId>,
    pub notices: Vec<UnlockNotice>,
    /// Checked items across all levels in the snapshot.
    pub total_completed: usize,
    /// Set when the record could not be written; in-memory state is kept.
    pub persist_error: Option<StorageError>,
}

impl UpdateResult {
    #[must_use]
    pub fn level(&self, id: &LevelId) -> Option<&LevelProgressView> {
        self.levels.iter().find(|view| &view.level_id == id)
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Result of a successful level switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchResult {
    pub current_level: LevelId,
    pub display_name: String,
    /// Latest computed view of the active level, if progress was computed this
    /// session.
    pub view: Option<LevelProgressView>,
    pub persist_error: Option<StorageError>,
}

/// Result of resetting all progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetResult {
    pub record: ProgressRecord,
    pub persist_error: Option<StorageError>,
}
