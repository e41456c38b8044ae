//! Completion math and the level unlock rule.

use std::collections::BTreeMap;

use crate::model::{ItemId, LevelChain, LevelDefinition, LevelId, ProgressRecord, ProgressSnapshot};

/// Percentage of a level's items that must be checked to unlock its successor.
pub const UNLOCK_THRESHOLD: u8 = 70;

/// Rounded completion percentage, half away from zero (`2 / 3` is 67).
///
/// A level with no items is 0% complete.
#[must_use]
pub fn percent_complete(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u128;
    let total = total as u128;
    let percent = (200 * completed + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Checked vs. total items for one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCompletion {
    pub completed: usize,
    pub total: usize,
}

impl LevelCompletion {
    #[must_use]
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        percent_complete(self.completed, self.total)
    }

    /// Whether this level unlocks its successor. Empty levels never do.
    #[must_use]
    pub fn meets_threshold(&self) -> bool {
        self.total > 0 && self.percent() >= UNLOCK_THRESHOLD
    }
}

/// Count completion for every level of `chain` from `snapshot`.
///
/// `toggled` overrides the snapshot's state for one item, so a caller may pass
/// a snapshot taken just before the change. Levels missing from the snapshot
/// have no items.
#[must_use]
pub fn completions(
    chain: &LevelChain,
    snapshot: &ProgressSnapshot,
    toggled: Option<(&ItemId, bool)>,
) -> BTreeMap<LevelId, LevelCompletion> {
    chain
        .iter()
        .map(|def| {
            let mut completion = LevelCompletion::default();
            for item in snapshot.items_for(def.id()) {
                let checked = match toggled {
                    Some((id, checked)) if id == &item.id => checked,
                    _ => item.checked,
                };
                completion.total += 1;
                if checked {
                    completion.completed += 1;
                }
            }
            (def.id().clone(), completion)
        })
        .collect()
}

/// Apply the unlock rule to every level and return the levels newly
/// unlocked, in chain order.
///
/// Levels are only ever added to the record; a level whose trigger drops
/// back below the threshold stays unlocked.
pub fn apply_unlocks(
    chain: &LevelChain,
    record: &mut ProgressRecord,
    completions: &BTreeMap<LevelId, LevelCompletion>,
) -> Vec<LevelId> {
    let mut newly_unlocked = Vec::new();
    for def in chain.iter() {
        let Some(next) = def.unlocks() else {
            continue;
        };
        let met = completions
            .get(def.id())
            .is_some_and(LevelCompletion::meets_threshold);
        if met && record.unlock(next.clone()) {
            newly_unlocked.push(next.clone());
        }
    }
    newly_unlocked
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// What a level's card should say about the level after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockStatus {
    /// Threshold met; `next` is (or just became) unlocked.
    Unlocks { next: LevelId, next_name: String },
    /// Threshold not met yet.
    Requires {
        next: LevelId,
        next_name: String,
        threshold: u8,
    },
    FinalLevel,
}

impl UnlockStatus {
    #[must_use]
    pub fn for_level(chain: &LevelChain, def: &LevelDefinition, completion: LevelCompletion) -> Self {
        let Some(next) = def.unlocks() else {
            return UnlockStatus::FinalLevel;
        };
        let next_name = chain.display_name(next).unwrap_or(next.as_str()).to_owned();
        if completion.meets_threshold() {
            UnlockStatus::Unlocks {
                next: next.clone(),
                next_name,
            }
        } else {
            UnlockStatus::Requires {
                next: next.clone(),
                next_name,
                threshold: UNLOCK_THRESHOLD,
            }
        }
    }

    /// Card text, e.g. `70% required to unlock Intermediate`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            UnlockStatus::Unlocks { next_name, .. } => format!("Unlocks: {next_name}"),
            UnlockStatus::Requires {
                next_name,
                threshold,
                ..
            } => format!("{threshold}% required to unlock {next_name}"),
            UnlockStatus::FinalLevel => "Final Level".to_owned(),
        }
    }
}
