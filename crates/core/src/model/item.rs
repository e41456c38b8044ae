use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ItemId, LevelId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemKeyError {
    #[error("item at position {index} has no explicit id")]
    MissingExplicitId { index: usize },
}

/// How the UI layer turns a rendered item into a persisted key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKeyStrategy {
    /// Trimmed label text, then element id, then `checkbox_<index>`.
    ///
    /// Compatible with records already saved in the browser. Two items
    /// with the same label share one key.
    #[default]
    LabelText,
    /// A stable id assigned in level configuration; labels are ignored.
    Explicit,
}

/// What the UI layer knows about one rendered item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemKeySource {
    pub label: Option<String>,
    pub element_id: Option<String>,
    pub index: usize,
}

impl ItemKeySource {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    fn element_id(&self) -> Option<&str> {
        self.element_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl ItemKeyStrategy {
    /// Derive the persisted key for `source`.
    ///
    /// # Errors
    ///
    /// Returns `ItemKeyError::MissingExplicitId` under `Explicit` when the
    /// source carries no usable element id.
    pub fn derive(self, source: &ItemKeySource) -> Result<ItemId, ItemKeyError> {
        match self {
            ItemKeyStrategy::LabelText => Ok(match (&source.label, source.element_id()) {
                (Some(label), _) => ItemId::new(label.trim()),
                (None, Some(id)) => ItemId::new(id),
                (None, None) => ItemId::new(format!("checkbox_{}", source.index)),
            }),
            ItemKeyStrategy::Explicit => source
                .element_id()
                .map(ItemId::new)
                .ok_or(ItemKeyError::MissingExplicitId {
                    index: source.index,
                }),
        }
    }
}

/// A key shared by more than one rendered item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: ItemId,
    pub indices: Vec<usize>,
}

/// Report keys that more than one source maps to.
///
/// Sources that fail to derive a key are skipped; `derive` reports those.
#[must_use]
pub fn find_collisions(strategy: ItemKeyStrategy, sources: &[ItemKeySource]) -> Vec<KeyCollision> {
    let mut by_key: BTreeMap<ItemId, Vec<usize>> = BTreeMap::new();
    for source in sources {
        if let Ok(key) = strategy.derive(source) {
            by_key.entry(key).or_default().push(source.index);
        }
    }
    by_key
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(key, indices)| KeyCollision { key, indices })
        .collect()
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Checked state of one item as currently rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemState {
    pub id: ItemId,
    pub checked: bool,
}

impl ItemState {
    #[must_use]
    pub fn new(id: impl Into<ItemId>, checked: bool) -> Self {
        Self {
            id: id.into(),
            checked,
        }
    }
}

/// Items that belong to a level, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelItems {
    pub level: LevelId,
    pub items: Vec<ItemState>,
}

/// Item membership and checked state per level, supplied by the UI layer on
/// every recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    levels: Vec<LevelItems>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<LevelId>, items: Vec<ItemState>) -> Self {
        self.push_level(level, items);
        self
    }

    pub fn push_level(&mut self, level: impl Into<LevelId>, items: Vec<ItemState>) {
        self.levels.push(LevelItems {
            level: level.into(),
            items,
        });
    }

    /// Every entry recorded for `level`; repeated entries are all returned.
    pub fn items_for<'a>(&'a self, level: &'a LevelId) -> impl Iterator<Item = &'a ItemState> + 'a {
        self.levels
            .iter()
            .filter(move |entry| &entry.level == level)
            .flat_map(|entry| entry.items.iter())
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelItems] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_text_is_trimmed() {
        let source = ItemKeySource::new(0)
            .with_label("  Set up a home lab \n")
            .with_element_id("cb-1");
        let key = ItemKeyStrategy::LabelText.derive(&source).unwrap();
        assert_eq!(key.as_str(), "Set up a home lab");
    }

    #[test]
    fn label_text_falls_back_to_element_id_then_index() {
        let with_id = ItemKeySource::new(4).with_element_id("cb-4");
        assert_eq!(
            ItemKeyStrategy::LabelText.derive(&with_id).unwrap().as_str(),
            "cb-4"
        );

        let bare = ItemKeySource::new(7).with_element_id("  ");
        assert_eq!(
            ItemKeyStrategy::LabelText.derive(&bare).unwrap().as_str(),
            "checkbox_7"
        );
    }

    #[test]
    fn blank_label_yields_empty_key() {
        let source = ItemKeySource::new(2).with_label("   ").with_element_id("cb-2");
        let key = ItemKeyStrategy::LabelText.derive(&source).unwrap();
        assert_eq!(key.as_str(), "");
    }

    #[test]
    fn explicit_requires_element_id() {
        let source = ItemKeySource::new(3).with_label("Port scanning");
        let err = ItemKeyStrategy::Explicit.derive(&source).unwrap_err();
        assert_eq!(err, ItemKeyError::MissingExplicitId { index: 3 });

        let source = source.with_element_id("nmap-basics");
        let key = ItemKeyStrategy::Explicit.derive(&source).unwrap();
        assert_eq!(key.as_str(), "nmap-basics");
    }

    #[test]
    fn identical_labels_collide() {
        let sources = vec![
            ItemKeySource::new(0).with_label("Write a report"),
            ItemKeySource::new(1).with_label("Capture packets"),
            ItemKeySource::new(2).with_label("Write a report "),
        ];
        let collisions = find_collisions(ItemKeyStrategy::LabelText, &sources);
        assert_eq!(
            collisions,
            vec![KeyCollision {
                key: ItemId::new("Write a report"),
                indices: vec![0, 2],
            }]
        );
    }

    #[test]
    fn explicit_ids_avoid_label_collisions() {
        let sources = vec![
            ItemKeySource::new(0).with_label("Write a report").with_element_id("l1-report"),
            ItemKeySource::new(1).with_label("Write a report").with_element_id("l2-report"),
        ];
        assert!(find_collisions(ItemKeyStrategy::Explicit, &sources).is_empty());
    }

    #[test]
    fn snapshot_merges_repeated_level_entries() {
        let level = LevelId::new("level1");
        let snapshot = ProgressSnapshot::new()
            .with_level("level1", vec![ItemState::new("a", true)])
            .with_level("level2", vec![ItemState::new("b", true)])
            .with_level("level1", vec![ItemState::new("c", false)]);
        let ids: Vec<&str> = snapshot.items_for(&level).map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
