use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LevelId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LevelChainError {
    #[error("level chain must contain at least one level")]
    Empty,

    #[error("level id cannot be empty (position {position})")]
    EmptyLevelId { position: usize },

    #[error("level {level} has an empty display name")]
    EmptyName { level: LevelId },

    #[error("level {level} is defined more than once")]
    DuplicateLevel { level: LevelId },

    #[error("level {level} unlocks unknown level {target}")]
    UnknownTarget { level: LevelId, target: LevelId },

    #[error("level {target} is unlocked by more than one level")]
    MultiplePredecessors { target: LevelId },

    #[error("first level {level} cannot be unlocked by another level")]
    FirstLevelHasPredecessor { level: LevelId },

    #[error("level chain loops back to {level}")]
    Cycle { level: LevelId },

    #[error("level {level} is not reachable from the first level")]
    Unreachable { level: LevelId },
}

//
// ─── LEVEL DEFINITION ──────────────────────────────────────────────────────────
//

/// Static description of one level in the learning path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDefinition {
    id: LevelId,
    display_name: String,
    unlocks: Option<LevelId>,
}

impl LevelDefinition {
    #[must_use]
    pub fn id(&self) -> &LevelId {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The level this one unlocks, `None` for the terminal level.
    #[must_use]
    pub fn unlocks(&self) -> Option<&LevelId> {
        self.unlocks.as_ref()
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.unlocks.is_none()
    }
}

/// Unvalidated level entry, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinitionDraft {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unlocks: Option<String>,
}

impl LevelDefinitionDraft {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, unlocks: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unlocks: unlocks.map(str::to_owned),
        }
    }
}

//
// ─── CHAIN ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated level chain. The first entry is the level every user starts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelChainDraft {
    pub levels: Vec<LevelDefinitionDraft>,
}

impl LevelChainDraft {
    #[must_use]
    pub fn new(levels: Vec<LevelDefinitionDraft>) -> Self {
        Self { levels }
    }

    /// Validate and normalize the draft into a singly-linked chain.
    ///
    /// # Errors
    ///
    /// Returns `LevelChainError` if ids or names are blank, ids repeat, a
    /// successor is unknown or shared, or the chain does not visit every level
    /// exactly once starting from the first entry.
    pub fn validate(self) -> Result<LevelChain, LevelChainError> {
        if self.levels.is_empty() {
            return Err(LevelChainError::Empty);
        }

        let mut defs: Vec<LevelDefinition> = Vec::with_capacity(self.levels.len());
        let mut index: HashMap<LevelId, usize> = HashMap::new();
        for (position, draft) in self.levels.into_iter().enumerate() {
            let id = draft.id.trim();
            if id.is_empty() {
                return Err(LevelChainError::EmptyLevelId { position });
            }
            let id = LevelId::new(id);
            let name = draft.name.trim();
            if name.is_empty() {
                return Err(LevelChainError::EmptyName { level: id });
            }
            if index.insert(id.clone(), defs.len()).is_some() {
                return Err(LevelChainError::DuplicateLevel { level: id });
            }
            let unlocks = draft
                .unlocks
                .map(|target| target.trim().to_owned())
                .filter(|target| !target.is_empty())
                .map(LevelId::new);
            defs.push(LevelDefinition {
                id,
                display_name: name.to_owned(),
                unlocks,
            });
        }

        let mut targets: HashSet<&LevelId> = HashSet::new();
        for def in &defs {
            let Some(target) = def.unlocks.as_ref() else {
                continue;
            };
            if !index.contains_key(target) {
                return Err(LevelChainError::UnknownTarget {
                    level: def.id.clone(),
                    target: target.clone(),
                });
            }
            if !targets.insert(target) {
                return Err(LevelChainError::MultiplePredecessors {
                    target: target.clone(),
                });
            }
        }
        if targets.contains(&defs[0].id) {
            return Err(LevelChainError::FirstLevelHasPredecessor {
                level: defs[0].id.clone(),
            });
        }

        let mut order = Vec::with_capacity(defs.len());
        let mut seen = vec![false; defs.len()];
        let mut cursor = Some(0usize);
        while let Some(pos) = cursor {
            if seen[pos] {
                return Err(LevelChainError::Cycle {
                    level: defs[pos].id.clone(),
                });
            }
            seen[pos] = true;
            order.push(pos);
            cursor = defs[pos].unlocks.as_ref().and_then(|next| index.get(next).copied());
        }
        if let Some(pos) = seen.iter().position(|visited| !visited) {
            return Err(LevelChainError::Unreachable {
                level: defs[pos].id.clone(),
            });
        }

        let mut slots: Vec<Option<LevelDefinition>> = defs.into_iter().map(Some).collect();
        let levels = order
            .into_iter()
            .filter_map(|pos| slots[pos].take())
            .collect();
        Ok(LevelChain { levels })
    }
}

/// Ordered, validated chain of levels: `first -> ... -> final`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChain {
    levels: Vec<LevelDefinition>,
}

impl LevelChain {
    /// The built-in cybersecurity learning path.
    #[must_use]
    pub fn cyber_security() -> Self {
        Self {
            levels: vec![
                builtin("level1", "Foundations", Some("level2")),
                builtin("level2", "Intermediate", Some("level3")),
                builtin("level3", "Advanced", Some("level4")),
                builtin("level4", "Expert", None),
            ],
        }
    }

    /// The level every record starts with unlocked.
    #[must_use]
    pub fn first(&self) -> &LevelDefinition {
        &self.levels[0]
    }

    #[must_use]
    pub fn first_id(&self) -> &LevelId {
        &self.levels[0].id
    }

    #[must_use]
    pub fn get(&self, id: &LevelId) -> Option<&LevelDefinition> {
        self.levels.iter().find(|def| &def.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &LevelId) -> bool {
        self.get(id).is_some()
    }

    /// Display name of `id`, if the level exists.
    #[must_use]
    pub fn display_name(&self, id: &LevelId) -> Option<&str> {
        self.get(id).map(LevelDefinition::display_name)
    }

    /// The level whose completion unlocks `id`.
    #[must_use]
    pub fn predecessor(&self, id: &LevelId) -> Option<&LevelDefinition> {
        self.levels
            .iter()
            .find(|def| def.unlocks.as_ref() == Some(id))
    }

    /// Levels in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for LevelChain {
    fn default() -> Self {
        Self::cyber_security()
    }
}

fn builtin(id: &str, name: &str, unlocks: Option<&str>) -> LevelDefinition {
    LevelDefinition {
        id: LevelId::new(id),
        display_name: name.to_owned(),
        unlocks: unlocks.map(LevelId::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(levels: &[(&str, &str, Option<&str>)]) -> LevelChainDraft {
        LevelChainDraft::new(
            levels
                .iter()
                .map(|(id, name, next)| LevelDefinitionDraft::new(*id, *name, *next))
                .collect(),
        )
    }

    #[test]
    fn builtin_chain_matches_validated_draft() {
        let validated = draft(&[
            ("level1", "Foundations", Some("level2")),
            ("level2", "Intermediate", Some("level3")),
            ("level3", "Advanced", Some("level4")),
            ("level4", "Expert", None),
        ])
        .validate()
        .unwrap();
        assert_eq!(validated, LevelChain::cyber_security());
    }

    #[test]
    fn chain_is_reordered_by_links() {
        let chain = draft(&[
            ("a", "A", Some("c")),
            ("b", "B", None),
            ("c", "C", Some("b")),
        ])
        .validate()
        .unwrap();
        let ids: Vec<&str> = chain.iter().map(|def| def.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn predecessor_and_names() {
        let chain = LevelChain::cyber_security();
        let pred = chain.predecessor(&LevelId::new("level3")).unwrap();
        assert_eq!(pred.display_name(), "Intermediate");
        assert!(chain.predecessor(chain.first_id()).is_none());
        assert_eq!(chain.display_name(&LevelId::new("level4")), Some("Expert"));
        assert!(chain.get(&LevelId::new("level4")).unwrap().is_final());
    }

    #[test]
    fn rejects_empty_chain() {
        assert_eq!(draft(&[]).validate().unwrap_err(), LevelChainError::Empty);
    }

    #[test]
    fn rejects_blank_name_and_id() {
        let err = draft(&[("a", "  ", None)]).validate().unwrap_err();
        assert!(matches!(err, LevelChainError::EmptyName { .. }));
        let err = draft(&[(" ", "A", None)]).validate().unwrap_err();
        assert_eq!(err, LevelChainError::EmptyLevelId { position: 0 });
    }

    #[test]
    fn rejects_duplicates_and_unknown_targets() {
        let err = draft(&[("a", "A", None), ("a", "B", None)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, LevelChainError::DuplicateLevel { .. }));

        let err = draft(&[("a", "A", Some("z"))]).validate().unwrap_err();
        assert!(matches!(err, LevelChainError::UnknownTarget { .. }));
    }

    #[test]
    fn rejects_branching_and_loops() {
        let err = draft(&[
            ("a", "A", Some("c")),
            ("b", "B", Some("c")),
            ("c", "C", None),
        ])
        .validate()
        .unwrap_err();
        assert!(matches!(err, LevelChainError::MultiplePredecessors { .. }));

        let err = draft(&[("a", "A", Some("b")), ("b", "B", Some("a"))])
            .validate()
            .unwrap_err();
        assert!(matches!(err, LevelChainError::FirstLevelHasPredecessor { .. }));

        let err = draft(&[
            ("a", "A", None),
            ("b", "B", Some("c")),
            ("c", "C", Some("b")),
        ])
        .validate()
        .unwrap_err();
        assert!(matches!(err, LevelChainError::Unreachable { .. }));
    }

    #[test]
    fn draft_deserializes_from_json() {
        let json = r#"[
            {"id": "intro", "name": "Intro", "unlocks": "deep"},
            {"id": "deep", "name": "Deep Dive"}
        ]"#;
        let chain: LevelChainDraft = serde_json::from_str(json).unwrap();
        let chain = chain.validate().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.first().display_name(), "Intro");
    }
}
