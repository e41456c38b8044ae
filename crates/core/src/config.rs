//! Dashboard configuration: where progress is stored, which levels exist and
//! how items are keyed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ItemKeyStrategy, LevelChain, LevelChainDraft, LevelChainError};

/// Key the progress record is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "cyber_dashboard_progress";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("storage key cannot be empty")]
    EmptyStorageKey,
    #[error(transparent)]
    Chain(#[from] LevelChainError),
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardConfig {
    storage_key: String,
    chain: LevelChain,
    item_keys: ItemKeyStrategy,
}

/// Unvalidated configuration. Every field is optional and falls back to the
/// built-in dashboard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfigDraft {
    pub storage_key: Option<String>,
    pub levels: Option<LevelChainDraft>,
    pub item_keys: Option<ItemKeyStrategy>,
}

impl DashboardConfigDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a draft from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the JSON is malformed or has unknown fields.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the storage key is blank or the level chain is
    /// invalid.
    pub fn validate(self) -> Result<DashboardConfig, ConfigError> {
        let storage_key = match self.storage_key {
            Some(key) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(ConfigError::EmptyStorageKey);
                }
                key.to_owned()
            }
            None => DEFAULT_STORAGE_KEY.to_owned(),
        };
        let chain = match self.levels {
            Some(draft) => draft.validate()?,
            None => LevelChain::cyber_security(),
        };

        Ok(DashboardConfig {
            storage_key,
            chain,
            item_keys: self.item_keys.unwrap_or_default(),
        })
    }
}

impl DashboardConfig {
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn chain(&self) -> &LevelChain {
        &self.chain
    }

    #[must_use]
    pub fn item_keys(&self) -> ItemKeyStrategy {
        self.item_keys
    }

    #[must_use]
    pub fn with_item_keys(mut self, item_keys: ItemKeyStrategy) -> Self {
        self.item_keys = item_keys;
        self
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            chain: LevelChain::cyber_security(),
            item_keys: ItemKeyStrategy::LabelText,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_is_the_builtin_dashboard() {
        let config = DashboardConfigDraft::new().validate().unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.storage_key(), "cyber_dashboard_progress");
        assert_eq!(config.chain().len(), 4);
    }

    #[test]
    fn json_overrides_fields() {
        let json = r#"{
            "storage_key": " course_progress ",
            "item_keys": "explicit",
            "levels": [
                {"id": "basics", "name": "Basics", "unlocks": "labs"},
                {"id": "labs", "name": "Labs"}
            ]
        }"#;
        let config = DashboardConfigDraft::from_json(json)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(config.storage_key(), "course_progress");
        assert_eq!(config.item_keys(), ItemKeyStrategy::Explicit);
        assert_eq!(config.chain().first_id().as_str(), "basics");
    }

    #[test]
    fn blank_storage_key_is_rejected() {
        let draft = DashboardConfigDraft {
            storage_key: Some("  ".into()),
            ..DashboardConfigDraft::default()
        };
        assert!(matches!(draft.validate(), Err(ConfigError::EmptyStorageKey)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = DashboardConfigDraft::from_json(r#"{"threshold": 50}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_chain_surfaces_chain_error() {
        let err = DashboardConfigDraft::from_json(r#"{"levels": []}"#)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Chain(LevelChainError::Empty)));
    }
}
