//! Shared error types for the services crate.

use thiserror::Error;

use dashboard_core::model::LevelId;

/// Errors emitted by `ProgressEngine`.
///
/// Both variants are informational: the engine state is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("complete {threshold}% of {required_level_name} to unlock {requested_name}")]
    LevelLocked {
        requested: LevelId,
        requested_name: String,
        required_level_name: String,
        threshold: u8,
    },
    #[error("unknown level {0}")]
    UnknownLevel(LevelId),
}
