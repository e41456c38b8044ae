#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod model;
pub mod unlock;

pub use config::{ConfigError, DEFAULT_STORAGE_KEY, DashboardConfig, DashboardConfigDraft};
pub use error::Error;
pub use unlock::{LevelCompletion, UNLOCK_THRESHOLD, UnlockStatus};
