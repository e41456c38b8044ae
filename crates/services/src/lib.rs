#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod view;

pub use engine::ProgressEngine;
pub use error::EngineError;
pub use view::{LevelProgressView, NextLevel, ResetResult, SwitchResult, UnlockNotice, UpdateResult};
