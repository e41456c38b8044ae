#![forbid(unsafe_code)]

pub mod progress_store;
pub mod repository;
#[cfg(feature = "web")]
pub mod web;

pub use progress_store::{LoadOutcome, ProgressDocument, ProgressStore};
pub use repository::{InMemoryStore, KeyValueStore, StorageError};
