//! `window.localStorage` adapter for browser builds.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};

use crate::repository::{KeyValueStore, StorageError};

/// Browser `localStorage` for the current origin.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    /// Open the current window's `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` outside a window context or when
    /// the browser denies storage access (e.g. disabled cookies).
    pub fn from_window() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_owned()))?;
        let storage = window
            .local_storage()
            .map_err(|err| StorageError::Unavailable(describe(&err)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_owned()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|err| StorageError::Unavailable(describe(&err)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| match err.dyn_ref::<DomException>() {
                Some(exc) if exc.name() == "QuotaExceededError" => StorageError::QuotaExceeded {
                    key: key.to_owned(),
                },
                Some(exc) if exc.name() == "SecurityError" => StorageError::Unavailable(exc.message()),
                _ => StorageError::Backend(describe(&err)),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|err| StorageError::Backend(describe(&err)))
    }
}

fn describe(err: &JsValue) -> String {
    match err.dyn_ref::<DomException>() {
        Some(exc) => format!("{}: {}", exc.name(), exc.message()),
        None => err.as_string().unwrap_or_else(|| format!("{err:?}")),
    }
}
