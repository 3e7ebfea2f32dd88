//! Browser adapters (wasm32 only).
//!
//! Browser handles are not `Send`, so every call looks `window` up again
//! instead of holding on to it.

use wasm_bindgen::JsValue;

use crate::effects::{Navigator, Notifier};
use crate::storage::{KeyValueStore, StorageError};

fn window() -> Result<web_sys::Window, StorageError> {
    web_sys::window().ok_or_else(|| StorageError::Unavailable("no window object".into()))
}

fn js_error(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// `window.localStorage`, the dashboard's own session storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        window()?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_error(e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".into()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Io(js_error(e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Io(js_error(e)))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Io(js_error(e)))
    }
}

/// Hard navigation through `window.location.href`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, route: &str) {
        let result = window()
            .map_err(|e| e.to_string())
            .and_then(|w| w.location().set_href(route).map_err(js_error));
        if let Err(err) = result {
            tracing::error!(route, "navigation failed: {err}");
        }
    }
}

/// Writes notifications to the browser console.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn error(&self, message: &str) {
        web_sys::console::error_1(&JsValue::from_str(message));
    }

    fn success(&self, message: &str) {
        web_sys::console::log_1(&JsValue::from_str(message));
    }
}
