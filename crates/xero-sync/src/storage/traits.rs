//! Storage trait definitions

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Flat key-value store for plugin settings and sync state.
///
/// Values are scalar strings or small JSON blobs; there are no schema
/// migrations. Implementations must be safe to share across threads
/// because the background sync run and the polling caller touch the
/// same store.
pub trait SettingsStore: Send + Sync {
    /// Get a value by key, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, overwriting any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    fn delete(&self, key: &str) -> Result<()>;
}

/// JSON helpers shared by all store implementations
pub trait SettingsStoreExt: SettingsStore {
    /// Get and deserialize a JSON blob, `None` when absent
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a JSON blob
    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, &serde_json::to_string(value)?)
    }
}

impl<S: SettingsStore + ?Sized> SettingsStoreExt for S {}
