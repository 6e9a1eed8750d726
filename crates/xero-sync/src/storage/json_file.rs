//! File-backed storage implementation
//!
//! Persists the whole settings map as one pretty-printed JSON object,
//! written through on every mutation. The expected write rate (a few
//! keys per admin action, a handful per sync run) makes a full rewrite
//! per mutation acceptable.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::SettingsStore;

/// Settings filename in the config directory
const SETTINGS_FILE: &str = "settings.json";

/// JSON-file implementation of [`SettingsStore`]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonFileSettingsStore {
    /// Open (or create) the store at the default config path
    /// (~/.config/xero-sync/settings.json)
    pub fn open_default() -> Result<Self> {
        let path = config::config_path(SETTINGS_FILE)
            .context("Could not determine config directory")?;
        Self::open(&path)
    }

    /// Open (or create) the store at an explicit path
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            config::load_json_file(path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            values: RwLock::new(values),
        })
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<()> {
        config::save_json_file(&self.path, values)
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap();
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let store = JsonFileSettingsStore::open(&path).unwrap();
        store.set("access_token", "abc").unwrap();
        store.set("sync_frequency", "manual").unwrap();
        drop(store);

        // Reopen and verify persistence
        let store = JsonFileSettingsStore::open(&path).unwrap();
        assert_eq!(store.get("access_token").unwrap(), Some("abc".to_string()));
        assert_eq!(
            store.get("sync_frequency").unwrap(),
            Some("manual".to_string())
        );

        store.delete("access_token").unwrap();
        let store = JsonFileSettingsStore::open(&path).unwrap();
        assert_eq!(store.get("access_token").unwrap(), None);
    }
}
