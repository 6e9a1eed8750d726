//! Credential and destination configuration
//!
//! The Xero app credentials and the destination CRM settings both live in
//! the settings store; environment variables act as a fallback for the
//! app credentials so a deployment can avoid persisting them.

use crate::error::{Result, SyncError};
use crate::storage::SettingsStore;

mod keys {
    pub const CLIENT_ID: &str = "xero_client_id";
    pub const CLIENT_SECRET: &str = "xero_client_secret";
    pub const CRM_API_KEY: &str = "crm_api_key";
    pub const CRM_API_SECRET: &str = "crm_api_secret";
    pub const CRM_ENDPOINT: &str = "crm_endpoint";
}

/// OAuth2 app credentials for the source system
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl AppCredentials {
    /// Load credentials from the settings store, falling back to the
    /// XERO_CLIENT_ID / XERO_CLIENT_SECRET environment variables.
    pub fn load(settings: &dyn SettingsStore) -> Result<Self> {
        let client_id = match settings.get(keys::CLIENT_ID)? {
            Some(v) if !v.is_empty() => v,
            _ => std::env::var("XERO_CLIENT_ID").unwrap_or_default(),
        };
        let client_secret = match settings.get(keys::CLIENT_SECRET)? {
            Some(v) if !v.is_empty() => v,
            _ => std::env::var("XERO_CLIENT_SECRET").unwrap_or_default(),
        };

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Persist credentials to the settings store
    pub fn save(settings: &dyn SettingsStore, client_id: &str, client_secret: &str) -> Result<()> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(SyncError::Configuration(
                "both client id and client secret are required".to_string(),
            ));
        }
        settings.set(keys::CLIENT_ID, client_id)?;
        settings.set(keys::CLIENT_SECRET, client_secret)?;
        Ok(())
    }

    /// Fail with a [`SyncError::Configuration`] naming every missing field
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.client_id.is_empty() {
            missing.push("client id");
        }
        if self.client_secret.is_empty() {
            missing.push("client secret");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Configuration(format!(
                "Xero {} not configured",
                missing.join(" and ")
            )))
        }
    }
}

/// Destination CRM API settings
#[derive(Debug, Clone, Default)]
pub struct CrmConfig {
    pub api_key: String,
    /// Optional; only some deployments require it
    pub api_secret: String,
    pub endpoint: String,
}

impl CrmConfig {
    /// Load the destination config from the settings store
    pub fn load(settings: &dyn SettingsStore) -> Result<Self> {
        Ok(Self {
            api_key: settings.get(keys::CRM_API_KEY)?.unwrap_or_default(),
            api_secret: settings.get(keys::CRM_API_SECRET)?.unwrap_or_default(),
            endpoint: settings.get(keys::CRM_ENDPOINT)?.unwrap_or_default(),
        })
    }

    /// Persist the destination config. Key and endpoint are required;
    /// the secret may be empty.
    pub fn save(
        settings: &dyn SettingsStore,
        api_key: &str,
        api_secret: &str,
        endpoint: &str,
    ) -> Result<()> {
        if api_key.is_empty() || endpoint.is_empty() {
            return Err(SyncError::Configuration(
                "CRM API key and endpoint URL are required".to_string(),
            ));
        }
        settings.set(keys::CRM_API_KEY, api_key)?;
        settings.set(keys::CRM_API_SECRET, api_secret)?;
        settings.set(keys::CRM_ENDPOINT, endpoint.trim_end_matches('/'))?;
        Ok(())
    }

    /// Remove the destination config
    pub fn clear(settings: &dyn SettingsStore) -> Result<()> {
        settings.delete(keys::CRM_API_KEY)?;
        settings.delete(keys::CRM_API_SECRET)?;
        settings.delete(keys::CRM_ENDPOINT)?;
        Ok(())
    }

    /// Fail with a [`SyncError::Configuration`] naming every missing field
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.api_key.is_empty() {
            missing.push("CRM API key");
        }
        if self.endpoint.is_empty() {
            missing.push("CRM endpoint URL");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Configuration(format!(
                "{} not configured",
                missing.join(" and ")
            )))
        }
    }
}
