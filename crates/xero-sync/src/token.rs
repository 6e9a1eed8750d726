//! Token store
//!
//! Persists the OAuth2 credential (tokens encrypted at rest, absolute
//! expiry, tenant selection) in the settings store. Decryption failures
//! are swallowed into empty fields so a corrupted credential reads as
//! "not connected" rather than an error; the failure is logged.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::crypto::TokenCipher;
use crate::storage::{SettingsStore, SettingsStoreExt};
use crate::xero::api::TokenResponse;

mod keys {
    pub const ACCESS_TOKEN: &str = "xero_access_token";
    pub const REFRESH_TOKEN: &str = "xero_refresh_token";
    pub const EXPIRES_AT: &str = "xero_token_expires";
    pub const TENANT: &str = "xero_tenant";
    pub const CONNECTED_AT: &str = "xero_connected_at";
}

/// Tenant selection, persisted as one JSON blob
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tenant {
    id: String,
    name: String,
    #[serde(rename = "type")]
    tenant_type: String,
}

/// Decrypted credential as read back from the store.
///
/// Absent or undecryptable fields are empty strings, never errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry, epoch seconds; 0 when unknown
    pub expires_at: i64,
    pub tenant_id: String,
    pub tenant_name: String,
    pub tenant_type: String,
    /// Epoch seconds of the initial code exchange; 0 when unknown
    pub connected_at: i64,
}

impl Credential {
    /// Whether any token material is present at all
    pub fn is_present(&self) -> bool {
        !self.access_token.is_empty() || !self.refresh_token.is_empty()
    }

    /// Whether the access token has passed its absolute expiry.
    /// The token is still valid through the expiry second itself.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now().timestamp()
    }
}

/// Encrypting credential store over a [`SettingsStore`]
#[derive(Clone)]
pub struct TokenStore {
    settings: Arc<dyn SettingsStore>,
    cipher: TokenCipher,
}

impl TokenStore {
    pub fn new(settings: Arc<dyn SettingsStore>, cipher: TokenCipher) -> Self {
        Self { settings, cipher }
    }

    /// Whether tokens are stored without real encryption
    pub fn is_degraded(&self) -> bool {
        self.cipher.is_degraded()
    }

    /// Persist a token response, replacing the stored credential.
    ///
    /// Expiry is stored as absolute epoch seconds (now + expires_in).
    /// When the response omits a refresh token the previous one is kept,
    /// since providers may not rotate it on refresh.
    pub fn save(&self, response: &TokenResponse) -> Result<()> {
        let encrypted_access = self.cipher.encrypt(&response.access_token)?;
        self.settings.set(keys::ACCESS_TOKEN, &encrypted_access)?;

        if let Some(refresh) = &response.refresh_token {
            let encrypted_refresh = self.cipher.encrypt(refresh)?;
            self.settings.set(keys::REFRESH_TOKEN, &encrypted_refresh)?;
        }

        let now = Utc::now().timestamp();
        let expires_at = now + response.expires_in.unwrap_or(0) as i64;
        self.settings.set(keys::EXPIRES_AT, &expires_at.to_string())?;

        if self.settings.get(keys::CONNECTED_AT)?.is_none() {
            self.settings.set(keys::CONNECTED_AT, &now.to_string())?;
        }
        Ok(())
    }

    /// Record the selected tenant after a successful connections lookup
    pub fn set_tenant(&self, id: &str, name: &str, tenant_type: &str) -> Result<()> {
        self.settings.set_json(
            keys::TENANT,
            &Tenant {
                id: id.to_string(),
                name: name.to_string(),
                tenant_type: tenant_type.to_string(),
            },
        )
    }

    /// Read the credential back, decrypting token fields.
    ///
    /// Returns empty strings for anything absent or undecryptable.
    pub fn load(&self) -> Result<Credential> {
        let access_token = self.read_token(keys::ACCESS_TOKEN)?;
        let refresh_token = self.read_token(keys::REFRESH_TOKEN)?;

        let expires_at = self
            .settings
            .get(keys::EXPIRES_AT)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let connected_at = self
            .settings
            .get(keys::CONNECTED_AT)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let tenant: Tenant = self.settings.get_json(keys::TENANT)?.unwrap_or_default();

        Ok(Credential {
            access_token,
            refresh_token,
            expires_at,
            tenant_id: tenant.id,
            tenant_name: tenant.name,
            tenant_type: tenant.tenant_type,
            connected_at,
        })
    }

    /// Delete tokens, expiry, and tenant selection
    pub fn clear(&self) -> Result<()> {
        self.settings.delete(keys::ACCESS_TOKEN)?;
        self.settings.delete(keys::REFRESH_TOKEN)?;
        self.settings.delete(keys::EXPIRES_AT)?;
        self.settings.delete(keys::TENANT)?;
        self.settings.delete(keys::CONNECTED_AT)?;
        Ok(())
    }

    fn read_token(&self, key: &str) -> Result<String> {
        match self.settings.get(key)? {
            Some(stored) => match self.cipher.decrypt(&stored) {
                Ok(plain) => Ok(plain),
                Err(e) => {
                    log::warn!("failed to decrypt {}: {}", key, e);
                    Ok(String::new())
                }
            },
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySettingsStore;

    fn make_store() -> TokenStore {
        TokenStore::new(
            Arc::new(InMemorySettingsStore::new()),
            TokenCipher::keyed("test-pepper"),
        )
    }

    fn token_response(access: &str, refresh: Option<&str>, expires_in: u64) -> TokenResponse {
        TokenResponse {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in: Some(expires_in),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = make_store();
        store
            .save(&token_response("tok1", Some("ref1"), 1800))
            .unwrap();

        let cred = store.load().unwrap();
        assert_eq!(cred.access_token, "tok1");
        assert_eq!(cred.refresh_token, "ref1");
        assert!(cred.is_present());
        assert!(!cred.is_expired());

        let now = Utc::now().timestamp();
        assert!((cred.expires_at - (now + 1800)).abs() <= 1);
        assert!(cred.connected_at > 0);
    }

    #[test]
    fn test_missing_refresh_keeps_previous() {
        let store = make_store();
        store
            .save(&token_response("tok1", Some("ref1"), 1800))
            .unwrap();
        store.save(&token_response("tok2", None, 1800)).unwrap();

        let cred = store.load().unwrap();
        assert_eq!(cred.access_token, "tok2");
        assert_eq!(cred.refresh_token, "ref1");
    }

    #[test]
    fn test_empty_store_loads_empty_credential() {
        let store = make_store();
        let cred = store.load().unwrap();
        assert_eq!(cred, Credential::default());
        assert!(!cred.is_present());
        assert!(cred.is_expired());
    }

    #[test]
    fn test_undecryptable_token_reads_empty() {
        let settings = Arc::new(InMemorySettingsStore::new());
        settings.set("xero_access_token", "garbage!!").unwrap();
        let store = TokenStore::new(settings, TokenCipher::keyed("test-pepper"));

        let cred = store.load().unwrap();
        assert_eq!(cred.access_token, "");
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = make_store();
        store
            .save(&token_response("tok1", Some("ref1"), 1800))
            .unwrap();
        store.set_tenant("t-id", "Demo Org", "ORGANISATION").unwrap();
        store.clear().unwrap();

        let cred = store.load().unwrap();
        assert!(!cred.is_present());
        assert_eq!(cred.tenant_id, "");
        assert_eq!(cred.expires_at, 0);
    }

    #[test]
    fn test_tenant_roundtrip_as_json_blob() {
        let settings = Arc::new(InMemorySettingsStore::new());
        let store = TokenStore::new(settings.clone(), TokenCipher::keyed("test-pepper"));
        store.set_tenant("t-id", "Demo Org", "ORGANISATION").unwrap();

        let cred = store.load().unwrap();
        assert_eq!(cred.tenant_id, "t-id");
        assert_eq!(cred.tenant_name, "Demo Org");
        assert_eq!(cred.tenant_type, "ORGANISATION");

        // Stored under a single key as JSON
        let raw = settings.get("xero_tenant").unwrap().unwrap();
        assert!(raw.contains("\"Demo Org\""));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now().timestamp();
        let past = Credential {
            expires_at: now - 1,
            ..Credential::default()
        };
        assert!(past.is_expired());

        // Valid through the expiry second itself
        let boundary = Credential {
            expires_at: now,
            ..Credential::default()
        };
        assert!(!boundary.is_expired());
    }
}
