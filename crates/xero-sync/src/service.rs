//! Service facade
//!
//! [`SyncService`] ties the pieces together: settings storage, the
//! encrypted token store, the OAuth flow, and the background sync run.
//! Embedders construct one service and call its methods; everything
//! else in the crate hangs off the dependencies injected here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::thread;

use crate::config::{AppCredentials, CrmConfig};
use crate::crm::{CrmApi, CrmClient};
use crate::crypto::TokenCipher;
use crate::error::{Result, SyncError};
use crate::storage::{JsonFileSettingsStore, SettingsStore};
use crate::sync::engine::keys as counter_keys;
use crate::sync::{ProgressTracker, RunGuard, SyncProgress, SyncStatus, run_sync};
use crate::token::TokenStore;
use crate::xero::{ConnectionStatus, XeroAuth, XeroClient};

/// Settings key for the configured sync cadence
const SYNC_FREQUENCY_KEY: &str = "xero_sync_frequency";

/// Accepted sync cadences; the host owns actual scheduling
const SYNC_FREQUENCIES: [&str; 3] = ["manual", "hourly", "daily"];

/// Lifetime totals reported alongside the connection status
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    pub synced_contacts: u64,
    pub synced_invoices: u64,
    pub last_sync: Option<DateTime<Utc>>,
    /// Configured cadence; "manual" when never set
    pub frequency: String,
}

pub struct SyncService {
    settings: Arc<dyn SettingsStore>,
    tokens: TokenStore,
    progress: Arc<ProgressTracker>,
    redirect_uri: String,
}

impl SyncService {
    /// Build a service over the given settings store.
    ///
    /// When no pepper is available the token store runs in degraded
    /// mode and tokens are stored without encryption; this is loud by
    /// construction rather than a silent fallback.
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        pepper: Option<&str>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        let cipher = match pepper {
            Some(pepper) if !pepper.is_empty() => TokenCipher::keyed(pepper),
            _ => {
                log::warn!("no encryption pepper configured, storing tokens unencrypted");
                TokenCipher::degraded()
            }
        };
        let tokens = TokenStore::new(settings.clone(), cipher);

        Self {
            settings,
            tokens,
            progress: Arc::new(ProgressTracker::new()),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Convenience constructor over the default on-disk settings file
    pub fn open_default(pepper: Option<&str>, redirect_uri: impl Into<String>) -> Result<Self> {
        let settings = JsonFileSettingsStore::open_default()?;
        Ok(Self::new(Arc::new(settings), pepper, redirect_uri))
    }

    fn auth(&self) -> Result<XeroAuth> {
        let credentials = AppCredentials::load(self.settings.as_ref())?;
        Ok(XeroAuth::new(
            credentials,
            self.redirect_uri.clone(),
            self.settings.clone(),
            self.tokens.clone(),
        ))
    }

    /// Persist the OAuth app credentials for the accounting source
    pub fn save_source_credentials(&self, client_id: &str, client_secret: &str) -> Result<()> {
        AppCredentials::save(self.settings.as_ref(), client_id, client_secret)
    }

    /// Persist the sync cadence setting ("manual", "hourly", or "daily").
    ///
    /// Scheduling itself is the host's concern; this only stores and
    /// validates the choice.
    pub fn save_sync_settings(&self, frequency: &str) -> Result<()> {
        if !SYNC_FREQUENCIES.contains(&frequency) {
            return Err(SyncError::Configuration(format!(
                "invalid sync frequency: {}",
                frequency
            )));
        }
        self.settings.set(SYNC_FREQUENCY_KEY, frequency)?;
        Ok(())
    }

    /// Persist the destination CRM configuration
    pub fn save_destination_config(
        &self,
        api_key: &str,
        api_secret: &str,
        endpoint: &str,
    ) -> Result<()> {
        CrmConfig::save(self.settings.as_ref(), api_key, api_secret, endpoint)
    }

    /// Check the destination CRM is reachable with the stored
    /// configuration by listing customers
    pub fn verify_destination(&self) -> Result<()> {
        let config = CrmConfig::load(self.settings.as_ref())?;
        let client = CrmClient::new(&config)?;
        client.list_customers()?;
        Ok(())
    }

    /// Build the provider authorization URL to redirect the user to
    pub fn authorization_url(&self) -> Result<String> {
        self.auth()?.authorization_url()
    }

    /// Complete the OAuth callback with the returned code and state
    pub fn handle_callback(&self, code: &str, state: &str) -> Result<()> {
        self.auth()?.handle_callback(code, state)
    }

    /// Report the current connection, optionally refreshing an expired
    /// token first
    pub fn connection_status(&self, allow_refresh: bool) -> Result<ConnectionStatus> {
        self.auth()?.connection_status(allow_refresh)
    }

    /// Drop the stored connection
    pub fn disconnect(&self) -> Result<()> {
        self.auth()?.disconnect()
    }

    /// Start a sync run on a background thread.
    ///
    /// Preconditions are checked before any progress state changes, so
    /// a rejected start leaves the previous run's snapshot intact.
    /// Returns [`SyncError::AlreadyRunning`] if a run is in flight.
    pub fn start_sync(&self) -> Result<()> {
        let credential = self.tokens.load()?;
        if !credential.is_present() {
            return Err(SyncError::Configuration(
                "not connected to Xero".to_string(),
            ));
        }
        if credential.is_expired() {
            self.auth()?.refresh()?;
        }
        let crm_config = CrmConfig::load(self.settings.as_ref())?;
        crm_config.validate()?;

        let guard = self.begin_run()?;

        let source = XeroClient::new(self.tokens.clone());
        let crm = CrmClient::new(&crm_config)?;
        let settings = self.settings.clone();
        let progress = self.progress.clone();

        thread::spawn(move || {
            let _guard = guard;
            if let Err(e) = run_sync(&source, &crm, settings.as_ref(), &progress) {
                log::error!("sync run failed: {}", e);
                progress.update(SyncStatus::Error, &e.to_string(), 0);
            }
        });

        Ok(())
    }

    /// Claim the run guard and re-initialize the snapshot, so a poll
    /// arriving right after a successful start already sees the new run
    /// rather than the previous terminal record
    fn begin_run(&self) -> Result<RunGuard> {
        let guard = self.progress.try_begin()?;
        self.progress.reset();
        Ok(guard)
    }

    /// Snapshot of the current (or most recent) sync run, for polling
    pub fn sync_progress(&self) -> SyncProgress {
        self.progress.get()
    }

    pub fn is_sync_running(&self) -> bool {
        self.progress.is_running()
    }

    /// Lifetime sync totals
    pub fn stats(&self) -> Result<SyncStats> {
        let read_count = |key: &str| -> Result<u64> {
            Ok(self
                .settings
                .get(key)?
                .and_then(|v| v.parse().ok())
                .unwrap_or(0))
        };

        Ok(SyncStats {
            synced_contacts: read_count(counter_keys::SYNCED_CONTACTS_COUNT)?,
            synced_invoices: read_count(counter_keys::SYNCED_INVOICES_COUNT)?,
            last_sync: self
                .settings
                .get(counter_keys::LAST_SYNC)?
                .and_then(|v| v.parse::<i64>().ok())
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            frequency: self
                .settings
                .get(SYNC_FREQUENCY_KEY)?
                .unwrap_or_else(|| "manual".to_string()),
        })
    }
}
