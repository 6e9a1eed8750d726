//! xero-sync - Business logic for one-way Xero to Jetpack CRM sync
//!
//! This crate provides host-independent sync functionality including:
//! - OAuth2 authorization-code flow with token refresh
//! - Encrypted-at-rest token storage with an explicit degraded mode
//! - Xero accounting API client (contacts, invoices)
//! - Jetpack CRM client and entity mapping
//! - Idempotent sync engine with pollable progress
//! - A service facade wiring the pieces together
//!
//! This crate has zero UI dependencies; hosts embed [`SyncService`] and
//! surface its operations however they like.

pub mod config;
pub mod crm;
pub mod crypto;
pub mod error;
pub mod service;
pub mod storage;
pub mod sync;
pub mod token;
pub mod xero;

pub use config::{AppCredentials, CrmConfig};
pub use crm::{CrmApi, CrmClient, CrmCustomer, CrmTransaction, map_contact, map_invoice};
pub use crypto::TokenCipher;
pub use error::{Result, SyncError};
pub use service::{SyncService, SyncStats};
pub use storage::{InMemorySettingsStore, JsonFileSettingsStore, SettingsStore, SettingsStoreExt};
pub use sync::{
    AccountingSource, ProgressTracker, SyncOutcome, SyncProgress, SyncStatus, run_sync,
};
pub use token::{Credential, TokenStore};
pub use xero::{ConnectionStatus, XeroAuth, XeroClient};
