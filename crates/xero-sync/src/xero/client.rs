//! Xero accounting API client
//!
//! Fetches contacts and invoices for the authenticated tenant.
//! Uses synchronous HTTP (ureq) with an explicit global timeout.

use chrono::NaiveDate;
use std::time::Duration;

use super::api::{Contact, ContactsResponse, Invoice, InvoicesResponse};
use crate::error::{Result, SyncError};
use crate::sync::AccountingSource;
use crate::token::TokenStore;

/// Accounting API client
pub struct XeroClient {
    tokens: TokenStore,
}

impl XeroClient {
    /// Accounting API base URL
    const BASE_URL: &'static str = "https://api.xero.com/api.xro/2.0";

    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }

    fn agent() -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build()
            .new_agent()
    }

    /// Access token and tenant id for request headers
    fn auth_headers(&self) -> Result<(String, String)> {
        let credential = self.tokens.load()?;
        if credential.access_token.is_empty() {
            return Err(SyncError::Configuration(
                "not connected to Xero".to_string(),
            ));
        }
        if credential.tenant_id.is_empty() {
            return Err(SyncError::Configuration(
                "no Xero organisation selected".to_string(),
            ));
        }
        Ok((credential.access_token, credential.tenant_id))
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let (access_token, tenant_id) = self.auth_headers()?;

        let mut response = Self::agent()
            .get(url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .header("Xero-tenant-id", &tenant_id)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| SyncError::Upstream(format!("failed to fetch {}: {}", what, e)))?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| SyncError::Upstream(format!("unparseable {} response: {}", what, e)))
    }

    /// Fetch all contacts for the tenant
    pub fn get_contacts(&self) -> Result<Vec<Contact>> {
        let url = format!("{}/Contacts", Self::BASE_URL);
        let response: ContactsResponse = self.get_json(&url, "contacts")?;
        Ok(response.contacts)
    }

    /// Fetch invoices issued within the given date range (inclusive)
    pub fn get_invoices(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Invoice>> {
        let url = format!(
            "{}/Invoices?where={}&where={}",
            Self::BASE_URL,
            urlencoding::encode(&format!("Date>={}", from.format("%Y-%m-%d"))),
            urlencoding::encode(&format!("Date<={}", to.format("%Y-%m-%d"))),
        );
        let response: InvoicesResponse = self.get_json(&url, "invoices")?;
        Ok(response.invoices)
    }
}

impl AccountingSource for XeroClient {
    fn fetch_contacts(&self) -> Result<Vec<Contact>> {
        self.get_contacts()
    }

    fn fetch_invoices(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Invoice>> {
        self.get_invoices(from, to)
    }
}
