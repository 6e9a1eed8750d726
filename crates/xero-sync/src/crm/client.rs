//! CRM REST client
//!
//! Talks to the destination CRM's customers and transactions endpoints
//! with HTTP Basic authentication (API key : API secret).
//! Uses synchronous HTTP (ureq) with an explicit global timeout.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{CrmApi, CrmCustomer, CrmTransaction};
use crate::config::CrmConfig;
use crate::error::{Result, SyncError};

/// REST client for the destination CRM
pub struct CrmClient {
    endpoint: String,
    authorization: String,
    agent: ureq::Agent,
}

impl CrmClient {
    pub fn new(config: &CrmConfig) -> Result<Self> {
        config.validate()?;

        let basic = BASE64.encode(format!("{}:{}", config.api_key, config.api_secret));
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(10)))
            .build()
            .new_agent();

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", basic),
            agent,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let mut response = self
            .agent
            .get(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| SyncError::Upstream(format!("GET {} failed: {}", path, e)))?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| SyncError::Upstream(format!("unparseable response from {}: {}", path, e)))
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let mut response = self
            .agent
            .post(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .send_json(body)
            .map_err(|e| SyncError::Upstream(format!("POST {} failed: {}", path, e)))?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| SyncError::Upstream(format!("unparseable response from {}: {}", path, e)))
    }
}

impl CrmApi for CrmClient {
    fn list_customers(&self) -> Result<Vec<CrmCustomer>> {
        self.get("/customers")
    }

    fn create_customer(&self, customer: &CrmCustomer) -> Result<CrmCustomer> {
        self.post("/customers", customer)
    }

    fn update_customer(&self, id: i64, customer: &CrmCustomer) -> Result<CrmCustomer> {
        self.post(&format!("/customers/{}", id), customer)
    }

    fn list_transactions(&self) -> Result<Vec<CrmTransaction>> {
        self.get("/transactions")
    }

    fn create_transaction(&self, transaction: &CrmTransaction) -> Result<CrmTransaction> {
        self.post("/transactions", transaction)
    }

    fn update_transaction(
        &self,
        id: i64,
        transaction: &CrmTransaction,
    ) -> Result<CrmTransaction> {
        self.post(&format!("/transactions/{}", id), transaction)
    }
}
