//! Destination CRM integration
//!
//! This module provides:
//! - Record types for the CRM's customers and transactions endpoints
//! - A REST client implementing the [`CrmApi`] trait
//! - Pure mapping functions from source entities to CRM records

mod client;
mod map;

pub use client::CrmClient;
pub use map::{map_contact, map_invoice};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Customer record in the CRM's field schema.
///
/// Optional source fields map to empty strings, never nulls, so repeated
/// writes of identical input are idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmCustomer {
    /// CRM-assigned id; absent on create payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub lname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub tel: String,
    #[serde(default)]
    pub addr1: String,
    #[serde(default)]
    pub addr2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
    /// Source contact id; the external-id key for idempotent upsert
    #[serde(default)]
    pub xero_contact_id: String,
}

/// Transaction record in the CRM's field schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmTransaction {
    /// CRM-assigned id; absent on create payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(rename = "ref", default)]
    pub reference: String,
    /// Source invoice id; the external-id key for idempotent upsert
    #[serde(default)]
    pub xero_invoice_id: String,
}

/// Trait for the destination CRM's REST surface.
///
/// Abstracting the client lets the sync engine run against an in-memory
/// fake in tests.
pub trait CrmApi: Send + Sync {
    /// List every customer record
    fn list_customers(&self) -> Result<Vec<CrmCustomer>>;

    /// Create a customer, returning the record with its assigned id
    fn create_customer(&self, customer: &CrmCustomer) -> Result<CrmCustomer>;

    /// Overwrite an existing customer
    fn update_customer(&self, id: i64, customer: &CrmCustomer) -> Result<CrmCustomer>;

    /// List every transaction record
    fn list_transactions(&self) -> Result<Vec<CrmTransaction>>;

    /// Create a transaction, returning the record with its assigned id
    fn create_transaction(&self, transaction: &CrmTransaction) -> Result<CrmTransaction>;

    /// Overwrite an existing transaction
    fn update_transaction(&self, id: i64, transaction: &CrmTransaction)
    -> Result<CrmTransaction>;
}
