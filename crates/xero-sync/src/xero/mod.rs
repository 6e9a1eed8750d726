//! Xero API integration
//!
//! This module provides:
//! - OAuth2 authorization-code flow and token refresh
//! - Accounting API client for fetching contacts and invoices
//! - Wire types for token, connection, and accounting responses

mod auth;
mod client;

pub use auth::{ConnectionStatus, XeroAuth};
pub use client::XeroClient;

/// Xero API response types
pub mod api {
    use serde::Deserialize;

    /// Successful response from the token endpoint
    #[derive(Debug, Clone, Deserialize)]
    pub struct TokenResponse {
        #[serde(default)]
        pub access_token: String,
        pub refresh_token: Option<String>,
        pub expires_in: Option<u64>,
    }

    /// Error response from the token endpoint
    #[derive(Debug, Default, Deserialize)]
    pub struct TokenErrorResponse {
        pub error: Option<String>,
        pub error_description: Option<String>,
    }

    /// Authorized tenant from GET /connections
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Connection {
        pub tenant_id: String,
        pub tenant_name: Option<String>,
        pub tenant_type: Option<String>,
    }

    /// Envelope for GET /Contacts
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct ContactsResponse {
        #[serde(default)]
        pub contacts: Vec<Contact>,
    }

    /// Source contact entity
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Contact {
        #[serde(rename = "ContactID", default)]
        pub contact_id: String,
        pub name: Option<String>,
        pub email_address: Option<String>,
        pub phones: Option<Vec<Phone>>,
        pub addresses: Option<Vec<Address>>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Phone {
        pub phone_type: Option<String>,
        pub phone_number: Option<String>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Address {
        pub address_type: Option<String>,
        pub address_line1: Option<String>,
        pub address_line2: Option<String>,
        pub city: Option<String>,
        pub region: Option<String>,
        pub postal_code: Option<String>,
        pub country: Option<String>,
    }

    /// Envelope for GET /Invoices
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct InvoicesResponse {
        #[serde(default)]
        pub invoices: Vec<Invoice>,
    }

    /// Source invoice entity
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Invoice {
        #[serde(rename = "InvoiceID", default)]
        pub invoice_id: String,
        pub invoice_number: Option<String>,
        pub total: Option<f64>,
        pub currency_code: Option<String>,
        pub date: Option<String>,
        pub due_date: Option<String>,
        pub status: Option<String>,
        pub line_items: Option<Vec<LineItem>>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct LineItem {
        pub description: Option<String>,
    }
}
