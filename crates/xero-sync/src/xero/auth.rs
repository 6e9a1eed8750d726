//! Xero OAuth2 authentication
//!
//! Implements the authorization-code flow against Xero's identity
//! service. The admin UI owns the browser redirect; this module builds
//! the authorization URL, verifies the callback state, exchanges and
//! refreshes tokens, and tracks connection status.
//! Uses synchronous HTTP (ureq) with an explicit global timeout.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::sync::Arc;
use std::time::Duration;

use super::api::{Connection, TokenErrorResponse, TokenResponse};
use crate::config::AppCredentials;
use crate::error::{Result, SyncError};
use crate::storage::SettingsStore;
use crate::token::TokenStore;

/// Settings key holding the single pending OAuth state.
///
/// Exactly one outstanding authorization request is supported at a
/// time; starting a new one overwrites the previous pending state.
const PENDING_STATE_KEY: &str = "xero_oauth_state";

/// Purpose tag prefixed to the random state payload
const STATE_TAG: &str = "xero_connect";

/// Connection status as reported to the caller
#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub tenant_id: String,
    pub tenant_name: String,
    /// Absolute access-token expiry, epoch seconds; 0 when unknown
    pub expires_at: i64,
}

/// OAuth2 flow manager for the Xero connection
pub struct XeroAuth {
    credentials: AppCredentials,
    redirect_uri: String,
    settings: Arc<dyn SettingsStore>,
    tokens: TokenStore,
    agent: ureq::Agent,
}

impl XeroAuth {
    /// Xero identity endpoints
    const AUTH_URL: &'static str = "https://login.xero.com/identity/connect/authorize";
    const TOKEN_URL: &'static str = "https://identity.xero.com/connect/token";
    const CONNECTIONS_URL: &'static str = "https://api.xero.com/connections";

    /// Requested scopes; offline_access is required for refresh tokens
    const SCOPES: &'static str = "accounting.contacts accounting.transactions offline_access";

    pub fn new(
        credentials: AppCredentials,
        redirect_uri: String,
        settings: Arc<dyn SettingsStore>,
        tokens: TokenStore,
    ) -> Self {
        // Non-2xx answers carry the provider's error body, so status
        // errors are handled manually rather than through ureq.
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            credentials,
            redirect_uri,
            settings,
            tokens,
            agent,
        }
    }

    /// Build the provider authorization URL and persist a fresh
    /// single-use state token as the sole expected callback value.
    pub fn authorization_url(&self) -> Result<String> {
        self.credentials.validate()?;

        let state = generate_state();
        self.settings.set(PENDING_STATE_KEY, &state)?;

        Ok(format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            Self::AUTH_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(Self::SCOPES),
            urlencoding::encode(&state),
        ))
    }

    /// Validate the OAuth callback and exchange the code for tokens.
    ///
    /// The state comparison happens before any network call; a mismatch
    /// never reaches the token endpoint. The pending state is cleared on
    /// a match, enforcing single use.
    pub fn handle_callback(&self, code: &str, state: &str) -> Result<()> {
        if code.is_empty() || state.is_empty() {
            return Err(SyncError::InvalidCallback(
                "missing code or state parameter".to_string(),
            ));
        }

        match self.settings.get(PENDING_STATE_KEY)? {
            Some(pending) if pending == state => {
                self.settings.delete(PENDING_STATE_KEY)?;
            }
            _ => return Err(SyncError::CsrfMismatch),
        }

        self.credentials.validate()?;

        let token = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.redirect_uri),
            ])
            .map_err(SyncError::TokenExchangeFailed)?;
        self.tokens.save(&token)?;

        // Best-effort tenant lookup; the connection works without it
        // until an accounting call needs the tenant header.
        match self.fetch_first_connection() {
            Ok(Some(conn)) => {
                self.tokens.set_tenant(
                    &conn.tenant_id,
                    conn.tenant_name.as_deref().unwrap_or(""),
                    conn.tenant_type.as_deref().unwrap_or(""),
                )?;
            }
            Ok(None) => log::warn!("no authorized Xero organisations returned"),
            Err(e) => log::warn!("failed to fetch Xero connections: {}", e),
        }

        log::info!("Xero connection established");
        Ok(())
    }

    /// Refresh the access token using the stored refresh token.
    ///
    /// The provider may or may not rotate the refresh token; when the
    /// response omits one the stored value is kept.
    pub fn refresh(&self) -> Result<()> {
        let credential = self.tokens.load()?;
        if credential.refresh_token.is_empty() {
            return Err(SyncError::RefreshFailed(
                "no refresh token stored".to_string(),
            ));
        }

        let token = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &credential.refresh_token),
            ])
            .map_err(SyncError::RefreshFailed)?;
        self.tokens.save(&token)?;

        log::debug!("Xero access token refreshed");
        Ok(())
    }

    /// Report connection status.
    ///
    /// With `allow_refresh`, an expired access token triggers a
    /// transparent refresh before disconnection is reported; this makes
    /// the read-with-write-side-effect explicit in the signature.
    pub fn connection_status(&self, allow_refresh: bool) -> Result<ConnectionStatus> {
        let mut credential = self.tokens.load()?;
        if !credential.is_present() {
            return Ok(ConnectionStatus::default());
        }

        if credential.is_expired() {
            if !allow_refresh {
                return Ok(ConnectionStatus {
                    connected: false,
                    tenant_id: credential.tenant_id,
                    tenant_name: credential.tenant_name,
                    expires_at: credential.expires_at,
                });
            }
            if let Err(e) = self.refresh() {
                log::warn!("token refresh failed, reporting disconnected: {}", e);
                return Ok(ConnectionStatus::default());
            }
            credential = self.tokens.load()?;
        }

        Ok(ConnectionStatus {
            connected: true,
            tenant_id: credential.tenant_id,
            tenant_name: credential.tenant_name,
            expires_at: credential.expires_at,
        })
    }

    /// Drop the stored credential and any pending authorization state
    pub fn disconnect(&self) -> Result<()> {
        self.tokens.clear()?;
        self.settings.delete(PENDING_STATE_KEY)?;
        log::info!("Xero connection removed");
        Ok(())
    }

    /// POST to the token endpoint with HTTP Basic client authentication
    fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> std::result::Result<TokenResponse, String> {
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        let mut response = self
            .agent
            .post(Self::TOKEN_URL)
            .header("Authorization", &format!("Basic {}", basic))
            .send_form(form.iter().copied())
            .map_err(|e| format!("token endpoint unreachable: {}", e))?;

        let success = response.status().is_success();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| format!("failed to read token response: {}", e))?;

        parse_token_response(success, &body)
    }

    /// Fetch the authorized organisations and return the first one
    fn fetch_first_connection(&self) -> Result<Option<Connection>> {
        let credential = self.tokens.load()?;

        let mut response = self
            .agent
            .get(Self::CONNECTIONS_URL)
            .header("Authorization", &format!("Bearer {}", credential.access_token))
            .call()?;

        if !response.status().is_success() {
            return Err(SyncError::Upstream(format!(
                "connections endpoint returned status {}",
                response.status().as_u16()
            )));
        }

        let connections: Vec<Connection> = response
            .body_mut()
            .read_json()
            .map_err(|e| SyncError::Upstream(format!("unparseable connections response: {}", e)))?;

        Ok(connections.into_iter().next())
    }
}

/// Generate a single-use state value: purpose tag plus random payload
fn generate_state() -> String {
    let payload: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("{}:{}", STATE_TAG, payload)
}

/// Interpret a token endpoint response body.
///
/// A 2xx without an `access_token`, or any non-2xx, is an error carrying
/// the provider's `error`/`error_description` text when present.
fn parse_token_response(success: bool, body: &str) -> std::result::Result<TokenResponse, String> {
    if success {
        match serde_json::from_str::<TokenResponse>(body) {
            Ok(token) if !token.access_token.is_empty() => Ok(token),
            Ok(_) => Err(format!("no access_token in response: {}", body)),
            Err(_) => Err(format!("unparseable token response: {}", body)),
        }
    } else {
        let parsed: TokenErrorResponse = serde_json::from_str(body).unwrap_or_default();
        match (parsed.error, parsed.error_description) {
            (Some(error), Some(description)) => Err(format!("{}: {}", error, description)),
            (Some(error), None) => Err(error),
            _ => Err(format!("token endpoint error: {}", body)),
        }
    }
}
