//! Error taxonomy for the sync core
//!
//! Every caller-facing operation returns one of these variants so the
//! admin surface can branch on the failure class instead of string
//! matching.

/// Errors surfaced by auth, sync, and service operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A required credential or config field is missing. Raised before
    /// any network call is attempted.
    #[error("configuration incomplete: {0}")]
    Configuration(String),

    /// The OAuth callback arrived without a code or state parameter.
    #[error("invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// The callback state did not match the stored pending value.
    /// No token exchange is performed.
    #[error("OAuth state mismatch; authorization flow must be restarted")]
    CsrfMismatch,

    /// The provider rejected the authorization code.
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The provider rejected the refresh token. The caller should treat
    /// the session as disconnected.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// A sync run is already in progress.
    #[error("a sync run is already in progress")]
    AlreadyRunning,

    /// Network-level failure or unexpected response from either external
    /// API.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// Settings store failure.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<ureq::Error> for SyncError {
    fn from(err: ureq::Error) -> Self {
        SyncError::Upstream(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
