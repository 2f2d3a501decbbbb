use thiserror::Error;

pub type Result<T, E = AirmegaError> = std::result::Result<T, E>;

/// Errors surfaced by the authentication and device protocol layers.
///
/// Nothing here is recovered inside the crate; callers pick the retry policy.
#[derive(Debug, Error)]
pub enum AirmegaError {
    /// The identity provider answered with an unexpected shape
    /// (missing form, missing action, missing redirect code).
    #[error("auth protocol error: {0}")]
    AuthProtocol(String),

    /// Token refresh failed or no usable tokens are available.
    #[error("token error: {0}")]
    Token(String),

    /// The vendor API answered without the fields we need.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential persistence failure.
    #[error("credential store error: {0}")]
    Store(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("config error: {0}")]
    Config(String),
}

impl AirmegaError {
    pub(crate) fn auth(msg: impl Into<String>) -> Self {
        Self::AuthProtocol(msg.into())
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Check if this error can only be cleared by logging in again.
    pub fn requires_relogin(&self) -> bool {
        matches!(self, Self::AuthProtocol(_) | Self::Token(_))
    }

    /// Check if this error is transient and may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
