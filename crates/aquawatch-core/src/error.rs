use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AquaError {
    #[error("failed to load rule table from {path}: {reason}")]
    RuleTableLoad { path: PathBuf, reason: String },

    #[error("invalid rule table: {0}")]
    RuleTableInvalid(String),

    #[error("unknown preset '{name}'. Available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a request to the external data source.
///
/// Cloneable so it can travel inside broadcast status events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Failed(String),

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("authorization expired or rejected (HTTP {status})")]
    AuthExpired { status: u16 },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Whether the session should keep polling after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::AuthExpired { .. })
    }
}
