use thiserror::Error;

#[derive(Error, Debug)]
pub enum MixerError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to create workflow ({status}): {body}")]
    UpstreamCreate { status: u16, body: String },

    #[error("Failed to update workflow ({status}): {body}")]
    UpstreamUpdate { status: u16, body: String },

    #[error("Failed to activate workflow ({status}): {body}")]
    UpstreamActivate { status: u16, body: String },

    #[error("Agent request failed ({status}): {body}")]
    UpstreamInvocation { status: u16, body: String },

    #[error("Failed to fetch workflow ({status}): {body}")]
    UpstreamFetch { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MixerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status to report for this error. Upstream failures keep the
    /// platform's own status; 502 when that status is out of range.
    pub fn http_status(&self) -> u16 {
        match self {
            MixerError::Validation(_) => 400,
            MixerError::UpstreamCreate { status, .. }
            | MixerError::UpstreamUpdate { status, .. }
            | MixerError::UpstreamActivate { status, .. }
            | MixerError::UpstreamInvocation { status, .. }
            | MixerError::UpstreamFetch { status, .. } => {
                if (100..=599).contains(status) {
                    *status
                } else {
                    502
                }
            }
            _ => 500,
        }
    }

    /// Short, user-facing summary (the `error` field of an HTTP error body).
    pub fn summary(&self) -> String {
        match self {
            MixerError::Validation(msg) => msg.clone(),
            MixerError::UpstreamCreate { .. } => "Failed to create workflow".to_string(),
            MixerError::UpstreamUpdate { .. } => "Failed to update workflow".to_string(),
            MixerError::UpstreamActivate { .. } => "Failed to activate workflow".to_string(),
            MixerError::UpstreamInvocation { .. } => "Agent request failed".to_string(),
            MixerError::UpstreamFetch { .. } => "Failed to fetch workflow".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Diagnostic detail: the raw upstream body, or the error text for
    /// everything that is not a validation failure.
    pub fn details(&self) -> Option<String> {
        match self {
            MixerError::Validation(_) => None,
            MixerError::UpstreamCreate { body, .. }
            | MixerError::UpstreamUpdate { body, .. }
            | MixerError::UpstreamActivate { body, .. }
            | MixerError::UpstreamInvocation { body, .. }
            | MixerError::UpstreamFetch { body, .. } => Some(body.clone()),
            other => Some(other.to_string()),
        }
    }
}
