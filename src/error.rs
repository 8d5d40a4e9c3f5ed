use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again in a moment.";
pub const QUOTA_MESSAGE: &str = "AI credits exhausted. Please add credits to your workspace.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate post. Please try again.";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing credential: {0} is not configured")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    #[error("{}", QUOTA_MESSAGE)]
    QuotaExhausted,

    #[error("No image generated: {0}")]
    NoImageProduced(String),

    #[error("Upstream error ({status}): {body}")]
    UpstreamError { status: u16, body: String },

    #[error("Transport error: {0}")]
    TransportError(String),
}

impl RelayError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RelayError::InvalidRequest(msg.into())
    }

    /// HTTP status the relay answers with for this failure class.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::InvalidRequest(_) => 400,
            RelayError::RateLimited => 429,
            RelayError::QuotaExhausted => 402,
            _ => 500,
        }
    }

    /// Whether the full error text may be shown to the caller.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidRequest(_) | RelayError::RateLimited | RelayError::QuotaExhausted
        )
    }

    /// Message returned to the browser. Upstream and transport detail stays in
    /// the server log.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::InvalidRequest(msg) => msg.clone(),
            RelayError::RateLimited => RATE_LIMIT_MESSAGE.to_string(),
            RelayError::QuotaExhausted => QUOTA_MESSAGE.to_string(),
            RelayError::MissingCredential(_) | RelayError::ConfigError(_) => {
                "Server is not configured for image generation.".to_string()
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
