//! Error types for the iNaturalist API client

use std::fmt;

/// Errors that can occur when talking to the iNaturalist API
#[derive(Debug)]
pub enum ApiError {
    /// Transport failure: connect, timeout, reset
    Http(Box<reqwest::Error>),
    /// HTTP 429
    RateLimited { body: String },
    /// HTTP 401, never retried
    Authentication { body: String },
    /// Any other non-success status
    Status { status: u16, body: String },
    /// The attempt budget ran out; `last` is what the final attempt hit
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
    /// Failed to decode a response body or map it into an entity
    Json(serde_json::Error),
    /// The base URL and endpoint did not form a valid URL
    InvalidUrl(url::ParseError),
    /// Invalid client configuration
    Config(String),
    /// The call was cancelled through its cancellation token
    Cancelled,
}

impl ApiError {
    /// HTTP status behind this error, looking through retry exhaustion
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Authentication { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Response body captured with a failed status, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::RateLimited { body }
            | Self::Authentication { body }
            | Self::Status { body, .. } => Some(body),
            Self::RetriesExhausted { last, .. } => last.body(),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Whether the request executor will try again after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::RateLimited { .. } | Self::Status { .. }
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "iNaturalist HTTP error: {}", e),
            Self::RateLimited { .. } => write!(f, "iNaturalist rate limit exceeded"),
            Self::Authentication { .. } => write!(f, "iNaturalist authentication required"),
            Self::Status { status, body } => {
                write!(f, "iNaturalist returned status {}: {}", status, body)
            }
            Self::RetriesExhausted { attempts, last } => {
                write!(f, "Request failed after {} attempts: {}", attempts, last)
            }
            Self::Json(e) => write!(f, "iNaturalist JSON parse error: {}", e),
            Self::InvalidUrl(e) => write!(f, "Invalid request URL: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e.as_ref()),
            Self::Json(e) => Some(e),
            Self::InvalidUrl(e) => Some(e),
            Self::RetriesExhausted { last, .. } => Some(last.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(Box::new(e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e)
    }
}

/// Result type for iNaturalist API operations
pub type Result<T> = std::result::Result<T, ApiError>;
