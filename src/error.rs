use std::fmt;

use crate::config::VALID_REGIONS;

/// Gateway error types
///
/// Every failure path in the crate maps into exactly one of these kinds.
/// Retry eligibility is decided solely by [`is_retryable`]; no other
/// component re-derives it.
#[derive(Debug)]
pub enum GatewayError {
    /// Configuration error (bad region, empty token, ...)
    Config(String),
    /// Backend rejected the API token (HTTP 401)
    Unauthorized(String),
    /// Backend rate limit hit (HTTP 429); carries the suggested wait when
    /// the backend sent a Retry-After header
    RateLimited {
        retry_after_ms: Option<u64>,
        message: String,
    },
    /// Backend-side failure (HTTP 5xx)
    BackendUnavailable { status: u16, message: String },
    /// Caller-side request the backend refused (4xx other than 401/429)
    BadRequest { status: u16, message: String },
    /// Caller-supplied parameters failed precondition checks
    Validation(String),
    /// Transport-level error (preserves reqwest::Error for transient-failure detection)
    HttpRequest(reqwest::Error),
    /// Anything unexpected, wrapped rather than leaked raw
    Unknown(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::RateLimited { message, .. } => write!(f, "Rate limited: {}", message),
            Self::BackendUnavailable { status, message } => {
                write!(f, "Backend unavailable ({}): {}", status, message)
            }
            Self::BadRequest { status, message } => {
                write!(f, "Bad request ({}): {}", status, message)
            }
            Self::Validation(msg) => write!(f, "Invalid request: {}", msg),
            Self::HttpRequest(err) => write!(f, "HTTP request error: {}", err),
            Self::Unknown(msg) => write!(f, "Unexpected error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpRequest(err)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown(format!("failed to decode backend response: {}", err))
    }
}

/// Classify a non-success HTTP response into a typed error
///
/// `retry_after_secs` comes from the Retry-After header and is only
/// meaningful for 429 responses, where it converts to milliseconds.
pub fn classify_status(status: u16, body: String, retry_after_secs: Option<u64>) -> GatewayError {
    match status {
        401 => GatewayError::Unauthorized(format!(
            "API token rejected. The most common cause is a token/region mismatch; \
             valid regions are: {}. Backend said: {}",
            VALID_REGIONS.join(", "),
            body
        )),
        429 => GatewayError::RateLimited {
            retry_after_ms: retry_after_secs.map(|s| s * 1000),
            message: body,
        },
        s if (500..600).contains(&s) => GatewayError::BackendUnavailable {
            status: s,
            message: body,
        },
        s => GatewayError::BadRequest {
            status: s,
            message: body,
        },
    }
}

/// Determine whether a classified error is worth retrying
///
/// Retryable: rate limits, 5xx responses, and transport failures that are
/// transient (connection refused/reset, DNS failure, timeout).
///
/// NOT retryable: auth failures, other 4xx, validation and config errors,
/// and anything unknown.
pub fn is_retryable(error: &GatewayError) -> bool {
    match error {
        GatewayError::RateLimited { .. } => true,
        GatewayError::BackendUnavailable { .. } => true,

        // Transport errors - check for connection/timeout issues
        GatewayError::HttpRequest(e) => {
            if e.is_connect() || e.is_timeout() {
                return true;
            }
            // A status captured inside the reqwest error still counts when 5xx
            if let Some(status) = e.status() {
                return status.is_server_error();
            }
            false
        }

        GatewayError::Config(_) => false,
        GatewayError::Unauthorized(_) => false,
        GatewayError::BadRequest { .. } => false,
        GatewayError::Validation(_) => false,
        GatewayError::Unknown(_) => false,
    }
}

/// Stable machine-readable name for each error kind
pub fn error_kind_name(error: &GatewayError) -> &'static str {
    match error {
        GatewayError::Config(_) => "config_error",
        GatewayError::Unauthorized(_) => "unauthorized",
        GatewayError::RateLimited { .. } => "rate_limited",
        GatewayError::BackendUnavailable { .. } => "backend_unavailable",
        GatewayError::BadRequest { .. } => "bad_request",
        GatewayError::Validation(_) => "validation_error",
        GatewayError::HttpRequest(_) => "http_request_error",
        GatewayError::Unknown(_) => "unknown_error",
    }
}
