use reqwest::StatusCode;
use thiserror::Error;

/// Boxed error produced by a [`Transport`](super::Transport) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Certificate, key, base URL or config file could not be used.
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("Network error: {0}")]
    Transport(#[source] BoxError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures of the login exchange. The session is never touched when one of
/// these is returned.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Network(#[source] BoxError),

    #[error("login rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("malformed login response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("login response carried an empty access token")]
    EmptyToken,

    #[error("granted token lifetime of {expires_in}s does not outlast the {margin}s refresh margin")]
    InvalidLifetime { expires_in: i64, margin: i64 },
}

/// The primary request reached the server but the answer was not the one
/// the operation expects.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Invalid response body (status {status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid carrying excessive data in errors
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

impl ApiError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ApiError::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration_with(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        ApiError::Configuration {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Status code observed from the server, when the error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Authentication(AuthError::Rejected { status, .. }) => Some(*status),
            ApiError::Protocol(ProtocolError::UnexpectedStatus { status, .. })
            | ApiError::Protocol(ProtocolError::Decode { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

impl ProtocolError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ProtocolError::UnexpectedStatus {
            status,
            body: truncate_body(body),
        }
    }
}
