//! Client connection parameters.
//!
//! A [`ClientConfig`] is built in code or loaded from a JSON file and is
//! read-only once handed to a client. Besides the connection and credential
//! fields it carries account defaults (manufacturer, location, device model)
//! that device operations copy verbatim into their request bodies.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Per-request deadline applied by the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Refresh the token when it expires within this window (5 minutes).
pub const DEFAULT_SESSION_MARGIN_SECS: i64 = 300;

#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://iot.example.com:8743`
    pub url: String,
    /// PEM client certificate
    pub cert_file: PathBuf,
    /// PEM private key matching `cert_file`
    pub key_file: PathBuf,
    pub app_id: String,
    pub secret: String,

    #[serde(default)]
    pub manufacturer_name: String,
    #[serde(default)]
    pub manufacturer_id: String,
    #[serde(default)]
    pub end_user_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub model: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_session_margin_secs")]
    pub session_margin_secs: i64,
    /// Skip server certificate verification. Off unless explicitly enabled.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_session_margin_secs() -> i64 {
    DEFAULT_SESSION_MARGIN_SECS
}

impl ClientConfig {
    /// Create a config with empty account defaults and default timeouts.
    pub fn new(
        url: impl Into<String>,
        cert_file: impl Into<PathBuf>,
        key_file: impl Into<PathBuf>,
        app_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            cert_file: cert_file.into(),
            key_file: key_file.into(),
            app_id: app_id.into(),
            secret: secret.into(),
            manufacturer_name: String::new(),
            manufacturer_id: String::new(),
            end_user_id: String::new(),
            location: String::new(),
            device_type: String::new(),
            model: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_margin_secs: DEFAULT_SESSION_MARGIN_SECS,
            accept_invalid_certs: false,
        }
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ApiError::configuration_with(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            ApiError::configuration_with(format!("Failed to parse config file {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields every request depends on.
    pub fn validate(&self) -> Result<(), ApiError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ApiError::configuration_with(format!("Invalid base URL {:?}", self.url), e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::configuration(format!(
                "Unsupported URL scheme {:?}",
                url.scheme()
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ApiError::configuration(
                "Base URL must not carry a query or fragment",
            ));
        }
        if self.app_id.trim().is_empty() {
            return Err(ApiError::configuration("app_id must not be empty"));
        }
        if self.session_margin_secs < 0 || chrono::Duration::try_seconds(self.session_margin_secs).is_none() {
            return Err(ApiError::configuration(format!(
                "session_margin_secs out of range: {}",
                self.session_margin_secs
            )));
        }
        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_margin_secs)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("cert_file", &self.cert_file)
            .field("key_file", &self.key_file)
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .field("manufacturer_name", &self.manufacturer_name)
            .field("manufacturer_id", &self.manufacturer_id)
            .field("end_user_id", &self.end_user_id)
            .field("location", &self.location)
            .field("device_type", &self.device_type)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("session_margin_secs", &self.session_margin_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}
