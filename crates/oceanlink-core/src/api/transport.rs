//! Outbound HTTP requests and the transport that carries them.
//!
//! The dispatcher describes every call, login included, as an
//! [`OutboundRequest`] and hands it to a [`Transport`]. [`HttpTransport`] is
//! the production implementation: a `reqwest` client presenting the
//! configured client certificate.

use std::borrow::Cow;
use std::future::Future;
use std::path::Path;

use reqwest::{Client, Identity, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;

use super::error::{BoxError, ProtocolError};
use super::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Json(Vec<u8>),
    /// Sent as `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl OutboundRequest {
    /// First value of the named header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a response, uninterpreted.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Fail with [`ProtocolError::UnexpectedStatus`] unless the status is one of `expected`.
    pub fn expect_status(self, expected: &[StatusCode]) -> Result<Self, ApiError> {
        if expected.contains(&self.status) {
            Ok(self)
        } else {
            Err(ProtocolError::from_status(self.status, &self.text()).into())
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|source| {
            ProtocolError::Decode {
                status: self.status,
                source,
            }
            .into()
        })
    }
}

/// Carries requests to the remote service.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest) -> impl Future<Output = Result<RawResponse, BoxError>> + Send;
}

/// `reqwest`-backed transport presenting the client certificate.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client presenting the certificate and key named in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let identity = load_identity(&config.cert_file, &config.key_file)?;
        let client = Client::builder()
            .identity(identity)
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ApiError::configuration_with("Failed to build HTTP client", e))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, BoxError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes),
            RequestBody::Form(pairs) => builder.form(&pairs),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(%status, bytes = body.len(), "Response received");
        Ok(RawResponse { status, body })
    }
}

fn load_identity(cert_file: &Path, key_file: &Path) -> Result<Identity, ApiError> {
    let mut pem = std::fs::read(cert_file).map_err(|e| {
        ApiError::configuration_with(
            format!("Failed to read client certificate {}", cert_file.display()),
            e,
        )
    })?;
    let key = std::fs::read(key_file).map_err(|e| {
        ApiError::configuration_with(format!("Failed to read client key {}", key_file.display()), e)
    })?;
    pem.push(b'\n');
    pem.extend_from_slice(&key);

    Identity::from_pem(&pem)
        .map_err(|e| ApiError::configuration_with("Invalid client certificate or key", e))
}
