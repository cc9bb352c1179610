//! Authenticated request dispatch for the OceanConnect API.
//!
//! This module provides the `OceanClient` struct. Every request goes through
//! [`OceanClient::dispatch`], which holds the session lock while it checks
//! token freshness, logs in when needed, attaches the auth headers and issues
//! the call. Device, command and subscription operations live in sibling
//! modules as further `impl OceanClient` blocks.

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::Deserialize;
use tracing::debug;

use crate::auth::{Authenticator, Clock, Grant, SessionManager, SystemClock};
use crate::config::ClientConfig;

use super::error::truncate_body;
use super::transport::{HttpTransport, OutboundRequest, RawResponse, RequestBody, Transport};
use super::{ApiError, AuthError, Query};

// ============================================================================
// Constants
// ============================================================================

/// Authentication endpoint, relative to the base URL
pub const LOGIN_PATH: &str = "/iocm/app/sec/v1.1.0/login";

/// Header carrying the application identifier
const APP_KEY_HEADER: &str = "app_key";

const AUTHORIZATION_HEADER: &str = "Authorization";

const CONTENT_TYPE_HEADER: &str = "Content-Type";

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Seconds until the token expires
    #[serde(rename = "expiresIn")]
    expires_in: i64,
}

/// Client for the OceanConnect northbound API.
///
/// Share it by reference (or `Arc`) between tasks: all requests from one
/// client are serialized, and at most one login is ever in flight.
pub struct OceanClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
    session: SessionManager,
}

impl OceanClient<HttpTransport> {
    /// Create a client that authenticates with the configured client certificate.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> OceanClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ClientConfig, transport: T, clock: Arc<dyn Clock>) -> Result<Self, ApiError> {
        config.validate()?;
        let session = SessionManager::with_clock(config.session_margin(), clock);
        Ok(Self {
            config,
            transport,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue an authenticated request and return the raw response.
    ///
    /// Status codes are not interpreted here.
    pub async fn dispatch(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<RawResponse, ApiError> {
        self.dispatch_with_query(method, path, &Query::new(), body).await
    }

    pub async fn dispatch_with_query(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ApiError> {
        let url = self.endpoint(path, query)?;
        let login = LoginExchange {
            transport: &self.transport,
            url: self.endpoint(LOGIN_PATH, &Query::new())?,
            app_id: &self.config.app_id,
            secret: &self.config.secret,
        };

        let mut session = self.session.lock().await;
        let token = session.ensure_valid(&login).await?;

        let request = OutboundRequest {
            method,
            url,
            headers: vec![
                (APP_KEY_HEADER, self.config.app_id.clone()),
                (AUTHORIZATION_HEADER, token),
                (CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE.to_string()),
            ],
            body: body.map_or(RequestBody::Empty, RequestBody::Json),
        };
        debug!(method = %request.method, path, "Dispatching request");
        let response = self.transport.send(request).await.map_err(ApiError::Transport)?;
        drop(session);

        Ok(response)
    }

    fn endpoint(&self, path: &str, query: &Query) -> Result<Url, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidArgument(format!(
                "request path must start with '/': {path:?}"
            )));
        }
        let mut url = Url::parse(&format!("{}{}", self.config.base_url(), path))
            .map_err(|e| ApiError::InvalidArgument(format!("invalid request path {path:?}: {e}")))?;
        query.apply_to(&mut url);
        Ok(url)
    }
}

/// One login round-trip through the client's transport.
struct LoginExchange<'a, T> {
    transport: &'a T,
    url: Url,
    app_id: &'a str,
    secret: &'a str,
}

impl<T: Transport> Authenticator for LoginExchange<'_, T> {
    async fn login(&self) -> Result<Grant, AuthError> {
        let request = OutboundRequest {
            method: Method::POST,
            url: self.url.clone(),
            headers: Vec::new(),
            body: RequestBody::Form(vec![
                ("appId".to_string(), self.app_id.to_string()),
                ("secret".to_string(), self.secret.to_string()),
            ]),
        };

        let response = self.transport.send(request).await.map_err(AuthError::Network)?;
        if !response.status.is_success() {
            return Err(AuthError::Rejected {
                status: response.status,
                body: truncate_body(&response.text()),
            });
        }

        let login: LoginResponse =
            serde_json::from_slice(&response.body).map_err(AuthError::MalformedResponse)?;
        Ok(Grant {
            token: login.access_token,
            expires_in_secs: login.expires_in,
        })
    }
}
