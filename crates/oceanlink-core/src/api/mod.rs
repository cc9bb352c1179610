//! REST API client module for the OceanConnect platform.
//!
//! This module provides the `OceanClient` for registering, querying,
//! updating and commanding devices and for subscribing to change
//! notifications.
//!
//! The API authenticates the application with a client certificate at the
//! transport level and an access token, obtained from the login endpoint,
//! on every request.

pub mod client;
pub mod commands;
pub mod devices;
pub mod error;
pub mod query;
pub mod subscriptions;
pub mod transport;

pub use client::OceanClient;
pub use error::{ApiError, AuthError, BoxError, ProtocolError};
pub use query::Query;
pub use transport::{HttpTransport, OutboundRequest, RawResponse, RequestBody, Transport};
