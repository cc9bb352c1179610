//! Client library for the OceanConnect IoT device-management API.
//!
//! The crate is organised around an authenticated-request pipeline:
//!
//! - `auth`: the [`SessionManager`] owning the access token, its expiry and
//!   the lock that serializes every request issued by a client
//! - `api`: the [`OceanClient`] dispatcher plus the device, command and
//!   subscription operations built on top of it
//! - `models`: typed request/response structures for the remote API
//! - `notify`: an `axum` router receiving the service's callback
//!   notifications
//! - `config`: the [`ClientConfig`] connection parameters

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod notify;

#[cfg(test)]
mod testing;

pub use api::{ApiError, AuthError, HttpTransport, OceanClient, ProtocolError, Query, RawResponse, Transport};
pub use auth::{Clock, Session, SessionManager, SystemClock};
pub use config::ClientConfig;
