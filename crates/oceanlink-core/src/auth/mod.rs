//! Authentication module for managing the API session.
//!
//! This module provides:
//! - `Session`: the access token together with its absolute expiry
//! - `SessionManager`: owner of the session and of the lock serializing
//!   every request issued by a client
//! - `Clock`: the time source used for freshness checks
//!
//! Tokens are refreshed by a new login once they come within the safety
//! margin of their expiry.

pub mod session;

pub use session::{Authenticator, Clock, Grant, Session, SessionGuard, SessionManager, SystemClock};
