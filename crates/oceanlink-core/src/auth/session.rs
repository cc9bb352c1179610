use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::api::AuthError;

/// Source of the current time for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// An access token and the instant the server says it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the token outlives `now + margin`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at > now + margin
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}

/// A token as granted by the login endpoint, lifetime still relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub token: String,
    pub expires_in_secs: i64,
}

/// Performs the login exchange with the remote service.
pub trait Authenticator {
    fn login(&self) -> impl Future<Output = Result<Grant, AuthError>> + Send;
}

/// Owns the session and the lock every request goes through.
///
/// The session can only be inspected or refreshed through a [`SessionGuard`],
/// so holding the guard is the same thing as holding the client-wide lock.
pub struct SessionManager {
    state: Mutex<Option<Session>>,
    margin: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(margin: Duration) -> Self {
        Self::with_clock(margin, Arc::new(SystemClock))
    }

    pub fn with_clock(margin: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(None),
            margin,
            clock,
        }
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Wait for the lock. Requests are serialized for as long as the guard lives.
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            state: self.state.lock().await,
            margin: self.margin,
            clock: self.clock.as_ref(),
        }
    }

    /// Copy of the current session, taken under the lock.
    pub async fn snapshot(&self) -> Option<Session> {
        self.lock().await.session().cloned()
    }
}

/// Exclusive access to the session.
pub struct SessionGuard<'a> {
    state: MutexGuard<'a, Option<Session>>,
    margin: Duration,
    clock: &'a dyn Clock,
}

impl SessionGuard<'_> {
    pub fn session(&self) -> Option<&Session> {
        self.state.as_ref()
    }

    pub fn needs_login(&self) -> bool {
        match self.state.as_ref() {
            Some(session) => !session.is_fresh_at(self.clock.now(), self.margin),
            None => true,
        }
    }

    /// Return a token valid for at least the margin, logging in first when
    /// the current one is missing or about to expire.
    ///
    /// A failed login leaves the previous session in place, stale or not.
    pub async fn ensure_valid<A: Authenticator>(&mut self, authenticator: &A) -> Result<String, AuthError> {
        let now = self.clock.now();
        match self.state.as_ref() {
            Some(session) if session.is_fresh_at(now, self.margin) => {
                return Ok(session.token.clone());
            }
            Some(session) => {
                debug!(expires_at = %session.expires_at, "Token within refresh margin, logging in");
            }
            None => debug!("No session yet, logging in"),
        }

        let grant = authenticator.login().await?;
        let session = self.session_from_grant(grant, now)?;
        info!(expires_at = %session.expires_at, "Session established");

        let token = session.token.clone();
        *self.state = Some(session);
        Ok(token)
    }

    // Lifetime is counted from before the login call went out.
    fn session_from_grant(&self, grant: Grant, issued_at: DateTime<Utc>) -> Result<Session, AuthError> {
        if grant.token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        let invalid = || AuthError::InvalidLifetime {
            expires_in: grant.expires_in_secs,
            margin: self.margin.num_seconds(),
        };
        let lifetime = Duration::try_seconds(grant.expires_in_secs).ok_or_else(invalid)?;
        if lifetime <= self.margin {
            return Err(invalid());
        }
        let expires_at = issued_at.checked_add_signed(lifetime).ok_or_else(invalid)?;
        Ok(Session {
            token: grant.token,
            expires_at,
        })
    }
}
