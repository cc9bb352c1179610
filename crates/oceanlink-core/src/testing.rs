//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::StatusCode;

use crate::api::client::LOGIN_PATH;
use crate::api::error::BoxError;
use crate::api::transport::{OutboundRequest, RawResponse, Transport};
use crate::auth::Clock;
use crate::config::ClientConfig;

/// Clock that only moves when told to.
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl ManualClock {
    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Respond(StatusCode, String),
    Fail(String),
}

impl Reply {
    pub(crate) fn ok(body: &str) -> Self {
        Reply::Respond(StatusCode::OK, body.to_string())
    }

    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        Reply::Respond(status, body.to_string())
    }

    pub(crate) fn token(token: &str, expires_in: i64) -> Self {
        Reply::ok(&format!(
            r#"{{"accessToken":"{token}","tokenType":"bearer","expiresIn":{expires_in},"refreshToken":"r-{token}","scope":"default"}}"#
        ))
    }
}

/// Records every request and answers from scripted queues.
///
/// Login requests consume `login_replies` and fall back to a fresh one-hour
/// token; all other requests consume `replies` and fall back to `200 {}`.
/// Each call holds for `latency` so overlapping calls can be observed.
pub(crate) struct FakeTransport {
    login_replies: Mutex<VecDeque<Reply>>,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<OutboundRequest>>,
    logins: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: StdDuration,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::with_latency(StdDuration::ZERO)
    }

    pub(crate) fn with_latency(latency: StdDuration) -> Self {
        Self {
            login_replies: Mutex::new(VecDeque::new()),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logins: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency,
        }
    }

    pub(crate) fn push_login(&self, reply: Reply) {
        self.login_replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn push_reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests other than logins.
    pub(crate) fn primary_requests(&self) -> Vec<OutboundRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !is_login(r))
            .collect()
    }

    pub(crate) fn last_primary(&self) -> OutboundRequest {
        self.primary_requests()
            .pop()
            .expect("no primary request was issued")
    }
}

fn is_login(request: &OutboundRequest) -> bool {
    request.url.path().ends_with(LOGIN_PATH)
}

impl Transport for FakeTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, BoxError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let login = is_login(&request);
        self.requests.lock().unwrap().push(request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = if login {
            let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
            let scripted = self.login_replies.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| Reply::token(&format!("T{n}"), 3600))
        } else {
            let scripted = self.replies.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| Reply::ok("{}"))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match reply {
            Reply::Respond(status, body) => Ok(RawResponse::new(status, body)),
            Reply::Fail(message) => Err(message.into()),
        }
    }
}

pub(crate) fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new(
        "https://iot.example.com:8743/",
        "client.crt",
        "client.key",
        "app-1",
        "s3cret",
    );
    config.manufacturer_name = "Acme".to_string();
    config.manufacturer_id = "acme-01".to_string();
    config.end_user_id = "user-7".to_string();
    config.location = "Shenzhen".to_string();
    config.device_type = "WaterMeter".to_string();
    config.model = "WM-100".to_string();
    config
}
