//! Receiver for notifications pushed by the platform.
//!
//! After [`OceanClient::subscribe`](crate::OceanClient::subscribe) the
//! platform POSTs change notifications to the callback URL. [`router`] builds
//! an `axum` router that decodes them and forwards each one into a channel;
//! [`serve`] runs it on a listener.

use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::models::Notification;

/// Router accepting notification POSTs at `path`.
///
/// The path must start with `/` and hold only unreserved URL characters, so
/// it matches literally.
pub fn router(path: &str, sender: mpsc::Sender<Notification>) -> Result<Router, ApiError> {
    check_path(path)?;
    Ok(Router::new().route(path, post(receive)).with_state(sender))
}

pub async fn serve(listener: TcpListener, path: &str, sender: mpsc::Sender<Notification>) -> Result<(), ApiError> {
    let app = router(path, sender)?;
    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Transport(e.into()))
}

fn check_path(path: &str) -> Result<(), ApiError> {
    let literal = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '.' | '_' | '~'));
    if !path.starts_with('/') || !literal {
        return Err(ApiError::InvalidArgument(format!(
            "notification path must start with '/' and use only letters, digits and -._~: {path:?}"
        )));
    }
    Ok(())
}

async fn receive(State(sender): State<mpsc::Sender<Notification>>, body: Bytes) -> StatusCode {
    let notification = match Notification::from_json(&body) {
        Ok(notification) => notification,
        Err(e) => {
            warn!(error = %e, "Discarding undecodable notification");
            return StatusCode::BAD_REQUEST;
        }
    };
    debug!(
        notify_type = notification.notify_type(),
        device_id = ?notification.device_id(),
        "Notification received"
    );
    match sender.send(notification).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
