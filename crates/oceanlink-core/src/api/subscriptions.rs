use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::info;

use crate::models::{NotifyType, Subscription};

use super::devices::encode_body;
use super::transport::Transport;
use super::{ApiError, OceanClient};

const SUBSCRIBE_PATH: &str = "/iocm/app/sub/v1.2.0/subscribe";

#[derive(Debug, Serialize)]
struct SubscribeBody<'a> {
    #[serde(rename = "notifyType")]
    notify_type: NotifyType,
    #[serde(rename = "callbackurl")]
    callback_url: &'a str,
}

impl<T: Transport> OceanClient<T> {
    /// Subscribe `callback_url` to device data changes.
    pub async fn subscribe(&self, callback_url: &str) -> Result<Subscription, ApiError> {
        self.subscribe_to(NotifyType::DeviceDataChanged, callback_url).await
    }

    pub async fn subscribe_to(&self, notify_type: NotifyType, callback_url: &str) -> Result<Subscription, ApiError> {
        if callback_url.is_empty() {
            return Err(ApiError::InvalidArgument("callback URL must not be empty".to_string()));
        }
        let body = SubscribeBody {
            notify_type,
            callback_url,
        };

        let response = self
            .dispatch(Method::POST, SUBSCRIBE_PATH, Some(encode_body(&body)?))
            .await?
            .expect_status(&[StatusCode::CREATED])?;

        // Older platform versions answer with an empty body
        let subscription = if response.body.iter().all(u8::is_ascii_whitespace) {
            Subscription {
                subscription_id: None,
                notify_type,
                callback_url: callback_url.to_string(),
            }
        } else {
            response.json()?
        };
        info!(%notify_type, callback_url, "Subscribed to notifications");
        Ok(subscription)
    }
}
