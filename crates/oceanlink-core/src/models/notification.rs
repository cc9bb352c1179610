use serde::{Deserialize, Serialize};

use super::device::DeviceService;

/// Kinds of change notification the platform can push to a callback URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyType {
    #[serde(rename = "deviceAdded")]
    DeviceAdded,
    #[serde(rename = "deviceInfoChanged")]
    DeviceInfoChanged,
    #[serde(rename = "deviceDataChanged")]
    DeviceDataChanged,
    #[serde(rename = "deviceDeleted")]
    DeviceDeleted,
    #[serde(rename = "messageConfirm")]
    MessageConfirm,
    #[serde(rename = "commandRsp")]
    CommandResponse,
    #[serde(rename = "deviceEvent")]
    DeviceEvent,
}

impl NotifyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyType::DeviceAdded => "deviceAdded",
            NotifyType::DeviceInfoChanged => "deviceInfoChanged",
            NotifyType::DeviceDataChanged => "deviceDataChanged",
            NotifyType::DeviceDeleted => "deviceDeleted",
            NotifyType::MessageConfirm => "messageConfirm",
            NotifyType::CommandResponse => "commandRsp",
            NotifyType::DeviceEvent => "deviceEvent",
        }
    }
}

impl std::fmt::Display for NotifyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotifyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown notify type {s:?}"))
    }
}

/// A subscription accepted by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "subscriptionId", default)]
    pub subscription_id: Option<String>,
    #[serde(rename = "notifyType")]
    pub notify_type: NotifyType,
    #[serde(rename = "callbackUrl", alias = "callbackurl")]
    pub callback_url: String,
}

/// Payload of a `deviceDataChanged` notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDataChanged {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "gatewayId")]
    pub gateway_id: Option<String>,
    #[serde(rename = "requestId")]
    pub request_id: Option<String>,
    pub service: DeviceService,
}

/// A notification pushed by the platform.
#[derive(Debug, Clone)]
pub enum Notification {
    DeviceDataChanged(DeviceDataChanged),
    /// Any other notify type, kept as received
    Other {
        notify_type: String,
        payload: serde_json::Value,
    },
}

impl Notification {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "notifyType")]
            notify_type: String,
        }

        let payload: serde_json::Value = serde_json::from_slice(bytes)?;
        let envelope = Envelope::deserialize(&payload)?;
        if envelope.notify_type == NotifyType::DeviceDataChanged.as_str() {
            return Ok(Notification::DeviceDataChanged(DeviceDataChanged::deserialize(
                &payload,
            )?));
        }
        Ok(Notification::Other {
            notify_type: envelope.notify_type,
            payload,
        })
    }

    pub fn notify_type(&self) -> &str {
        match self {
            Notification::DeviceDataChanged(_) => NotifyType::DeviceDataChanged.as_str(),
            Notification::Other { notify_type, .. } => notify_type,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        match self {
            Notification::DeviceDataChanged(change) => Some(&change.device_id),
            Notification::Other { payload, .. } => payload.get("deviceId").and_then(|v| v.as_str()),
        }
    }
}
