use serde::Serialize;

/// A command for one service of a device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCommand {
    pub device_id: String,
    pub service_id: String,
    pub method: String,
    /// Command parameters as defined by the device profile
    pub params: serde_json::Value,
    /// Seconds the platform keeps the command queued; 0 delivers immediately or fails.
    pub expire_time: i64,
    /// Where the platform reports the command result, if anywhere.
    pub callback_url: Option<String>,
}

impl DeviceCommand {
    pub fn new(
        device_id: impl Into<String>,
        service_id: impl Into<String>,
        method: impl Into<String>,
        params: serde_json::Value,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            service_id: service_id.into(),
            method: method.into(),
            params,
            expire_time: 0,
            callback_url: None,
        }
    }

    pub fn expire_after(mut self, seconds: i64) -> Self {
        self.expire_time = seconds;
        self
    }

    pub fn with_callback(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub(crate) fn to_body(&self) -> CommandBody<'_> {
        CommandBody {
            device_id: &self.device_id,
            command: CommandPayload {
                service_id: &self.service_id,
                method: &self.method,
                params: &self.params,
            },
            callback_url: self.callback_url.as_deref().unwrap_or_default(),
            expire_time: self.expire_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CommandBody<'a> {
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    command: CommandPayload<'a>,
    #[serde(rename = "callbackUrl")]
    callback_url: &'a str,
    #[serde(rename = "expireTime")]
    expire_time: i64,
}

#[derive(Debug, Serialize)]
struct CommandPayload<'a> {
    #[serde(rename = "serviceId")]
    service_id: &'a str,
    method: &'a str,
    #[serde(rename = "paras")]
    params: &'a serde_json::Value,
}
