//! Device registration, lookup, update and removal.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::models::{Device, DevicePage, DeviceQuery, RegisterOptions, RegistrationReply};

use super::transport::Transport;
use super::{ApiError, OceanClient, Query};

const REGISTER_PATH: &str = "/iocm/app/reg/v1.2.0/devices";

/// Device management, read side and delete
const DEVICES_PATH: &str = "/iocm/app/dm/v1.1.0/devices";

/// Device management, info updates
const DEVICES_UPDATE_PATH: &str = "/iocm/app/dm/v1.2.0/devices";

const DEFAULT_PROTOCOL_TYPE: &str = "CoAP";

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    #[serde(rename = "verifyCode")]
    verify_code: &'a str,
    #[serde(rename = "nodeId")]
    node_id: &'a str,
    timeout: u32,
    #[serde(rename = "endUserId")]
    end_user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct DeviceInfoBody<'a> {
    name: &'a str,
    mute: &'a str,
    #[serde(rename = "manufacturerId")]
    manufacturer_id: &'a str,
    #[serde(rename = "manufacturerName")]
    manufacturer_name: &'a str,
    location: &'a str,
    #[serde(rename = "deviceType")]
    device_type: &'a str,
    #[serde(rename = "protocolType")]
    protocol_type: &'a str,
    model: &'a str,
}

/// Reject ids that would change the shape of the request path.
pub(crate) fn check_device_id(device_id: &str) -> Result<(), ApiError> {
    if device_id.is_empty() {
        return Err(ApiError::InvalidArgument("device id must not be empty".to_string()));
    }
    if device_id == "." || device_id == ".." {
        return Err(ApiError::InvalidArgument(format!(
            "device id must not be a dot segment: {device_id:?}"
        )));
    }
    if device_id.contains(&['/', '\\', '?', '#', '%'][..]) {
        return Err(ApiError::InvalidArgument(format!(
            "device id contains a reserved character: {device_id:?}"
        )));
    }
    Ok(())
}

pub(crate) fn encode_body<B: Serialize>(body: &B) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(body).map_err(ApiError::Encode)
}

impl<T: Transport> OceanClient<T> {
    /// Register a device by IMEI. The IMEI doubles as node id and verify code.
    pub async fn register_device(&self, imei: &str, options: RegisterOptions) -> Result<RegistrationReply, ApiError> {
        if imei.is_empty() {
            return Err(ApiError::InvalidArgument("IMEI must not be empty".to_string()));
        }
        let body = RegisterBody {
            verify_code: imei,
            node_id: imei,
            timeout: options.timeout.unwrap_or(0),
            end_user_id: &self.config().end_user_id,
        };
        let query = Query::new().param("appId", &self.config().app_id);

        let response = self
            .dispatch_with_query(Method::POST, REGISTER_PATH, &query, Some(encode_body(&body)?))
            .await?
            .expect_status(&[StatusCode::OK])?;
        let reply: RegistrationReply = response.json()?;
        debug!(device_id = %reply.device_id, "Device registered");
        Ok(reply)
    }

    /// Name a device and stamp it with the account's manufacturer and model defaults.
    pub async fn set_device_info(&self, device_id: &str, name: &str) -> Result<(), ApiError> {
        check_device_id(device_id)?;
        let config = self.config();
        let body = DeviceInfoBody {
            name,
            mute: "FALSE",
            manufacturer_id: &config.manufacturer_id,
            manufacturer_name: &config.manufacturer_name,
            location: &config.location,
            device_type: &config.device_type,
            protocol_type: DEFAULT_PROTOCOL_TYPE,
            model: &config.model,
        };
        let query = Query::new().param("appId", &config.app_id);

        self.dispatch_with_query(
            Method::PUT,
            &format!("{DEVICES_UPDATE_PATH}/{device_id}"),
            &query,
            Some(encode_body(&body)?),
        )
        .await?
        .expect_status(&[StatusCode::NO_CONTENT])?;
        Ok(())
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<(), ApiError> {
        check_device_id(device_id)?;
        self.dispatch(Method::DELETE, &format!("{DEVICES_PATH}/{device_id}"), None)
            .await?
            .expect_status(&[StatusCode::NO_CONTENT])?;
        Ok(())
    }

    pub async fn get_device(&self, device_id: &str) -> Result<Device, ApiError> {
        check_device_id(device_id)?;
        self.dispatch(Method::GET, &format!("{DEVICES_PATH}/{device_id}"), None)
            .await?
            .expect_status(&[StatusCode::OK])?
            .json()
    }

    /// Fetch one page of devices matching `query`.
    pub async fn get_devices(&self, query: &DeviceQuery) -> Result<DevicePage, ApiError> {
        let page: DevicePage = self
            .dispatch_with_query(Method::GET, DEVICES_PATH, &query.to_query(), None)
            .await?
            .expect_status(&[StatusCode::OK])?
            .json()?;
        debug!(count = page.devices.len(), total = page.total_count, "Devices fetched");
        Ok(page)
    }
}
