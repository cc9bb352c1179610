use serde::{Deserialize, Deserializer, Serialize};

use crate::api::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Online,
    Offline,
    Abnormal,
    Inactive,
    Unknown,
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Online => write!(f, "Online"),
            DeviceStatus::Offline => write!(f, "Offline"),
            DeviceStatus::Abnormal => write!(f, "Abnormal"),
            DeviceStatus::Inactive => write!(f, "Inactive"),
            DeviceStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "gatewayId")]
    pub gateway_id: Option<String>,
    #[serde(rename = "nodeType")]
    pub node_type: Option<String>,
    #[serde(rename = "createTime")]
    pub create_time: Option<String>,
    #[serde(rename = "lastModifiedTime")]
    pub last_modified_time: Option<String>,
    #[serde(rename = "deviceInfo", default, deserialize_with = "null_as_default")]
    pub device_info: DeviceInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<DeviceService>,
}

impl Device {
    /// Display name, falling back to the node id and then the device id.
    pub fn display_name(&self) -> &str {
        self.device_info
            .name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.device_info.node_id.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.device_id)
    }

    pub fn status(&self) -> DeviceStatus {
        match self.device_info.status.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("ONLINE") => DeviceStatus::Online,
            Some(s) if s.eq_ignore_ascii_case("OFFLINE") => DeviceStatus::Offline,
            Some(s) if s.eq_ignore_ascii_case("ABNORMAL") => DeviceStatus::Abnormal,
            Some(s) if s.eq_ignore_ascii_case("INACTIVE") => DeviceStatus::Inactive,
            _ => DeviceStatus::Unknown,
        }
    }

    /// Latest data reported for a service, if the device has it.
    pub fn service(&self, service_id: &str) -> Option<&DeviceService> {
        self.services.iter().find(|s| s.service_id == service_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "nodeId")]
    pub node_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "manufacturerId")]
    pub manufacturer_id: Option<String>,
    #[serde(rename = "manufacturerName")]
    pub manufacturer_name: Option<String>,
    pub mac: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "deviceType")]
    pub device_type: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "swVersion")]
    pub sw_version: Option<String>,
    #[serde(rename = "fwVersion")]
    pub fw_version: Option<String>,
    #[serde(rename = "hwVersion")]
    pub hw_version: Option<String>,
    #[serde(rename = "protocolType")]
    pub protocol_type: Option<String>,
    #[serde(rename = "bridgeId")]
    pub bridge_id: Option<String>,
    /// ONLINE, OFFLINE, ABNORMAL or INACTIVE
    pub status: Option<String>,
    #[serde(rename = "statusDetail")]
    pub status_detail: Option<String>,
    pub mute: Option<String>,
    #[serde(rename = "signalStrength", default, deserialize_with = "deserialize_string_or_number")]
    pub signal_strength: Option<String>,
    #[serde(rename = "batteryLevel", default, deserialize_with = "deserialize_string_or_number")]
    pub battery_level: Option<String>,
    #[serde(rename = "serialNumber")]
    pub serial_number: Option<String>,
}

/// Most recent data a device reported for one of its services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceService {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "serviceType")]
    pub service_type: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    /// UTC, formatted `yyyyMMddTHHmmssZ`
    #[serde(rename = "eventTime")]
    pub event_time: Option<String>,
}

/// One page of a device listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevicePage {
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
    #[serde(rename = "pageNo", default)]
    pub page_no: u32,
    #[serde(rename = "pageSize", default)]
    pub page_size: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: Vec<Device>,
}

/// Filters for a device listing. Unset fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceQuery {
    pub gateway_id: Option<String>,
    /// ENDPOINT, GATEWAY or UNKNOW
    pub node_type: Option<String>,
    /// Zero-based; always sent
    pub page_no: u32,
    pub page_size: Option<u32>,
    pub status: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub sort: Option<String>,
}

impl DeviceQuery {
    pub fn page(page_no: u32, page_size: u32) -> Self {
        Self {
            page_no,
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> Query {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Query::new()
            .set("gatewayId", non_empty(&self.gateway_id))
            .set("nodeType", non_empty(&self.node_type))
            .param("pageNo", self.page_no)
            .set("pageSize", self.page_size.filter(|&size| size != 0))
            .set("startTime", non_empty(&self.start_time))
            .set("endTime", non_empty(&self.end_time))
            .set("status", non_empty(&self.status))
            .set("sort", non_empty(&self.sort))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Seconds the verify code stays valid; `None` lets the platform decide.
    pub timeout: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationReply {
    #[serde(rename = "verifyCode")]
    pub verify_code: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(default)]
    pub timeout: u32,
    /// Pre-shared key for DTLS
    #[serde(default)]
    pub psk: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// The platform reports some numeric readings as strings and others as numbers
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct StringOrNumberVisitor;

    impl<'de> de::Visitor<'de> for StringOrNumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            if v.is_empty() {
                Ok(None)
            } else {
                Ok(Some(v.to_string()))
            }
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}
