//! Data models for OceanConnect entities.
//!
//! This module contains the request and response structures of the
//! device-management API:
//!
//! - `Device`, `DeviceInfo`, `DeviceService`: device records and their
//!   reported service data
//! - `DevicePage`, `DeviceQuery`: paged device listings and their filters
//! - `RegistrationReply`, `RegisterOptions`: device registration
//! - `DeviceCommand`: commands delivered to devices
//! - `NotifyType`, `Subscription`, `Notification`: change notifications

pub mod command;
pub mod device;
pub mod notification;

pub use command::DeviceCommand;
pub use device::{
    Device, DeviceInfo, DevicePage, DeviceQuery, DeviceService, DeviceStatus, RegisterOptions,
    RegistrationReply,
};
pub use notification::{DeviceDataChanged, Notification, NotifyType, Subscription};
