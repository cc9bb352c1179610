use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::models::DeviceCommand;

use super::devices::{check_device_id, encode_body};
use super::transport::Transport;
use super::{ApiError, OceanClient};

const DEVICE_COMMANDS_PATH: &str = "/iocm/app/cmd/v1.4.0/deviceCommands";

impl<T: Transport> OceanClient<T> {
    /// Queue a command for a device. The platform answers 200 or 201
    /// depending on whether the command was delivered or queued.
    pub async fn send_command(&self, command: &DeviceCommand) -> Result<(), ApiError> {
        check_device_id(&command.device_id)?;
        if command.service_id.is_empty() || command.method.is_empty() {
            return Err(ApiError::InvalidArgument(
                "command service id and method must not be empty".to_string(),
            ));
        }

        let body = encode_body(&command.to_body())?;
        let response = self
            .dispatch(Method::POST, DEVICE_COMMANDS_PATH, Some(body))
            .await?
            .expect_status(&[StatusCode::OK, StatusCode::CREATED])?;
        debug!(
            device_id = %command.device_id,
            service_id = %command.service_id,
            status = %response.status,
            "Command accepted"
        );
        Ok(())
    }
}
