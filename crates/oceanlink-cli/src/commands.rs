use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use oceanlink_core::models::{DeviceCommand, DeviceQuery, Notification, NotifyType, RegisterOptions};
use oceanlink_core::{notify, OceanClient};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;

pub const USAGE: &str = "\
Usage: oceanlink [--config <path>] <command> [args]

Commands:
  device <device-id>                         Show one device
  devices [--page N] [--page-size N]         List devices
          [--gateway ID] [--status S] [--node-type T]
  register <imei> [timeout-secs]             Register a device by IMEI
  rename <device-id> <name>                  Set a device's name and account defaults
  delete <device-id>                         Delete a device
  command <device-id> <service-id> <method> [params-json] [expire-secs]
                                             Send a command to a device
  subscribe <callback-url> [notify-type]     Subscribe a callback URL to notifications
  listen <bind-addr> [path]                  Receive notifications and print them
  help                                       Show this message

The config file defaults to $OCEANLINK_CONFIG, then <config dir>/oceanlink/config.json.";

/// Channel capacity for received notifications awaiting printing
const NOTIFICATION_BUFFER: usize = 64;

#[derive(Debug, PartialEq)]
pub enum Command {
    Device(String),
    Devices(DeviceQuery),
    Register { imei: String, timeout: Option<u32> },
    Rename { device_id: String, name: String },
    Delete(String),
    Send(DeviceCommand),
    Subscribe { callback_url: String, notify_type: NotifyType },
    Listen { addr: SocketAddr, path: String },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

        let command = match (name.as_str(), rest.as_slice()) {
            ("device", [id]) => Command::Device(id.to_string()),
            ("devices", flags) => Command::Devices(parse_device_query(flags)?),
            ("register", [imei]) => Command::Register {
                imei: imei.to_string(),
                timeout: None,
            },
            ("register", [imei, timeout]) => Command::Register {
                imei: imei.to_string(),
                timeout: Some(timeout.parse().context("timeout must be a number of seconds")?),
            },
            ("rename", [id, name]) => Command::Rename {
                device_id: id.to_string(),
                name: name.to_string(),
            },
            ("delete", [id]) => Command::Delete(id.to_string()),
            ("command", [device, service, method, extra @ ..]) if extra.len() <= 2 => {
                let params: Value = match extra.first() {
                    Some(json) => serde_json::from_str(json).context("params must be valid JSON")?,
                    None => Value::Object(Default::default()),
                };
                let mut command = DeviceCommand::new(*device, *service, *method, params);
                if let Some(expire) = extra.get(1) {
                    command = command.expire_after(expire.parse().context("expire-secs must be a number")?);
                }
                Command::Send(command)
            }
            ("subscribe", [url]) => Command::Subscribe {
                callback_url: url.to_string(),
                notify_type: NotifyType::DeviceDataChanged,
            },
            ("subscribe", [url, kind]) => Command::Subscribe {
                callback_url: url.to_string(),
                notify_type: kind.parse().map_err(anyhow::Error::msg)?,
            },
            ("listen", [addr]) => Command::Listen {
                addr: addr.parse().context("bind address must look like 0.0.0.0:8080")?,
                path: "/".to_string(),
            },
            ("listen", [addr, path]) => {
                if !path.starts_with('/') {
                    bail!("listen path must start with '/': {path}");
                }
                Command::Listen {
                    addr: addr.parse().context("bind address must look like 0.0.0.0:8080")?,
                    path: path.to_string(),
                }
            }
            ("help" | "--help" | "-h", _) => Command::Help,
            (other, _) => bail!("unknown command or wrong arguments: {other}"),
        };
        Ok(command)
    }

    pub async fn run(self, client: &OceanClient) -> Result<()> {
        match self {
            Command::Device(id) => print_json(&client.get_device(&id).await?),
            Command::Devices(query) => print_json(&client.get_devices(&query).await?),
            Command::Register { imei, timeout } => {
                print_json(&client.register_device(&imei, RegisterOptions { timeout }).await?)
            }
            Command::Rename { device_id, name } => {
                client.set_device_info(&device_id, &name).await?;
                println!("Device {device_id} renamed to {name}");
                Ok(())
            }
            Command::Delete(id) => {
                client.delete_device(&id).await?;
                println!("Device {id} deleted");
                Ok(())
            }
            Command::Send(command) => {
                client.send_command(&command).await?;
                println!("Command {} sent to {}", command.method, command.device_id);
                Ok(())
            }
            Command::Subscribe { callback_url, notify_type } => {
                print_json(&client.subscribe_to(notify_type, &callback_url).await?)
            }
            Command::Listen { addr, path } => listen(addr, &path).await,
            Command::Help => {
                println!("{USAGE}");
                Ok(())
            }
        }
    }
}

fn parse_device_query(flags: &[&str]) -> Result<DeviceQuery> {
    let mut query = DeviceQuery::default();
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .with_context(|| format!("{flag} needs a value"))?
            .to_string();
        match *flag {
            "--page" => query.page_no = value.parse().context("--page must be a number")?,
            "--page-size" => query.page_size = Some(value.parse().context("--page-size must be a number")?),
            "--gateway" => query.gateway_id = Some(value),
            "--status" => query.status = Some(value),
            "--node-type" => query.node_type = Some(value),
            other => bail!("unknown devices option: {other}"),
        }
    }
    Ok(query)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn listen(addr: SocketAddr, path: &str) -> Result<()> {
    let (sender, mut receiver) = mpsc::channel(NOTIFICATION_BUFFER);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, path, "Listening for notifications");

    let path = path.to_string();
    let server = tokio::spawn(async move { notify::serve(listener, &path, sender).await });

    while let Some(notification) = receiver.recv().await {
        match notification {
            Notification::DeviceDataChanged(change) => print_json(&change)?,
            Notification::Other { payload, .. } => print_json(&payload)?,
        }
    }

    server.await.context("Notification server task failed")??;
    Ok(())
}
