//! oceanlink - command-line access to an OceanConnect application.
//!
//! Registers, inspects, renames and deletes devices, sends commands,
//! manages notification subscriptions and can run a local receiver for the
//! notifications the platform pushes back.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use oceanlink_core::{ClientConfig, OceanClient};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

/// Application name used for the config directory path
const APP_NAME: &str = "oceanlink";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the config file location
const CONFIG_ENV: &str = "OCEANLINK_CONFIG";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
    Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
}

/// Split `--config <path>` off the argument list.
fn take_config_flag(args: &mut Vec<String>) -> Result<Option<PathBuf>> {
    let Some(pos) = args.iter().position(|a| a == "--config") else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        anyhow::bail!("--config needs a path");
    }
    let path = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(PathBuf::from(path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = match take_config_flag(&mut args)? {
        Some(path) => path,
        None => match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_config_path()?,
        },
    };

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}\n\n{}", commands::USAGE);
            std::process::exit(2);
        }
    };
    if let Command::Help = command {
        println!("{}", commands::USAGE);
        return Ok(());
    }

    let config = ClientConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    info!(url = %config.url, app_id = %config.app_id, "Configuration loaded");

    let client = OceanClient::new(config).context("Failed to create API client")?;
    command.run(&client).await
}
