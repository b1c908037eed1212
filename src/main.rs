// src/main.rs

//! The main entry point for the chatrelay server application.

use anyhow::Result;
use chatrelay::config::Config;
use chatrelay::server;
use std::env;
use std::path::Path;
use tracing::{error, warn};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Collect command-line arguments to decide the execution mode.
    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.contains(&"--version".to_string()) {
        println!("chatrelay version {VERSION}");
        return Ok(());
    }

    // The configuration path can be provided via --config; otherwise "config.toml"
    // is used if present.
    let explicit_config = match args.iter().position(|arg| arg == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Some(path.as_str()),
            None => {
                eprintln!("--config flag requires a value");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let mut missing_default_config = false;
    let mut config = match explicit_config {
        Some(path) => load_config_or_exit(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config_or_exit(DEFAULT_CONFIG_PATH),
        None => {
            missing_default_config = true;
            Config::default()
        }
    };

    // Override port if provided as a command-line argument
    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        if let Some(port_str) = args.get(port_index + 1) {
            let Ok(port) = port_str.parse::<u16>() else {
                eprintln!("Invalid port number: {port_str}");
                std::process::exit(1);
            };
            if let Err(e) = config.override_port(port) {
                eprintln!("Invalid --port {port_str}: {e:#}");
                std::process::exit(1);
            }
        } else {
            eprintln!("--port flag requires a value");
            std::process::exit(1);
        }
    }

    // Get initial log level from env var or config.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true), // Enable ANSI color codes for log levels.
        )
        .init();

    if missing_default_config {
        warn!("No \"{DEFAULT_CONFIG_PATH}\" found. Running with built-in defaults.");
    }

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Loads the configuration from `path`, exiting the process if it is invalid:
/// the server cannot run without a valid configuration.
fn load_config_or_exit(path: &str) -> Config {
    match Config::from_file(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from \"{path}\": {e:#}");
            std::process::exit(1);
        }
    }
}
