//! Bridge Relay Service
//!
//! Runs a lock-and-mint migration bridge in-process and relays its messages.
//!
//! ## Overview
//!
//! The service:
//! 1. Deploys both ledgers, the source and destination endpoints and the relay from config
//! 2. Sets trusted remotes on both endpoints and funds the operator
//! 3. Delivers relayed messages on a polling loop
//! 4. Reads operator commands from stdin until `quit`, EOF or Ctrl-C

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use bridge_relay::config::{Config, CONFIG_PATH_ENV, TESTNET_CONFIG_PATH};
use bridge_relay::{BridgeNetwork, OperatorCommand, RelayWorker, RelayWorkerConfig};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point that initializes and runs the bridge relay.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Wires the bridge network and starts the relay worker
/// 4. Runs the operator console until shutdown
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging for debugging and monitoring
    tracing_subscriber::fmt::init();

    info!("Starting Bridge Relay Service");

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("Bridge Relay Service");
        println!();
        println!("Usage: bridge-relay [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --testnet, -t     Use testnet configuration ({})", TESTNET_CONFIG_PATH);
        println!("  --config <path>   Use custom config file path (overrides --testnet)");
        println!("  --help, -h        Show this help message");
        println!();
        println!("Environment variables:");
        println!("  {}    Path to config file (overrides --config and --testnet)", CONFIG_PATH_ENV);
        return Ok(());
    }

    let mut config_path = None;

    let mut i = 1; // Skip program name
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
            i += 1;
        }
        i += 1;
    }

    // The environment variable wins over both flags
    let config = if std::env::var(CONFIG_PATH_ENV).is_ok() {
        Config::load()?
    } else if let Some(path) = config_path {
        info!("Using custom config: {}", path);
        Config::load_from(&path)?
    } else if args.iter().any(|arg| arg == "--testnet" || arg == "-t") {
        info!("Using testnet configuration");
        Config::load_from(TESTNET_CONFIG_PATH)?
    } else {
        Config::load()?
    };
    info!("Configuration loaded successfully");

    let network = BridgeNetwork::from_config(&config).context("Failed to wire bridge network")?;
    let network = Arc::new(Mutex::new(network));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = RelayWorker::new(RelayWorkerConfig::from_config(&config), Arc::clone(&network));
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    info!("Bridge relay initialized successfully. Type 'help' for commands.");

    run_console(&network).await?;

    let _ = shutdown_tx.send(true);
    worker_handle
        .await
        .context("Relay worker task panicked")??;

    info!("Bridge relay stopped");
    Ok(())
}

// ============================================================================
// OPERATOR CONSOLE
// ============================================================================

/// Reads commands from stdin and executes them one at a time under the network lock.
async fn run_console(network: &Arc<Mutex<BridgeNetwork>>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C");
                return Ok(());
            }
        };

        let Some(line) = line else {
            info!("stdin closed");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<OperatorCommand>() {
            Ok(OperatorCommand::Quit) => return Ok(()),
            Ok(command) => {
                let output = command.execute(&mut *network.lock().await);
                println!("{}", output);
            }
            Err(e) => {
                warn!("Rejected command '{}': {}", line.trim(), e);
                println!("{}", e);
            }
        }
    }
}
