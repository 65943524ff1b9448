//! Relay delivery worker
//!
//! Polls the relay's in-flight queue and hands pending messages to the destination endpoint.
//! Delivery is decoupled from `migrate`: the operator console only sends, this loop delivers.

use anyhow::Result;
use migration_bridge::DeliveryOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::network::BridgeNetwork;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the relay worker.
#[derive(Debug, Clone)]
pub struct RelayWorkerConfig {
    /// Polling interval in milliseconds
    pub polling_interval_ms: u64,
}

impl RelayWorkerConfig {
    /// Create worker config from main config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            polling_interval_ms: config.relay.polling_interval_ms,
        }
    }
}

// ============================================================================
// RELAY WORKER
// ============================================================================

pub struct RelayWorker {
    config: RelayWorkerConfig,
    network: Arc<Mutex<BridgeNetwork>>,
}

impl RelayWorker {
    pub fn new(config: RelayWorkerConfig, network: Arc<Mutex<BridgeNetwork>>) -> Self {
        Self { config, network }
    }

    /// Delivers everything currently deliverable. Holds the network lock for the whole batch.
    pub async fn tick(&self) -> Result<Vec<DeliveryOutcome>> {
        let mut network = self.network.lock().await;
        let outcomes = network.deliver_pending()?;

        for outcome in &outcomes {
            match outcome {
                DeliveryOutcome::Delivered {
                    src_domain,
                    sequence,
                } => info!(
                    "Delivered message: src_domain={}, sequence={}",
                    src_domain, sequence
                ),
                DeliveryOutcome::Stored {
                    src_domain,
                    sequence,
                    reason,
                } => warn!(
                    "Message stored as blocked: src_domain={}, sequence={}, reason='{}'",
                    src_domain, sequence, reason
                ),
                DeliveryOutcome::Duplicate {
                    src_domain,
                    sequence,
                } => debug!(
                    "Duplicate message dropped: src_domain={}, sequence={}",
                    src_domain, sequence
                ),
            }
        }
        Ok(outcomes)
    }

    /// Runs the polling loop until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Starting relay worker: polling_interval={}ms",
            self.config.polling_interval_ms
        );

        let interval = Duration::from_millis(self.config.polling_interval_ms);

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.tick().await {
                error!("Error delivering pending messages: {:#}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Relay worker stopped");
        Ok(())
    }
}
