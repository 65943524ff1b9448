//! Bridge Relay Service Library
//!
//! This crate runs the migration bridge in-process: it wires both endpoints and the relay from a
//! TOML configuration, delivers relayed messages on a polling loop, and exposes an operator
//! console for migrations, circuit breaker control and blocked-message retry.

pub mod commands;
pub mod config;
pub mod network;
pub mod relay_worker;

// Re-export commonly used types
pub use commands::{CommandError, OperatorCommand};
pub use config::{Config, DomainConfig, FeeConfig, OperatorConfig, RelayConfig};
pub use network::{BridgeNetwork, TrustSetup};
pub use relay_worker::{RelayWorker, RelayWorkerConfig};
