//! Shared test helpers for the bridge relay tests
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy addresses and domain IDs
//! - **Configuration Builders**: Functions to create test configurations

#![allow(dead_code)]

use bridge_relay::config::{Config, DomainConfig, FeeConfig, OperatorConfig, RelayConfig};
use migration_bridge::{Address, DomainId};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dummy operator address (owner of both endpoints)
pub const DUMMY_OPERATOR_ADDR: &str = "0x0000000000000000000000000000000000000001";

/// Dummy user address (EVM format, 20 bytes)
pub const DUMMY_USER_ADDR: &str = "0x0000000000000000000000000000000000000007";

/// Dummy source endpoint address
pub const DUMMY_SOURCE_ENDPOINT_ADDR: &str = "0x0000000000000000000000000000000000000010";

/// Dummy destination endpoint address
pub const DUMMY_DESTINATION_ENDPOINT_ADDR: &str = "0x0000000000000000000000000000000000000011";

/// Dummy relay address
pub const DUMMY_RELAY_ADDR: &str = "0x0000000000000000000000000000000000000012";

/// Test source domain ID (Avalanche)
pub const TEST_SRC_DOMAIN: DomainId = 106;

/// Test destination domain ID (Ethereum)
pub const TEST_DST_DOMAIN: DomainId = 101;

/// Operator balance minted by the test configuration
pub const TEST_INITIAL_BALANCE: u64 = 1000;

pub fn addr(value: &str) -> Address {
    value.parse().unwrap()
}

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Build a valid in-memory test configuration. The source breaker is left paused.
pub fn build_test_config() -> Config {
    Config {
        source: DomainConfig {
            name: "avalanche".to_string(),
            domain_id: TEST_SRC_DOMAIN,
            endpoint_addr: addr(DUMMY_SOURCE_ENDPOINT_ADDR),
            token_name: "TOKEN".to_string(),
            token_symbol: "TKN".to_string(),
        },
        destination: DomainConfig {
            name: "ethereum".to_string(),
            domain_id: TEST_DST_DOMAIN,
            endpoint_addr: addr(DUMMY_DESTINATION_ENDPOINT_ADDR),
            token_name: "TOKEN".to_string(),
            token_symbol: "TKN".to_string(),
        },
        relay: RelayConfig {
            address: addr(DUMMY_RELAY_ADDR),
            polling_interval_ms: 10,
            fee: FeeConfig::default(),
        },
        operator: OperatorConfig {
            owner_addr: addr(DUMMY_OPERATOR_ADDR),
            initial_balance: TEST_INITIAL_BALANCE,
            unpause_on_start: false,
        },
    }
}

/// Same as [`build_test_config`] with the source breaker opened on start.
pub fn build_unpaused_test_config() -> Config {
    let mut config = build_test_config();
    config.operator.unpause_on_start = true;
    config
}

/// Writes `content` to a unique file in the system temp directory and returns its path.
pub fn write_temp_config(name: &str, content: &str) -> String {
    let path = std::env::temp_dir().join(format!(
        "bridge-relay-{}-{}.toml",
        name,
        std::process::id()
    ));
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}
