//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the bridge relay service.
//! Configuration includes both bridge domains, the relay's fee model and polling interval, and
//! the operator account used by the console.

use migration_bridge::{Address, DomainId, FeeModel, MIGRATION_PAYLOAD_SIZE};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "BRIDGE_RELAY_CONFIG_PATH";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/bridge-relay.toml";

/// Testnet configuration file path.
pub const TESTNET_CONFIG_PATH: &str = "config/bridge-relay_testnet.toml";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
///
/// This structure holds configuration for:
/// - The source domain (where tokens are locked)
/// - The destination domain (where tokens are minted)
/// - The relay connecting them
/// - The operator account driving the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source domain configuration (lock side)
    pub source: DomainConfig,
    /// Destination domain configuration (mint side)
    pub destination: DomainConfig,
    /// Relay configuration (address, polling, fees)
    pub relay: RelayConfig,
    /// Operator account configuration
    pub operator: OperatorConfig,
}

/// Configuration for one bridge domain and the endpoint deployed on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Human-readable name for the domain
    pub name: String,
    /// Relay endpoint ID of the domain
    pub domain_id: DomainId,
    /// Address of the bridge endpoint on this domain
    pub endpoint_addr: Address,
    /// Token name on this domain's ledger
    #[serde(default = "default_token_name")]
    pub token_name: String,
    /// Token symbol on this domain's ledger
    #[serde(default = "default_token_symbol")]
    pub token_symbol: String,
}

fn default_token_name() -> String {
    "TOKEN".to_string()
}

fn default_token_symbol() -> String {
    "TKN".to_string()
}

/// Relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the relay presents to destination endpoints
    pub address: Address,
    /// Polling interval for pending deliveries in milliseconds
    pub polling_interval_ms: u64,
    /// Fee model used to quote and charge sends
    #[serde(default)]
    pub fee: FeeConfig,
}

/// Fee model parameters as written in TOML.
///
/// TOML integers are 64-bit, so every parameter is bounded by `u64` here and widened when the
/// relay is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Fixed gas charged per message
    pub base_gas: u64,
    /// Gas charged per payload byte
    pub gas_per_byte: u64,
    /// Execution gas reserved for the destination handler
    pub gas_limit: u64,
    /// Destination gas price
    pub dst_gas_price: u64,
    /// Destination/source native price ratio scaled by 1e10
    pub dst_price_ratio: u64,
    /// Flat oracle fee
    pub oracle_fee: u64,
    /// Protocol fee in basis points
    pub protocol_fee_bp: u32,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self::from(&FeeModel::default())
    }
}

impl From<&FeeModel> for FeeConfig {
    fn from(model: &FeeModel) -> Self {
        Self {
            base_gas: model.base_gas,
            gas_per_byte: model.gas_per_byte,
            gas_limit: model.gas_limit,
            dst_gas_price: u64::try_from(model.dst_gas_price).unwrap_or(u64::MAX),
            dst_price_ratio: u64::try_from(model.dst_price_ratio).unwrap_or(u64::MAX),
            oracle_fee: u64::try_from(model.oracle_fee).unwrap_or(u64::MAX),
            protocol_fee_bp: model.protocol_fee_bp,
        }
    }
}

impl FeeConfig {
    pub fn to_fee_model(&self) -> FeeModel {
        FeeModel {
            base_gas: self.base_gas,
            gas_per_byte: self.gas_per_byte,
            gas_limit: self.gas_limit,
            dst_gas_price: self.dst_gas_price as u128,
            dst_price_ratio: self.dst_price_ratio as u128,
            oracle_fee: self.oracle_fee as u128,
            protocol_fee_bp: self.protocol_fee_bp,
        }
    }
}

/// Operator account configuration.
///
/// The operator owns both endpoints and both ledgers, and is the account the console acts as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Owner of both endpoints
    pub owner_addr: Address,
    /// Tokens minted to the owner on the source ledger at startup
    #[serde(default)]
    pub initial_balance: u64,
    /// Open the source circuit breaker after wiring
    #[serde(default)]
    pub unpause_on_start: bool,
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates the configuration.
    ///
    /// This function ensures that:
    /// - Source and destination domain IDs differ
    /// - No configured address is the zero address
    /// - Source and destination endpoint addresses differ
    /// - The polling interval is non-zero
    /// - The fee model quotes a positive fee for a migration payload
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - A check failed
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source.domain_id == self.destination.domain_id {
            return Err(anyhow::anyhow!(
                "Configuration error: Source and destination have the same domain ID {}. Each domain must have a unique domain ID.",
                self.source.domain_id
            ));
        }

        let addresses = [
            ("source.endpoint_addr", &self.source.endpoint_addr),
            ("destination.endpoint_addr", &self.destination.endpoint_addr),
            ("relay.address", &self.relay.address),
            ("operator.owner_addr", &self.operator.owner_addr),
        ];
        for (field, address) in addresses {
            if address.is_zero() {
                return Err(anyhow::anyhow!(
                    "Configuration error: {} must not be the zero address",
                    field
                ));
            }
        }

        if self.source.endpoint_addr == self.destination.endpoint_addr {
            return Err(anyhow::anyhow!(
                "Configuration error: Source and destination endpoints share the address {}",
                self.source.endpoint_addr
            ));
        }

        if self.relay.polling_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: relay.polling_interval_ms must be greater than zero"
            ));
        }

        self.relay
            .fee
            .to_fee_model()
            .quote(MIGRATION_PAYLOAD_SIZE)
            .map_err(|e| anyhow::anyhow!("Configuration error: relay.fee is unusable: {}", e))?;

        Ok(())
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from the TOML file.
    ///
    /// The path is taken from `BRIDGE_RELAY_CONFIG_PATH` if set, otherwise
    /// `config/bridge-relay.toml`. If the file doesn't exist, returns an error asking the user
    /// to copy the template.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(config_path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_toml_str(&content)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/bridge-relay.template.toml config/bridge-relay.toml\n\
                Then edit config/bridge-relay.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Creates a default configuration for local development.
    ///
    /// Domain IDs follow the relay's Avalanche (source) and Ethereum (destination) endpoints.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self {
            source: DomainConfig {
                name: "avalanche".to_string(),
                domain_id: 106,
                endpoint_addr: Address::repeat_byte(0xa1),
                token_name: default_token_name(),
                token_symbol: default_token_symbol(),
            },
            destination: DomainConfig {
                name: "ethereum".to_string(),
                domain_id: 101,
                endpoint_addr: Address::repeat_byte(0xe1),
                token_name: default_token_name(),
                token_symbol: default_token_symbol(),
            },
            relay: RelayConfig {
                address: Address::repeat_byte(0x1a),
                polling_interval_ms: 2000,
                fee: FeeConfig::default(),
            },
            operator: OperatorConfig {
                owner_addr: Address::repeat_byte(0x0a),
                initial_balance: 1000,
                unpause_on_start: true,
            },
        }
    }
}
