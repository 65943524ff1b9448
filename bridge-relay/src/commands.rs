//! Operator console commands
//!
//! One command per line, executed against a [`BridgeNetwork`] as the configured operator.
//! Every command reports success or failure as a single `✅` / `❌` line followed by details.

use std::str::FromStr;

use migration_bridge::{Address, BridgeEvent, DeliveryOutcome, Ledger};
use serde::Serialize;
use thiserror::Error;

use crate::network::BridgeNetwork;

pub const HELP: &str = "\
Commands:
  approve <amount> [spender]     Approve the source endpoint (or spender) to move operator tokens
  mint <amount>                  Mint tokens to the operator on the source ledger
  migrate <amount> [fee]         Migrate tokens to the operator on the destination
  pause [--token] [--unpause]    Pause the source endpoint (or the destination token)
  retry <user> <amount>          Retry a blocked migration of <amount> to <user>
  trust                          Set trusted remotes on both endpoints
  deliver                        Deliver pending messages now
  block                          Store the next delivered message as blocked
  balance [address]              Show balances on both ledgers
  blocked                        List blocked messages
  events                         Dump all events as JSON
  status                         Show bridge status
  help                           Show this help message
  quit                           Stop the service";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),

    #[error("Missing argument <{0}>")]
    MissingArgument(&'static str),

    #[error("Invalid {name}: '{value}'")]
    InvalidArgument { name: &'static str, value: String },

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Approve { amount: u128, spender: Option<Address> },
    Mint { amount: u128 },
    Migrate { amount: u128, fee: Option<u128> },
    Pause { token: bool, unpause: bool },
    Retry { user: Address, amount: u128 },
    Trust,
    Deliver,
    Block,
    Balance { account: Option<Address> },
    Blocked,
    Events,
    Status,
    Help,
    Quit,
}

fn parse_amount(name: &'static str, value: &str) -> Result<u128, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

fn parse_address(name: &'static str, value: &str) -> Result<Address, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

impl FromStr for OperatorCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = parts.collect();

        let required = |index: usize, name: &'static str| {
            args.get(index)
                .copied()
                .ok_or(CommandError::MissingArgument(name))
        };
        let no_more = |count: usize| match args.get(count) {
            Some(extra) => Err(CommandError::UnexpectedArgument(extra.to_string())),
            None => Ok(()),
        };

        let command = match name {
            "approve" => {
                no_more(2)?;
                OperatorCommand::Approve {
                    amount: parse_amount("amount", required(0, "amount")?)?,
                    spender: args
                        .get(1)
                        .map(|s| parse_address("spender", s))
                        .transpose()?,
                }
            }
            "mint" => {
                no_more(1)?;
                OperatorCommand::Mint {
                    amount: parse_amount("amount", required(0, "amount")?)?,
                }
            }
            "migrate" => {
                no_more(2)?;
                OperatorCommand::Migrate {
                    amount: parse_amount("amount", required(0, "amount")?)?,
                    fee: args.get(1).map(|s| parse_amount("fee", s)).transpose()?,
                }
            }
            "pause" => {
                let mut token = false;
                let mut unpause = false;
                for arg in &args {
                    match *arg {
                        "--token" => token = true,
                        "--unpause" => unpause = true,
                        other => return Err(CommandError::UnexpectedArgument(other.to_string())),
                    }
                }
                OperatorCommand::Pause { token, unpause }
            }
            "retry" => {
                no_more(2)?;
                OperatorCommand::Retry {
                    user: parse_address("user", required(0, "user")?)?,
                    amount: parse_amount("amount", required(1, "amount")?)?,
                }
            }
            "balance" => {
                no_more(1)?;
                OperatorCommand::Balance {
                    account: args
                        .first()
                        .map(|s| parse_address("address", s))
                        .transpose()?,
                }
            }
            "trust" | "deliver" | "block" | "blocked" | "events" | "status" | "help" | "quit"
            | "exit" => {
                no_more(0)?;
                match name {
                    "trust" => OperatorCommand::Trust,
                    "deliver" => OperatorCommand::Deliver,
                    "block" => OperatorCommand::Block,
                    "blocked" => OperatorCommand::Blocked,
                    "events" => OperatorCommand::Events,
                    "status" => OperatorCommand::Status,
                    "help" => OperatorCommand::Help,
                    _ => OperatorCommand::Quit,
                }
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[derive(Serialize)]
struct EventEntry<'a> {
    component: &'a str,
    event: &'a BridgeEvent,
}

fn describe_outcome(outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Delivered {
            src_domain,
            sequence,
        } => format!(" delivered: src_domain={}, sequence={}", src_domain, sequence),
        DeliveryOutcome::Stored {
            src_domain,
            sequence,
            reason,
        } => format!(
            " stored: src_domain={}, sequence={}, reason='{}'",
            src_domain, sequence, reason
        ),
        DeliveryOutcome::Duplicate {
            src_domain,
            sequence,
        } => format!(" duplicate: src_domain={}, sequence={}", src_domain, sequence),
    }
}

impl OperatorCommand {
    /// Runs the command and returns the text to show the operator. Failures of the underlying
    /// operation are reported in the text, not as an error.
    pub fn execute(&self, network: &mut BridgeNetwork) -> String {
        let operator = network.owner();
        let network_name = network.source_name().to_string();

        match self {
            OperatorCommand::Approve { amount, spender } => {
                let spender = network.approve(operator, *spender, *amount);
                format!("✅ [{}] approve({}, {})", network_name, spender, amount)
            }
            OperatorCommand::Mint { amount } => match network.fund(operator, *amount) {
                Ok(()) => format!("✅ [{}] mintOwner({}, {})", network_name, operator, amount),
                Err(e) => format!("❌ [{}] mintOwner({}, {})\n{:#}", network_name, operator, amount, e),
            },
            OperatorCommand::Migrate { amount, fee } => {
                let quote = network.estimate_fee(*amount, operator);
                let header = match (&quote, fee) {
                    (_, Some(fee)) => format!("fee (custom): {}", fee),
                    (Ok(quote), None) => format!("fee: {}", quote),
                    (Err(_), None) => "fee: unavailable".to_string(),
                };
                match network.migrate(operator, *amount, operator, *fee) {
                    Ok(receipt) => format!(
                        "{}\n✅ [{}] migrate({}, {})\n sequence: {}\n refund: {}",
                        header, network_name, amount, operator, receipt.sequence, receipt.refund
                    ),
                    Err(e) => format!(
                        "{}\n❌ [{}] migrate({}, {})\n{:#}",
                        header, network_name, amount, operator, e
                    ),
                }
            }
            OperatorCommand::Pause { token, unpause } => {
                let action = if *unpause { "unpause()" } else { "pause()" };
                let target = if *token { "token" } else { "source" };
                let result = if *token {
                    network.set_destination_token_paused(!unpause)
                } else {
                    network.set_source_paused(!unpause)
                };
                match result {
                    Ok(()) => format!("✅ [{}] {} {}", network_name, target, action),
                    Err(e) => format!("❌ [{}] {} {}\n{:#}", network_name, target, action, e),
                }
            }
            OperatorCommand::Retry { user, amount } => match network.retry(*user, *amount) {
                Ok(sequence) => format!(
                    "✅ [{}] retryPayload() sequence={}",
                    network.destination_name(),
                    sequence
                ),
                Err(e) => format!("❌ [{}] retryPayload()\n{:#}", network.destination_name(), e),
            },
            OperatorCommand::Trust => match network.configure_trust() {
                Ok(setup) => {
                    let side = |set: bool| if set { "set" } else { "*already set*" };
                    format!(
                        "✅ setTrustedRemote: source {}, destination {}",
                        side(setup.source_set),
                        side(setup.destination_set)
                    )
                }
                Err(e) => format!("❌ setTrustedRemote\n{:#}", e),
            },
            OperatorCommand::Deliver => match network.deliver_pending() {
                Ok(outcomes) if outcomes.is_empty() => "✅ nothing to deliver".to_string(),
                Ok(outcomes) => {
                    let lines: Vec<String> = outcomes.iter().map(describe_outcome).collect();
                    format!("✅ deliver: {} message(s)\n{}", outcomes.len(), lines.join("\n"))
                }
                Err(e) => format!("❌ deliver\n{:#}", e),
            },
            OperatorCommand::Block => {
                network.relay.block_next_message();
                "✅ next message will be stored as blocked".to_string()
            }
            OperatorCommand::Balance { account } => {
                let account = account.unwrap_or(operator);
                let (source, destination) = network.balances(&account);
                format!(
                    "{}: {} on {}, {} on {}",
                    account,
                    source,
                    network_name,
                    destination,
                    network.destination_name()
                )
            }
            OperatorCommand::Blocked => {
                let blocked = network.blocked();
                if blocked.is_empty() {
                    return "no blocked messages".to_string();
                }
                blocked
                    .iter()
                    .map(|(route, stored)| {
                        format!(
                            "src_domain={}, path={}, sequence={}, dst={}, payload_len={}, hash=0x{}",
                            route.src_domain,
                            route.path,
                            stored.sequence,
                            stored.dst_address,
                            stored.payload_length,
                            hex::encode(stored.payload_hash)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            OperatorCommand::Events => {
                let events = network.events();
                let entries: Vec<EventEntry<'_>> = events
                    .iter()
                    .map(|(component, event)| EventEntry { component, event })
                    .collect();
                serde_json::to_string_pretty(&entries)
                    .unwrap_or_else(|e| format!("❌ events\n{}", e))
            }
            OperatorCommand::Status => format!(
                "source: {} (domain {}), paused={}, escrowed={}\n\
                 destination: {} (domain {}), token paused={}, supply={}\n\
                 relay: pending={}, blocked={}, fees={}",
                network_name,
                network.source_domain(),
                network.source.paused(),
                network.escrowed(),
                network.destination_name(),
                network.destination_domain(),
                network.destination.ledger().is_paused(),
                network.destination.ledger().total_supply(),
                network.relay.pending_count(),
                network.blocked().len(),
                network.relay.collected_fees()
            ),
            OperatorCommand::Help => HELP.to_string(),
            OperatorCommand::Quit => "Shutting down".to_string(),
        }
    }
}
