//! Error definitions for the migration bridge.

use thiserror::Error;

use crate::types::{Address, DomainId};

/// Errors surfaced by the source and destination endpoints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("AmountIsZero")]
    AmountIsZero,

    #[error("DstAddressIsZero")]
    DstAddressIsZero,

    #[error("TooSmallFee: declared={declared}, attached={attached}, required={required}")]
    TooSmallFee {
        declared: u128,
        attached: u128,
        required: u128,
    },

    /// The circuit breaker is open.
    #[error("Pausable: paused")]
    Paused,

    /// The circuit breaker is already closed.
    #[error("Pausable: not paused")]
    Unpaused,

    #[error("Ownable: caller is not the owner")]
    NotOwner,

    #[error("Ownable: new owner is the zero address")]
    ZeroOwner,

    #[error("Untrusted remote: source domain {0} or path not configured")]
    UntrustedRemote(DomainId),

    #[error("Destination domain {0} is not a trusted remote")]
    DestinationNotTrusted(DomainId),

    #[error("Invalid relay caller: {0}")]
    InvalidRelayCaller(Address),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Errors raised by a ledger collaborator. Propagated verbatim by the endpoints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ERC20: insufficient allowance")]
    AllowanceExceeded { allowance: u128, requested: u128 },

    #[error("ERC20: transfer amount exceeds balance")]
    BalanceExceeded { balance: u128, requested: u128 },

    #[error("Pausable: paused")]
    LedgerPaused,

    #[error("Pausable: not paused")]
    LedgerNotPaused,

    #[error("ERC20: zero address")]
    ZeroAddress,

    #[error("ERC20: total supply overflow")]
    SupplyOverflow,
}

/// Errors raised by the relay adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Unknown domain: {0}")]
    UnknownDomain(DomainId),

    #[error("Malformed destination path: expected 40 bytes, got {0}")]
    MalformedPath(usize),

    #[error("Destination path names {path_local} as its local address, sender is {sender}")]
    PathSenderMismatch { sender: Address, path_local: Address },

    #[error("Not enough native for fees: attached={attached}, required={required}")]
    InsufficientFee { attached: u128, required: u128 },

    #[error("Fee computation overflow")]
    FeeOverflow,

    #[error("Fee model quotes a zero fee")]
    ZeroFee,

    #[error("Wrong sequence: expected {expected}, got {actual}")]
    WrongSequence { expected: u64, actual: u64 },

    #[error("Route from domain {0} is blocked by a stored payload")]
    RouteBlocked(DomainId),

    #[error("Receiver mismatch: message addressed to {expected}, got {actual}")]
    ReceiverMismatch { expected: Address, actual: Address },

    #[error("Receiver domain mismatch: message addressed to domain {expected}, got {actual}")]
    ReceiverDomainMismatch { expected: DomainId, actual: DomainId },

    #[error("No stored payload for domain {0}")]
    NoStoredPayload(DomainId),

    #[error("Invalid payload: does not match the stored payload")]
    InvalidPayload,

    #[error("Retry failed: {0}")]
    RetryFailed(String),

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

/// Errors raised while encoding or decoding fixed-width payloads and addresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Reserved bytes must be zero")]
    NonZeroReserved,

    #[error("Amount does not fit in 128 bits")]
    AmountOverflow,

    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}
