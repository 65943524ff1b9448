//! Migration Bridge Library
//!
//! Lock-and-mint token migration between two execution domains over an asynchronous,
//! at-least-once message relay. The source endpoint locks tokens and dispatches a fixed-width
//! message; the destination endpoint authenticates it and mints. Messages that cannot be applied
//! are parked by the relay and replayed by an operator.

pub mod destination;
pub mod error;
pub mod events;
pub mod ledger;
pub mod message;
pub mod relay;
pub mod source;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use destination::DestinationEndpoint;
pub use error::{BridgeError, LedgerError, PayloadError, RelayError};
pub use events::{BridgeEvent, EventLog};
pub use ledger::{Ledger, MockLedger};
pub use message::{MigrationPayload, MigrationRequest, MIGRATION_PAYLOAD_SIZE};
pub use relay::{
    DeliveryOutcome, FeeModel, InboundRoute, LocalRelay, MessageReceiver, OutboundMessage,
    RelayAdapter, SendReceipt, SendRequest, StoredPayload,
};
pub use source::SourceEndpoint;
pub use types::{Address, CallContext, DomainId, RemotePath};
