//! Audit-trail events emitted by the endpoints and the relay.
//!
//! Every component owns an [`EventLog`]. An event is pushed exactly once per successful state
//! transition and mirrored as a `tracing` record.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{hex_bytes, Address, DomainId, RemotePath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BridgeEvent {
    MigrationStarted {
        sender: Address,
        amount: u128,
        sequence: u64,
    },
    MigrationFinished {
        recipient: Address,
        amount: u128,
        sequence: u64,
    },
    Paused {
        admin: Address,
    },
    Unpaused {
        admin: Address,
    },
    TrustedRemoteSet {
        domain: DomainId,
        path: RemotePath,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    PayloadStored {
        src_domain: DomainId,
        path: RemotePath,
        dst_address: Address,
        sequence: u64,
        #[serde(with = "hex_bytes")]
        payload: Vec<u8>,
        #[serde(with = "hex_bytes")]
        reason: Vec<u8>,
    },
    PayloadCleared {
        src_domain: DomainId,
        path: RemotePath,
        sequence: u64,
        dst_address: Address,
    },
}

impl BridgeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeEvent::MigrationStarted { .. } => "MigrationStarted",
            BridgeEvent::MigrationFinished { .. } => "MigrationFinished",
            BridgeEvent::Paused { .. } => "Paused",
            BridgeEvent::Unpaused { .. } => "Unpaused",
            BridgeEvent::TrustedRemoteSet { .. } => "TrustedRemoteSet",
            BridgeEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            BridgeEvent::PayloadStored { .. } => "PayloadStored",
            BridgeEvent::PayloadCleared { .. } => "PayloadCleared",
        }
    }
}

/// Append-only event log owned by a single component.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<BridgeEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: BridgeEvent) {
        info!(event = event.name(), "{:?}", event);
        self.events.push(event);
    }

    pub fn events(&self) -> &[BridgeEvent] {
        &self.events
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&mut self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }

    pub fn last(&self) -> Option<&BridgeEvent> {
        self.events.last()
    }
}
