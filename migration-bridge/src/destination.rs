//! Destination endpoint: authenticates relayed messages and mints the migrated amount.

use tracing::{error, info};

use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventLog};
use crate::ledger::Ledger;
use crate::message::MigrationPayload;
use crate::relay::MessageReceiver;
use crate::state::{Ownable, TrustedRemotes};
use crate::types::{Address, CallContext, DomainId, RemotePath};

/// Inbound half of the bridge. Only accepts calls from the configured relay address.
#[derive(Debug)]
pub struct DestinationEndpoint<L: Ledger> {
    address: Address,
    domain: DomainId,
    relay: Address,
    ledger: L,
    ownable: Ownable,
    trusted: TrustedRemotes,
    events: EventLog,
}

impl<L: Ledger> DestinationEndpoint<L> {
    pub fn new(address: Address, owner: Address, domain: DomainId, relay: Address, ledger: L) -> Self {
        Self {
            address,
            domain,
            relay,
            ledger,
            ownable: Ownable::new(owner),
            trusted: TrustedRemotes::new(),
            events: EventLog::new(),
        }
    }

    pub fn relay(&self) -> Address {
        self.relay
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BridgeEvent> {
        self.events.take()
    }

    pub fn set_trusted_remote(
        &mut self,
        ctx: &CallContext,
        domain: DomainId,
        remote_and_local: RemotePath,
    ) -> Result<(), BridgeError> {
        self.ownable.only_owner(&ctx.caller)?;
        self.trusted.set(domain, remote_and_local, &mut self.events);
        Ok(())
    }

    pub fn is_trusted_remote(&self, domain: DomainId, remote_and_local: &RemotePath) -> bool {
        self.trusted.is_trusted(domain, remote_and_local)
    }

    pub fn trusted_remote(&self, domain: DomainId) -> Option<&RemotePath> {
        self.trusted.get(domain)
    }

    pub fn transfer_ownership(&mut self, ctx: &CallContext, new_owner: Address) -> Result<(), BridgeError> {
        self.ownable
            .transfer_ownership(&ctx.caller, new_owner, &mut self.events)
    }
}

impl<L: Ledger> MessageReceiver for DestinationEndpoint<L> {
    fn domain(&self) -> DomainId {
        self.domain
    }

    fn address(&self) -> Address {
        self.address
    }

    /// Mints `amount` to the payload recipient. Every check runs before the ledger is touched,
    /// and a ledger failure leaves no partial state.
    fn on_message(
        &mut self,
        caller: &Address,
        src_domain: DomainId,
        path: &RemotePath,
        sequence: u64,
        payload: &[u8],
    ) -> Result<(), BridgeError> {
        if *caller != self.relay {
            error!("Invalid relay caller: expected={}, got={}", self.relay, caller);
            return Err(BridgeError::InvalidRelayCaller(*caller));
        }

        if !self.trusted.is_trusted(src_domain, path) {
            error!(
                "Untrusted remote: src_domain={}, expected={:?}, got={}",
                src_domain,
                self.trusted.get(src_domain).map(|p| p.to_string()),
                path
            );
            return Err(BridgeError::UntrustedRemote(src_domain));
        }

        let MigrationPayload { recipient, amount } = MigrationPayload::decode(payload)?;

        self.ledger.mint_to(&recipient, amount)?;

        info!(
            "Migration finished: recipient={}, amount={}, src_domain={}, sequence={}",
            recipient, amount, src_domain, sequence
        );
        self.events.emit(BridgeEvent::MigrationFinished {
            recipient,
            amount,
            sequence,
        });
        Ok(())
    }
}
