//! Source endpoint: gatekeeps outbound migrations, charges relay fees, locks tokens in escrow.
//!
//! The endpoint starts paused. An owner must configure the trusted remote for the destination
//! domain and then unpause before the first migration.

use tracing::{info, warn};

use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventLog};
use crate::ledger::Ledger;
use crate::message::{MigrationPayload, MigrationRequest};
use crate::relay::{RelayAdapter, SendReceipt, SendRequest};
use crate::state::{CircuitBreaker, Ownable, TrustedRemotes};
use crate::types::{Address, CallContext, DomainId, RemotePath};

/// Outbound half of the bridge. Locked tokens stay at [`SourceEndpoint::address`] on the ledger.
#[derive(Debug)]
pub struct SourceEndpoint<L: Ledger> {
    address: Address,
    domain: DomainId,
    dst_domain: DomainId,
    ledger: L,
    ownable: Ownable,
    breaker: CircuitBreaker,
    trusted: TrustedRemotes,
    events: EventLog,
}

impl<L: Ledger> SourceEndpoint<L> {
    pub fn new(address: Address, owner: Address, domain: DomainId, dst_domain: DomainId, ledger: L) -> Self {
        Self {
            address,
            domain,
            dst_domain,
            ledger,
            ownable: Ownable::new(owner),
            breaker: CircuitBreaker::new(true),
            trusted: TrustedRemotes::new(),
            events: EventLog::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn domain(&self) -> DomainId {
        self.domain
    }

    pub fn dst_domain(&self) -> DomainId {
        self.dst_domain
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn paused(&self) -> bool {
        self.breaker.is_paused()
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

    /// Quotes the relay fee for migrating `amount` to `recipient`. Callable while paused.
    pub fn estimate_fee<R: RelayAdapter + ?Sized>(
        &self,
        relay: &R,
        amount: u128,
        recipient: Address,
    ) -> Result<u128, BridgeError> {
        MigrationRequest::validate_shape(amount, &recipient)?;
        let payload = MigrationPayload::new(recipient, amount).encode();
        Ok(relay.estimate_fee(self.dst_domain, &self.address, &payload)?)
    }

    /// Locks `amount` from the caller and dispatches a mint message for `recipient`.
    ///
    /// `ctx.value` is forwarded to the relay as the native fee; the relay refunds any excess
    /// through the returned receipt. The relay vets the request before any tokens move; if `send`
    /// still fails, the debit and the allowance it consumed are reversed.
    pub fn migrate<R: RelayAdapter + ?Sized>(
        &mut self,
        relay: &mut R,
        ctx: &CallContext,
        amount: u128,
        recipient: Address,
        declared_fee: u128,
    ) -> Result<SendReceipt, BridgeError> {
        self.breaker.when_not_paused()?;
        MigrationRequest::validate_shape(amount, &recipient)?;

        let required = self.estimate_fee(&*relay, amount, recipient)?;
        if declared_fee == 0 || ctx.value < required {
            return Err(BridgeError::TooSmallFee {
                declared: declared_fee,
                attached: ctx.value,
                required,
            });
        }

        let destination = self
            .trusted
            .get(self.dst_domain)
            .filter(|path| !path.is_empty())
            .cloned()
            .ok_or(BridgeError::DestinationNotTrusted(self.dst_domain))?;

        let request = MigrationRequest {
            amount,
            recipient,
            paid_fee: ctx.value,
        };
        let send = SendRequest {
            src_domain: self.domain,
            dst_domain: self.dst_domain,
            destination,
            sender: self.address,
            payload: request.payload().encode(),
            native_fee: request.paid_fee,
        };

        // Nothing moves until the relay has accepted the request shape
        relay.check_send(&send)?;
        self.ledger.debit_from(&self.address, &ctx.caller, amount)?;

        let receipt = match relay.send(send) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Send rejected by relay, releasing {} to {}: {}", amount, ctx.caller, e);
                self.ledger.undo_debit(&self.address, &ctx.caller, amount)?;
                return Err(e.into());
            }
        };

        info!(
            "Migration dispatched: sender={}, recipient={}, amount={}, sequence={}, fee={}",
            ctx.caller, recipient, amount, receipt.sequence, receipt.fee
        );
        self.events.emit(BridgeEvent::MigrationStarted {
            sender: ctx.caller,
            amount,
            sequence: receipt.sequence,
        });
        Ok(receipt)
    }

    pub fn pause(&mut self, ctx: &CallContext) -> Result<(), BridgeError> {
        self.ownable.only_owner(&ctx.caller)?;
        self.breaker.pause(ctx.caller, &mut self.events)
    }

    pub fn unpause(&mut self, ctx: &CallContext) -> Result<(), BridgeError> {
        self.ownable.only_owner(&ctx.caller)?;
        self.breaker.unpause(ctx.caller, &mut self.events)
    }

    /// Stores `remote_and_local` for `domain`. Overwrites any existing entry.
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
