//! In-process bridge network
//!
//! Wires both ledgers, both endpoints and the relay from a [`Config`], and exposes the operator
//! actions the console and the relay worker drive: trust setup, funding, migration, delivery,
//! circuit breaker control and blocked-message retry.

use anyhow::{Context, Result};
use migration_bridge::{
    Address, BridgeEvent, CallContext, DeliveryOutcome, DestinationEndpoint, DomainId,
    InboundRoute, Ledger, LocalRelay, MessageReceiver, MigrationPayload, MockLedger, RelayAdapter,
    RemotePath, SendReceipt, SourceEndpoint, StoredPayload,
};
use tracing::{debug, info};

use crate::config::Config;

// ============================================================================
// TRUST SETUP RESULT
// ============================================================================

/// Which sides were written by [`BridgeNetwork::configure_trust`]. `false` means the pair was
/// already trusted and left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustSetup {
    pub source_set: bool,
    pub destination_set: bool,
}

// ============================================================================
// BRIDGE NETWORK
// ============================================================================

pub struct BridgeNetwork {
    pub relay: LocalRelay,
    pub source: SourceEndpoint<MockLedger>,
    pub destination: DestinationEndpoint<MockLedger>,
    owner: Address,
    source_name: String,
    destination_name: String,
}

impl BridgeNetwork {
    /// Deploys ledgers, endpoints and relay without any trust or funding. The source starts paused.
    pub fn deploy(config: &Config) -> Result<Self> {
        config.validate().context("Refusing to deploy from an invalid configuration")?;

        let mut relay = LocalRelay::new(config.relay.address, config.relay.fee.to_fee_model());
        relay.connect_domain(config.source.domain_id);
        relay.connect_domain(config.destination.domain_id);

        let owner = config.operator.owner_addr;
        let source = SourceEndpoint::new(
            config.source.endpoint_addr,
            owner,
            config.source.domain_id,
            config.destination.domain_id,
            MockLedger::new(&config.source.token_name, &config.source.token_symbol),
        );
        let destination = DestinationEndpoint::new(
            config.destination.endpoint_addr,
            owner,
            config.destination.domain_id,
            config.relay.address,
            MockLedger::new(&config.destination.token_name, &config.destination.token_symbol),
        );

        info!(
            "Deployed bridge: {} (domain {}, endpoint {}, token {}) -> {} (domain {}, endpoint {}, token {})",
            config.source.name,
            config.source.domain_id,
            config.source.endpoint_addr,
            source.ledger().symbol(),
            config.destination.name,
            config.destination.domain_id,
            config.destination.endpoint_addr,
            destination.ledger().symbol()
        );

        Ok(Self {
            relay,
            source,
            destination,
            owner,
            source_name: config.source.name.clone(),
            destination_name: config.destination.name.clone(),
        })
    }

    /// Deploys and brings the bridge to the state described by the operator section: trust on both
    /// sides, operator funded, breaker opened if requested.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut network = Self::deploy(config)?;
        network.configure_trust()?;
        if config.operator.initial_balance > 0 {
            network.fund(network.owner, config.operator.initial_balance as u128)?;
        }
        if config.operator.unpause_on_start {
            network.set_source_paused(false)?;
        }
        Ok(network)
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn source_domain(&self) -> DomainId {
        self.source.domain()
    }

    pub fn destination_domain(&self) -> DomainId {
        self.source.dst_domain()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }

    fn owner_ctx(&self) -> CallContext {
        CallContext::new(self.owner)
    }

    /// `remote ++ local` the destination expects for messages from the source.
    pub fn inbound_path(&self) -> RemotePath {
        RemotePath::new(&self.source.address(), &self.destination.address())
    }

    /// `remote ++ local` the source uses for the destination.
    pub fn outbound_path(&self) -> RemotePath {
        RemotePath::new(&self.destination.address(), &self.source.address())
    }

    /// Sets the trusted remote on both endpoints, skipping any side already trusting its peer.
    pub fn configure_trust(&mut self) -> Result<TrustSetup> {
        let ctx = self.owner_ctx();
        let dst_domain = self.destination_domain();
        let src_domain = self.source_domain();

        let outbound = self.outbound_path();
        let source_set = if self.source.is_trusted_remote(dst_domain, &outbound) {
            info!("Source already trusts {} ({})", self.destination_name, outbound);
            false
        } else {
            self.source
                .set_trusted_remote(&ctx, dst_domain, outbound)
                .context("Failed to set trusted remote on source")?;
            true
        };

        let inbound = self.inbound_path();
        let destination_set = if self.destination.is_trusted_remote(src_domain, &inbound) {
            info!("Destination already trusts {} ({})", self.source_name, inbound);
            false
        } else {
            self.destination
                .set_trusted_remote(&ctx, src_domain, inbound)
                .context("Failed to set trusted remote on destination")?;
            true
        };

        Ok(TrustSetup {
            source_set,
            destination_set,
        })
    }

    /// Mints `amount` to `account` on the source ledger.
    pub fn fund(&mut self, account: Address, amount: u128) -> Result<()> {
        self.source
            .ledger_mut()
            .mint_to(&account, amount)
            .with_context(|| format!("Failed to mint {} to {}", amount, account))?;
        info!("Funded {} with {} on {}", account, amount, self.source_name);
        Ok(())
    }

    /// Approves `spender` (the source endpoint when `None`) to move `amount` of `owner`'s tokens.
    pub fn approve(&mut self, owner: Address, spender: Option<Address>, amount: u128) -> Address {
        let spender = spender.unwrap_or_else(|| self.source.address());
        self.source.ledger_mut().approve(&owner, &spender, amount);
        info!("Approved {} to spend {} of {}", spender, amount, owner);
        spender
    }

    pub fn estimate_fee(&self, amount: u128, recipient: Address) -> Result<u128> {
        Ok(self.source.estimate_fee(&self.relay, amount, recipient)?)
    }

    /// Migrates `amount` from `caller` to `recipient`. Without a custom fee the current quote is
    /// declared and attached.
    pub fn migrate(
        &mut self,
        caller: Address,
        amount: u128,
        recipient: Address,
        custom_fee: Option<u128>,
    ) -> Result<SendReceipt> {
        let fee = match custom_fee {
            Some(fee) => fee,
            None => self.estimate_fee(amount, recipient)?,
        };
        let ctx = CallContext::new(caller).with_value(fee);
        let receipt = self
            .source
            .migrate(&mut self.relay, &ctx, amount, recipient, fee)
            .with_context(|| format!("migrate({}, {}) failed", amount, recipient))?;
        Ok(receipt)
    }

    /// Delivers every pending message the destination can currently accept.
    pub fn deliver_pending(&mut self) -> Result<Vec<DeliveryOutcome>> {
        let outcomes = self
            .relay
            .deliver_all(&mut self.destination)
            .context("Delivery to destination failed")?;
        if !outcomes.is_empty() {
            debug!("Delivered batch of {} message(s)", outcomes.len());
        }
        Ok(outcomes)
    }

    pub fn set_source_paused(&mut self, paused: bool) -> Result<()> {
        let ctx = self.owner_ctx();
        let result = if paused {
            self.source.pause(&ctx)
        } else {
            self.source.unpause(&ctx)
        };
        result.with_context(|| {
            format!("{} source endpoint failed", if paused { "pause()" } else { "unpause()" })
        })
    }

    /// Halts or resumes the destination ledger.
    pub fn set_destination_token_paused(&mut self, paused: bool) -> Result<()> {
        let ledger = self.destination.ledger_mut();
        let result = if paused { ledger.pause() } else { ledger.unpause() };
        result.with_context(|| {
            format!("{} destination token failed", if paused { "pause()" } else { "unpause()" })
        })
    }

    /// Replays the blocked migration of `amount` to `user`, rebuilding path and payload from
    /// public data only.
    pub fn retry(&mut self, user: Address, amount: u128) -> Result<u64> {
        let path = self.inbound_path();
        let payload = MigrationPayload::new(user, amount).encode();
        info!("Payload: 0x{}", hex::encode(&payload));
        info!("srcAddress: {}", path);

        let src_domain = self.source_domain();
        let sequence = self
            .relay
            .retry_payload(src_domain, &path, &payload, &mut self.destination)
            .with_context(|| format!("retryPayload({}, {}) failed", src_domain, path))?;
        Ok(sequence)
    }

    pub fn has_blocked(&self) -> bool {
        self.relay
            .has_stored_payload(self.source_domain(), &self.inbound_path())
    }

    pub fn blocked(&self) -> Vec<(InboundRoute, StoredPayload)> {
        self.relay
            .blocked_messages()
            .map(|(route, stored)| (route.clone(), stored.clone()))
            .collect()
    }

    /// (source ledger balance, destination ledger balance) of `account`.
    pub fn balances(&self, account: &Address) -> (u128, u128) {
        (
            self.source.ledger().balance_of(account),
            self.destination.ledger().balance_of(account),
        )
    }

    pub fn escrowed(&self) -> u128 {
        self.source.ledger().balance_of(&self.source.address())
    }

    /// Every event recorded so far, tagged with the component that emitted it.
    pub fn events(&self) -> Vec<(&'static str, BridgeEvent)> {
        let source = self.source.events().events().iter().map(|e| ("source", e.clone()));
        let relay = self.relay.events().events().iter().map(|e| ("relay", e.clone()));
        let destination = self
            .destination
            .events()
            .events()
            .iter()
            .map(|e| ("destination", e.clone()));
        source.chain(relay).chain(destination).collect()
    }
}
