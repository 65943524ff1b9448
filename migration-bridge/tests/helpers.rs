//! Shared test helpers for the migration bridge tests
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy addresses, domain IDs and amounts
//! - **Fixtures**: A wired source/destination/relay triple with trust configured on both sides
//! - **Receivers**: Minimal `MessageReceiver` doubles for relay-only tests
//! - **Relays**: `RelayAdapter` doubles for failure paths the reference relay never reaches

#![allow(dead_code)]

use migration_bridge::{
    Address, BridgeError, CallContext, DestinationEndpoint, DomainId, FeeModel, Ledger,
    LocalRelay, MessageReceiver, MigrationPayload, MockLedger, RelayAdapter, RelayError,
    RemotePath, SendReceipt, SendRequest, SourceEndpoint,
};

// ============================================================================
// CONSTANTS
// ============================================================================

const fn dummy_address(last: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = last;
    Address::new(bytes)
}

// -------------------------------- USERS ---------------------------------

/// Dummy owner of both endpoints and both ledgers
pub const DUMMY_OWNER: Address = dummy_address(0x01);

/// Dummy migrating user (funded with `DUMMY_INITIAL_BALANCE` by the fixture)
pub const DUMMY_USER: Address = dummy_address(0x07);

/// Dummy account with no rights and no funds
pub const DUMMY_STRANGER: Address = dummy_address(0x09);

// ------------------------------ CONTRACTS -------------------------------

/// Dummy source endpoint address (also the escrow account on the source ledger)
pub const DUMMY_SOURCE_ADDR: Address = dummy_address(0x10);

/// Dummy destination endpoint address
pub const DUMMY_DESTINATION_ADDR: Address = dummy_address(0x11);

/// Dummy relay address, the only caller the destination accepts
pub const DUMMY_RELAY_ADDR: Address = dummy_address(0x12);

// -------------------------------- OTHER ---------------------------------

/// Test source domain ID (Avalanche)
pub const TEST_SRC_DOMAIN: DomainId = 106;

/// Test destination domain ID (Ethereum)
pub const TEST_DST_DOMAIN: DomainId = 101;

/// Balance minted to `DUMMY_USER` on the source ledger by the fixture
pub const DUMMY_INITIAL_BALANCE: u128 = 1000;

// ============================================================================
// FIXTURES
// ============================================================================

pub struct Fixture {
    pub relay: LocalRelay,
    pub source: SourceEndpoint<MockLedger>,
    pub destination: DestinationEndpoint<MockLedger>,
}

/// `remote ++ local` as stored by the source for the destination domain
pub fn source_trusted_path() -> RemotePath {
    RemotePath::new(&DUMMY_DESTINATION_ADDR, &DUMMY_SOURCE_ADDR)
}

/// `remote ++ local` as stored by the destination for the source domain (and as relayed)
pub fn destination_trusted_path() -> RemotePath {
    RemotePath::new(&DUMMY_SOURCE_ADDR, &DUMMY_DESTINATION_ADDR)
}

pub fn owner_ctx() -> CallContext {
    CallContext::new(DUMMY_OWNER)
}

pub fn user_ctx() -> CallContext {
    CallContext::new(DUMMY_USER)
}

/// Both endpoints deployed, trust configured on both sides, user funded, source still paused.
pub fn deploy_fixture() -> Fixture {
    let mut relay = LocalRelay::new(DUMMY_RELAY_ADDR, FeeModel::default());
    relay.connect_domain(TEST_SRC_DOMAIN);
    relay.connect_domain(TEST_DST_DOMAIN);

    let mut source_ledger = MockLedger::new("TOKEN", "TKN");
    source_ledger
        .mint_to(&DUMMY_USER, DUMMY_INITIAL_BALANCE)
        .unwrap();

    let mut source = SourceEndpoint::new(
        DUMMY_SOURCE_ADDR,
        DUMMY_OWNER,
        TEST_SRC_DOMAIN,
        TEST_DST_DOMAIN,
        source_ledger,
    );
    let mut destination = DestinationEndpoint::new(
        DUMMY_DESTINATION_ADDR,
        DUMMY_OWNER,
        TEST_DST_DOMAIN,
        DUMMY_RELAY_ADDR,
        MockLedger::new("TOKEN", "TKN"),
    );

    source
        .set_trusted_remote(&owner_ctx(), TEST_DST_DOMAIN, source_trusted_path())
        .unwrap();
    destination
        .set_trusted_remote(&owner_ctx(), TEST_SRC_DOMAIN, destination_trusted_path())
        .unwrap();

    Fixture {
        relay,
        source,
        destination,
    }
}

/// Same as [`deploy_fixture`] with the source circuit breaker closed.
pub fn deploy_unpaused_fixture() -> Fixture {
    let mut fixture = deploy_fixture();
    fixture.source.unpause(&owner_ctx()).unwrap();
    fixture
}

impl Fixture {
    pub fn fee(&self, amount: u128) -> u128 {
        self.source
            .estimate_fee(&self.relay, amount, DUMMY_USER)
            .unwrap()
    }

    pub fn approve(&mut self, amount: u128) {
        self.source
            .ledger_mut()
            .approve(&DUMMY_USER, &DUMMY_SOURCE_ADDR, amount);
    }

    /// Migrates `amount` from `DUMMY_USER` to itself, paying exactly the quoted fee.
    pub fn migrate(&mut self, amount: u128) -> Result<SendReceipt, BridgeError> {
        let fee = self.fee(amount);
        self.source.migrate(
            &mut self.relay,
            &user_ctx().with_value(fee),
            amount,
            DUMMY_USER,
            fee,
        )
    }

    pub fn payload(amount: u128) -> Vec<u8> {
        MigrationPayload::new(DUMMY_USER, amount).encode()
    }

    pub fn retry(&mut self, payload: &[u8]) -> Result<u64, RelayError> {
        self.relay.retry_payload(
            TEST_SRC_DOMAIN,
            &destination_trusted_path(),
            payload,
            &mut self.destination,
        )
    }
}

// ============================================================================
// RECEIVERS
// ============================================================================

/// Receiver that records every accepted message and can be told to fail.
pub struct RecordingReceiver {
    pub domain: DomainId,
    pub address: Address,
    pub fail: bool,
    pub received: Vec<(DomainId, u64, Vec<u8>)>,
}

impl RecordingReceiver {
    pub fn new(domain: DomainId, address: Address) -> Self {
        Self {
            domain,
            address,
            fail: false,
            received: Vec::new(),
        }
    }
}

impl MessageReceiver for RecordingReceiver {
    fn domain(&self) -> DomainId {
        self.domain
    }

    fn address(&self) -> Address {
        self.address
    }

    fn on_message(
        &mut self,
        _caller: &Address,
        src_domain: DomainId,
        _path: &RemotePath,
        sequence: u64,
        payload: &[u8],
    ) -> Result<(), BridgeError> {
        if self.fail {
            return Err(BridgeError::Paused);
        }
        self.received.push((src_domain, sequence, payload.to_vec()));
        Ok(())
    }
}

// ============================================================================
// RELAYS
// ============================================================================

/// Relay that vets requests like the wrapped [`LocalRelay`] but rejects every `send`.
pub struct RejectingRelay {
    pub inner: LocalRelay,
    pub error: RelayError,
}

impl RelayAdapter for RejectingRelay {
    fn estimate_fee(
        &self,
        dst_domain: DomainId,
        sender: &Address,
        payload: &[u8],
    ) -> Result<u128, RelayError> {
        self.inner.estimate_fee(dst_domain, sender, payload)
    }

    fn check_send(&self, request: &SendRequest) -> Result<u128, RelayError> {
        self.inner.check_send(request)
    }

    fn send(&mut self, _request: SendRequest) -> Result<SendReceipt, RelayError> {
        Err(self.error.clone())
    }

    fn has_stored_payload(&self, src_domain: DomainId, path: &RemotePath) -> bool {
        self.inner.has_stored_payload(src_domain, path)
    }

    fn retry_payload(
        &mut self,
        src_domain: DomainId,
        path: &RemotePath,
        payload: &[u8],
        receiver: &mut dyn MessageReceiver,
    ) -> Result<u64, RelayError> {
        self.inner.retry_payload(src_domain, path, payload, receiver)
    }
}
