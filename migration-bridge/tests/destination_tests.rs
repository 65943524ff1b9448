//! Tests for the destination endpoint's inbound handler and trust configuration.

mod helpers;

use helpers::{
    deploy_fixture, destination_trusted_path, owner_ctx, Fixture, DUMMY_DESTINATION_ADDR,
    DUMMY_OWNER, DUMMY_RELAY_ADDR, DUMMY_SOURCE_ADDR, DUMMY_STRANGER, DUMMY_USER,
    TEST_SRC_DOMAIN,
};
use migration_bridge::{
    BridgeError, BridgeEvent, CallContext, Ledger, LedgerError, MessageReceiver, PayloadError,
    RemotePath,
};

// ============================================================================
// ON MESSAGE
// ============================================================================

/// 1. Test: Accepted Message Mints
/// Verifies that a message from the relay over the trusted path mints to the recipient.
/// Why: This is the destination half of every migration.
#[test]
fn test_on_message_mints_to_recipient() {
    let mut fixture = deploy_fixture();

    fixture
        .destination
        .on_message(
            &DUMMY_RELAY_ADDR,
            TEST_SRC_DOMAIN,
            &destination_trusted_path(),
            1,
            &Fixture::payload(1000),
        )
        .unwrap();

    assert_eq!(fixture.destination.ledger().balance_of(&DUMMY_USER), 1000);
    assert_eq!(fixture.destination.ledger().total_supply(), 1000);
    assert_eq!(
        fixture.destination.events().last(),
        Some(&BridgeEvent::MigrationFinished {
            recipient: DUMMY_USER,
            amount: 1000,
            sequence: 1
        })
    );
}

/// 2. Test: Only The Relay May Call
/// Verifies that any caller other than the configured relay is rejected.
/// Why: Otherwise anyone could mint by calling the handler directly.
#[test]
fn test_on_message_rejects_non_relay_caller() {
    let mut fixture = deploy_fixture();

    let result = fixture.destination.on_message(
        &DUMMY_STRANGER,
        TEST_SRC_DOMAIN,
        &destination_trusted_path(),
        1,
        &Fixture::payload(1000),
    );

    assert_eq!(result, Err(BridgeError::InvalidRelayCaller(DUMMY_STRANGER)));
    assert_eq!(fixture.destination.ledger().total_supply(), 0);
}

/// 3. Test: Untrusted Origins
/// Verifies rejection of an unknown source domain, a different sender and a reversed path.
/// Why: Trust is a byte-exact match; no normalisation may let a look-alike through.
#[test]
fn test_on_message_rejects_untrusted_paths() {
    let mut fixture = deploy_fixture();
    let payload = Fixture::payload(1000);

    let candidates = [
        (TEST_SRC_DOMAIN + 1, destination_trusted_path()),
        (
            TEST_SRC_DOMAIN,
            RemotePath::new(&DUMMY_STRANGER, &DUMMY_DESTINATION_ADDR),
        ),
        (
            TEST_SRC_DOMAIN,
            RemotePath::new(&DUMMY_DESTINATION_ADDR, &DUMMY_SOURCE_ADDR),
        ),
        (TEST_SRC_DOMAIN, RemotePath::default()),
    ];

    for (domain, path) in candidates {
        let result = fixture
            .destination
            .on_message(&DUMMY_RELAY_ADDR, domain, &path, 1, &payload);
        assert_eq!(result, Err(BridgeError::UntrustedRemote(domain)), "path {}", path);
    }
    assert_eq!(fixture.destination.ledger().total_supply(), 0);
    assert_eq!(fixture.destination.events().count("MigrationFinished"), 0);
}

/// 4. Test: Malformed Payload
/// Verifies that payloads of the wrong length or with reserved bits set are rejected.
/// Why: The wire format is fixed-width and positional.
#[test]
fn test_on_message_rejects_malformed_payload() {
    let mut fixture = deploy_fixture();
    let mut reserved_set = Fixture::payload(10);
    reserved_set[3] = 0xff;

    let short = fixture.destination.on_message(
        &DUMMY_RELAY_ADDR,
        TEST_SRC_DOMAIN,
        &destination_trusted_path(),
        1,
        &[0u8; 32],
    );
    assert_eq!(
        short,
        Err(BridgeError::Payload(PayloadError::InvalidLength {
            expected: 64,
            actual: 32
        }))
    );

    let reserved = fixture.destination.on_message(
        &DUMMY_RELAY_ADDR,
        TEST_SRC_DOMAIN,
        &destination_trusted_path(),
        1,
        &reserved_set,
    );
    assert_eq!(reserved, Err(BridgeError::Payload(PayloadError::NonZeroReserved)));
}

/// 5. Test: Halted Ledger Fails Atomically
/// Verifies that a paused destination ledger fails the handler with no mint and no event.
/// Why: The relay stores the message for retry only if nothing was applied.
#[test]
fn test_on_message_fails_atomically_on_paused_ledger() {
    let mut fixture = deploy_fixture();
    fixture.destination.ledger_mut().pause().unwrap();
    fixture.destination.take_events();

    let result = fixture.destination.on_message(
        &DUMMY_RELAY_ADDR,
        TEST_SRC_DOMAIN,
        &destination_trusted_path(),
        1,
        &Fixture::payload(500),
    );

    assert_eq!(result, Err(BridgeError::Ledger(LedgerError::LedgerPaused)));
    assert_eq!(fixture.destination.ledger().total_supply(), 0);
    assert!(fixture.destination.events().events().is_empty());
}

// ============================================================================
// ADMINISTRATION
// ============================================================================

/// 6. Test: Trust Configuration
/// Verifies the owner gate and the byte-exact query on the destination.
/// Why: Trust must agree pairwise before any message is accepted.
#[test]
fn test_destination_trust_configuration() {
    let mut fixture = deploy_fixture();

    assert_eq!(fixture.destination.relay(), DUMMY_RELAY_ADDR);
    assert_eq!(fixture.destination.owner(), DUMMY_OWNER);
    assert!(fixture
        .destination
        .is_trusted_remote(TEST_SRC_DOMAIN, &destination_trusted_path()));
    assert_eq!(
        fixture.destination.set_trusted_remote(
            &CallContext::new(DUMMY_STRANGER),
            TEST_SRC_DOMAIN,
            RemotePath::default()
        ),
        Err(BridgeError::NotOwner)
    );

    let replacement = RemotePath::new(&DUMMY_STRANGER, &DUMMY_DESTINATION_ADDR);
    fixture
        .destination
        .set_trusted_remote(&owner_ctx(), TEST_SRC_DOMAIN, replacement.clone())
        .unwrap();
    assert_eq!(
        fixture.destination.trusted_remote(TEST_SRC_DOMAIN),
        Some(&replacement)
    );
    assert!(!fixture
        .destination
        .is_trusted_remote(TEST_SRC_DOMAIN, &destination_trusted_path()));
}
