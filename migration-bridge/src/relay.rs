//! Relay adapter boundary and the in-process reference relay.
//!
//! ## Delivery model
//!
//! `send` assigns the next sequence number for the route and enqueues the message; it returns
//! before anything reaches the destination. Delivery is a separate call (`deliver_next`,
//! `deliver_all`, or `deliver` for a message obtained out of band), so the sender never observes
//! a delivery failure.
//!
//! The reference relay delivers each route in FIFO order. An inbound sequence counter per route
//! drops duplicates (at-least-once transports may hand the same message over twice) and rejects
//! gaps. When the receiver fails, the message is stored as blocked, `PayloadStored` is emitted
//! and the route is held until `retry_payload` succeeds.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, info, warn};

use crate::error::{BridgeError, RelayError};
use crate::events::{BridgeEvent, EventLog};
use crate::types::{Address, DomainId, RemotePath};

// ============================================================================
// BOUNDARY TRAITS
// ============================================================================

/// The inbound side of an application endpoint. Invoked only by the relay.
pub trait MessageReceiver {
    fn domain(&self) -> DomainId;

    fn address(&self) -> Address;

    /// Applies a message fully or fails with no effect.
    fn on_message(
        &mut self,
        caller: &Address,
        src_domain: DomainId,
        path: &RemotePath,
        sequence: u64,
        payload: &[u8],
    ) -> Result<(), BridgeError>;
}

/// Contract the endpoints rely on from any relay implementation.
pub trait RelayAdapter {
    /// Quotes the native fee for sending `payload` from `sender` to `dst_domain`. No side effects.
    fn estimate_fee(
        &self,
        dst_domain: DomainId,
        sender: &Address,
        payload: &[u8],
    ) -> Result<u128, RelayError>;

    /// Runs every check `send` performs, without side effects, and returns the fee `send` would
    /// charge. A request that passes is accepted by the next `send` on an unchanged relay.
    fn check_send(&self, request: &SendRequest) -> Result<u128, RelayError>;

    /// Accepts a message for asynchronous delivery and returns its receipt.
    fn send(&mut self, request: SendRequest) -> Result<SendReceipt, RelayError>;

    fn has_stored_payload(&self, src_domain: DomainId, path: &RemotePath) -> bool;

    /// Replays a blocked message. The caller supplies route and payload; they must match the slot.
    fn retry_payload(
        &mut self,
        src_domain: DomainId,
        path: &RemotePath,
        payload: &[u8],
        receiver: &mut dyn MessageReceiver,
    ) -> Result<u64, RelayError>;
}

// ============================================================================
// MESSAGE STRUCTURES
// ============================================================================

/// Arguments of a send call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub src_domain: DomainId,
    pub dst_domain: DomainId,
    /// The sender's trusted entry for `dst_domain`: `destination ++ sender`.
    pub destination: RemotePath,
    pub sender: Address,
    pub payload: Vec<u8>,
    /// Native currency attached for fees. Anything above the quote is refunded.
    pub native_fee: u128,
}

/// Returned by `send` once the message is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub sequence: u64,
    /// Path as the destination sees it: `sender ++ destination`.
    pub path: RemotePath,
    pub dst_address: Address,
    pub fee: u128,
    pub refund: u128,
}

/// A message owned by the relay between send and delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub src_domain: DomainId,
    pub dst_domain: DomainId,
    pub path: RemotePath,
    pub dst_address: Address,
    pub sequence: u64,
    pub payload: Vec<u8>,
}

impl OutboundMessage {
    pub fn route(&self) -> InboundRoute {
        InboundRoute {
            src_domain: self.src_domain,
            dst_domain: self.dst_domain,
            path: self.path.clone(),
        }
    }
}

/// Route key on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InboundRoute {
    pub src_domain: DomainId,
    pub dst_domain: DomainId,
    pub path: RemotePath,
}

/// Blocked-message slot. Only the payload hash is kept; a retry must present the exact bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPayload {
    pub sequence: u64,
    pub payload_length: usize,
    pub dst_address: Address,
    pub payload_hash: [u8; 32],
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { src_domain: DomainId, sequence: u64 },
    Stored { src_domain: DomainId, sequence: u64, reason: String },
    Duplicate { src_domain: DomainId, sequence: u64 },
}

// ============================================================================
// FEE MODEL
// ============================================================================

const PRICE_RATIO_DENOMINATOR: u128 = 10_000_000_000;
const BASIS_POINTS: u128 = 10_000;

/// Relayer + oracle + protocol fee, in the style of the LayerZero v1 reference relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeModel {
    pub base_gas: u64,
    pub gas_per_byte: u64,
    /// Execution gas reserved on the destination for the receive handler.
    pub gas_limit: u64,
    pub dst_gas_price: u128,
    /// Destination/source native price ratio scaled by 1e10.
    pub dst_price_ratio: u128,
    pub oracle_fee: u128,
    pub protocol_fee_bp: u32,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self {
            base_gas: 100,
            gas_per_byte: 1,
            gas_limit: 200_000,
            dst_gas_price: 10_000_000_000,
            dst_price_ratio: PRICE_RATIO_DENOMINATOR,
            oracle_fee: 10_000_000_000_000_000,
            protocol_fee_bp: 1_000,
        }
    }
}

impl FeeModel {
    /// Native fee for a payload of `payload_len` bytes. A model that prices a message at zero is
    /// rejected.
    pub fn quote(&self, payload_len: usize) -> Result<u128, RelayError> {
        let gas = (payload_len as u128)
            .checked_mul(self.gas_per_byte as u128)
            .and_then(|g| g.checked_add(self.base_gas as u128))
            .and_then(|g| g.checked_add(self.gas_limit as u128))
            .ok_or(RelayError::FeeOverflow)?;

        let relayer_fee = gas
            .checked_mul(self.dst_gas_price)
            .and_then(|f| f.checked_mul(self.dst_price_ratio))
            .map(|f| f / PRICE_RATIO_DENOMINATOR)
            .ok_or(RelayError::FeeOverflow)?;

        let subtotal = relayer_fee
            .checked_add(self.oracle_fee)
            .ok_or(RelayError::FeeOverflow)?;
        let protocol_fee = subtotal
            .checked_mul(self.protocol_fee_bp as u128)
            .map(|f| f / BASIS_POINTS)
            .ok_or(RelayError::FeeOverflow)?;

        let fee = subtotal
            .checked_add(protocol_fee)
            .ok_or(RelayError::FeeOverflow)?;
        if fee == 0 {
            return Err(RelayError::ZeroFee);
        }
        Ok(fee)
    }
}

// ============================================================================
// LOCAL RELAY
// ============================================================================

/// In-process relay connecting any number of domains.
#[derive(Debug)]
pub struct LocalRelay {
    address: Address,
    fee_model: FeeModel,
    domains: BTreeSet<DomainId>,
    /// (src_domain, dst_domain, sender) -> last assigned sequence
    outbound_nonces: HashMap<(DomainId, DomainId, Address), u64>,
    /// route -> last sequence handed to the receiver (or stored)
    inbound_nonces: HashMap<InboundRoute, u64>,
    in_flight: BTreeMap<InboundRoute, VecDeque<OutboundMessage>>,
    stored: BTreeMap<(InboundRoute, u64), StoredPayload>,
    next_msg_blocked: bool,
    collected_fees: u128,
    events: EventLog,
}

/// A send request that passed every check, with the values `send` commits.
struct PreparedSend {
    dst_address: Address,
    fee: u128,
    sequence: u64,
    collected_fees: u128,
}

impl LocalRelay {
    pub fn new(address: Address, fee_model: FeeModel) -> Self {
        Self {
            address,
            fee_model,
            domains: BTreeSet::new(),
            outbound_nonces: HashMap::new(),
            inbound_nonces: HashMap::new(),
            in_flight: BTreeMap::new(),
            stored: BTreeMap::new(),
            next_msg_blocked: false,
            collected_fees: 0,
            events: EventLog::new(),
        }
    }

    /// Makes `domain` reachable as a source or destination.
    pub fn connect_domain(&mut self, domain: DomainId) {
        if self.domains.insert(domain) {
            info!("Relay connected domain {}", domain);
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn fee_model(&self) -> &FeeModel {
        &self.fee_model
    }

    pub fn collected_fees(&self) -> u128 {
        self.collected_fees
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BridgeEvent> {
        self.events.take()
    }

    /// The next delivery attempt is stored as blocked with an empty reason instead of reaching
    /// the receiver.
    pub fn block_next_message(&mut self) {
        self.next_msg_blocked = true;
    }

    pub fn outbound_nonce(&self, src_domain: DomainId, dst_domain: DomainId, sender: &Address) -> u64 {
        self.outbound_nonces
            .get(&(src_domain, dst_domain, *sender))
            .copied()
            .unwrap_or(0)
    }

    pub fn inbound_nonce(&self, route: &InboundRoute) -> u64 {
        self.inbound_nonces.get(route).copied().unwrap_or(0)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.values().map(VecDeque::len).sum()
    }

    pub fn pending_messages(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.in_flight.values().flatten()
    }

    pub fn blocked_messages(&self) -> impl Iterator<Item = (&InboundRoute, &StoredPayload)> {
        self.stored.iter().map(|((route, _), stored)| (route, stored))
    }

    pub fn stored_payload(&self, route: &InboundRoute) -> Option<&StoredPayload> {
        self.stored
            .range((route.clone(), 0)..=(route.clone(), u64::MAX))
            .next()
            .map(|(_, stored)| stored)
    }

    fn is_route_blocked(&self, route: &InboundRoute) -> bool {
        self.stored_payload(route).is_some()
    }

    fn ensure_domain(&self, domain: DomainId) -> Result<(), RelayError> {
        if !self.domains.contains(&domain) {
            return Err(RelayError::UnknownDomain(domain));
        }
        Ok(())
    }

    fn prepare_send(&self, request: &SendRequest) -> Result<PreparedSend, RelayError> {
        self.ensure_domain(request.src_domain)?;
        self.ensure_domain(request.dst_domain)?;

        let malformed = || RelayError::MalformedPath(request.destination.as_bytes().len());
        let dst_address = request.destination.remote_address().ok_or_else(malformed)?;
        let path_local = request.destination.local_address().ok_or_else(malformed)?;
        if path_local != request.sender {
            return Err(RelayError::PathSenderMismatch {
                sender: request.sender,
                path_local,
            });
        }

        let fee = self.estimate_fee(request.dst_domain, &request.sender, &request.payload)?;
        if request.native_fee < fee {
            return Err(RelayError::InsufficientFee {
                attached: request.native_fee,
                required: fee,
            });
        }
        let collected_fees = self
            .collected_fees
            .checked_add(fee)
            .ok_or(RelayError::ArithmeticOverflow)?;
        let sequence = self
            .outbound_nonce(request.src_domain, request.dst_domain, &request.sender)
            .checked_add(1)
            .ok_or(RelayError::ArithmeticOverflow)?;

        Ok(PreparedSend {
            dst_address,
            fee,
            sequence,
            collected_fees,
        })
    }

    /// Hands one message to `receiver`. Used by the queue drain and for messages redelivered by
    /// an at-least-once transport.
    pub fn deliver(
        &mut self,
        message: &OutboundMessage,
        receiver: &mut dyn MessageReceiver,
    ) -> Result<DeliveryOutcome, RelayError> {
        if receiver.address() != message.dst_address {
            return Err(RelayError::ReceiverMismatch {
                expected: message.dst_address,
                actual: receiver.address(),
            });
        }
        if receiver.domain() != message.dst_domain {
            return Err(RelayError::ReceiverDomainMismatch {
                expected: message.dst_domain,
                actual: receiver.domain(),
            });
        }

        let route = message.route();
        let last = self.inbound_nonce(&route);
        if message.sequence <= last {
            debug!(
                "Dropping duplicate delivery: src_domain={}, sequence={}, last={}",
                message.src_domain, message.sequence, last
            );
            return Ok(DeliveryOutcome::Duplicate {
                src_domain: message.src_domain,
                sequence: message.sequence,
            });
        }
        if self.is_route_blocked(&route) {
            return Err(RelayError::RouteBlocked(message.src_domain));
        }
        let expected = last.checked_add(1).ok_or(RelayError::ArithmeticOverflow)?;
        if message.sequence != expected {
            return Err(RelayError::WrongSequence {
                expected,
                actual: message.sequence,
            });
        }

        // The sequence is consumed whether the receiver succeeds or the message is stored
        self.inbound_nonces.insert(route.clone(), message.sequence);

        if self.next_msg_blocked {
            self.next_msg_blocked = false;
            self.store_payload(route, message, Vec::new());
            return Ok(DeliveryOutcome::Stored {
                src_domain: message.src_domain,
                sequence: message.sequence,
                reason: String::new(),
            });
        }

        match receiver.on_message(
            &self.address,
            message.src_domain,
            &message.path,
            message.sequence,
            &message.payload,
        ) {
            Ok(()) => {
                debug!(
                    "Delivered: src_domain={}, dst_domain={}, sequence={}",
                    message.src_domain, message.dst_domain, message.sequence
                );
                Ok(DeliveryOutcome::Delivered {
                    src_domain: message.src_domain,
                    sequence: message.sequence,
                })
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    "Delivery failed, storing payload: src_domain={}, sequence={}, reason={}",
                    message.src_domain, message.sequence, reason
                );
                self.store_payload(route, message, reason.clone().into_bytes());
                Ok(DeliveryOutcome::Stored {
                    src_domain: message.src_domain,
                    sequence: message.sequence,
                    reason,
                })
            }
        }
    }

    fn store_payload(&mut self, route: InboundRoute, message: &OutboundMessage, reason: Vec<u8>) {
        let stored = StoredPayload {
            sequence: message.sequence,
            payload_length: message.payload.len(),
            dst_address: message.dst_address,
            payload_hash: keccak256(&message.payload),
        };
        self.stored.insert((route, message.sequence), stored);
        self.events.emit(BridgeEvent::PayloadStored {
            src_domain: message.src_domain,
            path: message.path.clone(),
            dst_address: message.dst_address,
            sequence: message.sequence,
            payload: message.payload.clone(),
            reason,
        });
    }

    /// Delivers the oldest pending message addressed to `receiver` on a route that is not held.
    /// Returns `None` when nothing is deliverable.
    pub fn deliver_next(
        &mut self,
        receiver: &mut dyn MessageReceiver,
    ) -> Result<Option<DeliveryOutcome>, RelayError> {
        let dst_domain = receiver.domain();
        let dst_address = receiver.address();

        let route = self
            .in_flight
            .iter()
            .find(|(route, queue)| {
                route.dst_domain == dst_domain
                    && route.path.local_address() == Some(dst_address)
                    && !queue.is_empty()
                    && !self.is_route_blocked(route)
            })
            .map(|(route, _)| route.clone());

        let Some(route) = route else {
            return Ok(None);
        };

        let Some(message) = self.in_flight.get_mut(&route).and_then(VecDeque::pop_front) else {
            return Ok(None);
        };

        match self.deliver(&message, receiver) {
            Ok(outcome) => {
                if self.in_flight.get(&route).is_some_and(VecDeque::is_empty) {
                    self.in_flight.remove(&route);
                }
                Ok(Some(outcome))
            }
            Err(e) => {
                // Keep the message at the head of its route
                self.in_flight.entry(route).or_default().push_front(message);
                Err(e)
            }
        }
    }

    /// Drains every deliverable message for `receiver`.
    pub fn deliver_all(
        &mut self,
        receiver: &mut dyn MessageReceiver,
    ) -> Result<Vec<DeliveryOutcome>, RelayError> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.deliver_next(receiver)? {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

impl RelayAdapter for LocalRelay {
    fn estimate_fee(
        &self,
        dst_domain: DomainId,
        _sender: &Address,
        payload: &[u8],
    ) -> Result<u128, RelayError> {
        self.ensure_domain(dst_domain)?;
        self.fee_model.quote(payload.len())
    }

    fn check_send(&self, request: &SendRequest) -> Result<u128, RelayError> {
        self.prepare_send(request).map(|prepared| prepared.fee)
    }

    fn send(&mut self, request: SendRequest) -> Result<SendReceipt, RelayError> {
        let PreparedSend {
            dst_address,
            fee,
            sequence,
            collected_fees,
        } = self.prepare_send(&request)?;

        self.outbound_nonces
            .insert((request.src_domain, request.dst_domain, request.sender), sequence);
        self.collected_fees = collected_fees;

        let path = RemotePath::new(&request.sender, &dst_address);
        let message = OutboundMessage {
            src_domain: request.src_domain,
            dst_domain: request.dst_domain,
            path: path.clone(),
            dst_address,
            sequence,
            payload: request.payload,
        };

        info!(
            "MessageSent: src_domain={}, dst_domain={}, src_addr={}, dst_addr={}, sequence={}, payload_len={}",
            message.src_domain,
            message.dst_domain,
            request.sender,
            dst_address,
            sequence,
            message.payload.len()
        );

        self.in_flight
            .entry(message.route())
            .or_default()
            .push_back(message);

        Ok(SendReceipt {
            sequence,
            path,
            dst_address,
            fee,
            refund: request.native_fee - fee,
        })
    }

    fn has_stored_payload(&self, src_domain: DomainId, path: &RemotePath) -> bool {
        self.stored
            .keys()
            .any(|(route, _)| route.src_domain == src_domain && &route.path == path)
    }

    fn retry_payload(
        &mut self,
        src_domain: DomainId,
        path: &RemotePath,
        payload: &[u8],
        receiver: &mut dyn MessageReceiver,
    ) -> Result<u64, RelayError> {
        let route = InboundRoute {
            src_domain,
            dst_domain: receiver.domain(),
            path: path.clone(),
        };

        let stored = self
            .stored_payload(&route)
            .cloned()
            .ok_or(RelayError::NoStoredPayload(src_domain))?;

        if payload.len() != stored.payload_length || keccak256(payload) != stored.payload_hash {
            return Err(RelayError::InvalidPayload);
        }
        if receiver.address() != stored.dst_address {
            return Err(RelayError::ReceiverMismatch {
                expected: stored.dst_address,
                actual: receiver.address(),
            });
        }

        receiver
            .on_message(&self.address, src_domain, path, stored.sequence, payload)
            .map_err(|e| {
                warn!(
                    "Retry failed: src_domain={}, sequence={}, reason={}",
                    src_domain, stored.sequence, e
                );
                RelayError::RetryFailed(e.to_string())
            })?;

        self.stored.remove(&(route, stored.sequence));
        self.events.emit(BridgeEvent::PayloadCleared {
            src_domain,
            path: path.clone(),
            sequence: stored.sequence,
            dst_address: stored.dst_address,
        });
        Ok(stored.sequence)
    }
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}
