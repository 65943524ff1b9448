//! Migration message wire format.
//!
//! The payload is fixed-width and positionally encoded, with no length prefixes:
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 12   | reserved (96-bit, always 0)   |
//! | 12     | 20   | recipient address             |
//! | 32     | 32   | amount (uint256, big-endian)  |

use crate::error::{BridgeError, PayloadError};
use crate::types::{Address, ADDRESS_LEN};

/// Size of the reserved prefix in bytes.
pub const RESERVED_LEN: usize = 12;

/// Size of the amount word in bytes.
pub const AMOUNT_LEN: usize = 32;

/// Total encoded size of a migration payload.
pub const MIGRATION_PAYLOAD_SIZE: usize = RESERVED_LEN + ADDRESS_LEN + AMOUNT_LEN; // 64 bytes

const RECIPIENT_OFFSET: usize = RESERVED_LEN;
const AMOUNT_OFFSET: usize = RESERVED_LEN + ADDRESS_LEN;

/// Decoded migration payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationPayload {
    pub recipient: Address,
    pub amount: u128,
}

impl MigrationPayload {
    pub fn new(recipient: Address, amount: u128) -> Self {
        Self { recipient, amount }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; MIGRATION_PAYLOAD_SIZE];
        buf[RECIPIENT_OFFSET..AMOUNT_OFFSET].copy_from_slice(self.recipient.as_bytes());
        // u128 occupies the low 16 bytes of the uint256 word
        buf[MIGRATION_PAYLOAD_SIZE - 16..].copy_from_slice(&self.amount.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        if data.len() != MIGRATION_PAYLOAD_SIZE {
            return Err(PayloadError::InvalidLength {
                expected: MIGRATION_PAYLOAD_SIZE,
                actual: data.len(),
            });
        }
        if data[..RESERVED_LEN].iter().any(|b| *b != 0) {
            return Err(PayloadError::NonZeroReserved);
        }

        let recipient = Address::from_slice(&data[RECIPIENT_OFFSET..AMOUNT_OFFSET])?;

        let amount_word = &data[AMOUNT_OFFSET..];
        if amount_word[..AMOUNT_LEN - 16].iter().any(|b| *b != 0) {
            return Err(PayloadError::AmountOverflow);
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&amount_word[AMOUNT_LEN - 16..]);

        Ok(Self {
            recipient,
            amount: u128::from_be_bytes(low),
        })
    }
}

/// A migration request as received from a caller. Lives for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationRequest {
    pub amount: u128,
    pub recipient: Address,
    pub paid_fee: u128,
}

impl MigrationRequest {
    /// Checks the request fields that do not depend on the relay quote.
    pub fn validate_shape(amount: u128, recipient: &Address) -> Result<(), BridgeError> {
        if amount == 0 {
            return Err(BridgeError::AmountIsZero);
        }
        if recipient.is_zero() {
            return Err(BridgeError::DstAddressIsZero);
        }
        Ok(())
    }

    pub fn payload(&self) -> MigrationPayload {
        MigrationPayload::new(self.recipient, self.amount)
    }
}
