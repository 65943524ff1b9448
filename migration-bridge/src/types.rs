//! Primitive types shared by both endpoints and the relay.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PayloadError;

/// Identifier of an execution domain (chain endpoint ID).
pub type DomainId = u32;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A 20-byte account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Address with every byte set to `byte`. Handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_LEN])
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
        let array: [u8; ADDRESS_LEN] =
            bytes.try_into().map_err(|_| PayloadError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = PayloadError;

    /// Parses a hex address with or without `0x`. Exactly 40 hex characters are required;
    /// short addresses are not left-padded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_clean = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_clean).map_err(|e| PayloadError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Opaque route identifier: `remote_address ++ local_address` as seen by the endpoint storing it.
///
/// Trust checks compare these bytes exactly; no normalisation is ever applied.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RemotePath(Vec<u8>);

impl RemotePath {
    /// Packs `remote` followed by `local`.
    pub fn new(remote: &Address, local: &Address) -> Self {
        let mut bytes = Vec::with_capacity(ADDRESS_LEN * 2);
        bytes.extend_from_slice(remote.as_bytes());
        bytes.extend_from_slice(local.as_bytes());
        Self(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The remote half, if the path is a well-formed address pair.
    pub fn remote_address(&self) -> Option<Address> {
        if self.0.len() != ADDRESS_LEN * 2 {
            return None;
        }
        Address::from_slice(&self.0[..ADDRESS_LEN]).ok()
    }

    /// The local half, if the path is a well-formed address pair.
    pub fn local_address(&self) -> Option<Address> {
        if self.0.len() != ADDRESS_LEN * 2 {
            return None;
        }
        Address::from_slice(&self.0[ADDRESS_LEN..]).ok()
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemotePath({})", self)
    }
}

impl FromStr for RemotePath {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_clean = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_clean).map_err(|e| PayloadError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for RemotePath {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Who is calling and how much native currency is attached to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: u128,
}

impl CallContext {
    pub fn new(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

/// Serde adapter for raw byte fields rendered as `0x`-prefixed hex.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
