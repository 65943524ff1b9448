//! Endpoint-owned state: single-owner administration, circuit breaker, trusted remotes.

use std::collections::BTreeMap;

use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventLog};
use crate::types::{Address, DomainId, RemotePath};

/// Single designated owner. Every administrative mutation goes through [`Ownable::only_owner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn only_owner(&self, caller: &Address) -> Result<(), BridgeError> {
        if *caller != self.owner {
            return Err(BridgeError::NotOwner);
        }
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
        log: &mut EventLog,
    ) -> Result<(), BridgeError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(BridgeError::ZeroOwner);
        }
        let previous_owner = self.owner;
        self.owner = new_owner;
        log.emit(BridgeEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }
}

/// Strict circuit breaker: redundant transitions are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreaker {
    paused: bool,
}

impl CircuitBreaker {
    pub fn new(paused: bool) -> Self {
        Self { paused }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn when_not_paused(&self) -> Result<(), BridgeError> {
        if self.paused {
            return Err(BridgeError::Paused);
        }
        Ok(())
    }

    pub fn pause(&mut self, admin: Address, log: &mut EventLog) -> Result<(), BridgeError> {
        self.when_not_paused()?;
        self.paused = true;
        log.emit(BridgeEvent::Paused { admin });
        Ok(())
    }

    pub fn unpause(&mut self, admin: Address, log: &mut EventLog) -> Result<(), BridgeError> {
        if !self.paused {
            return Err(BridgeError::Unpaused);
        }
        self.paused = false;
        log.emit(BridgeEvent::Unpaused { admin });
        Ok(())
    }
}

/// Domain -> `remote ++ local` allow-list. Entries may be overwritten by the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedRemotes {
    entries: BTreeMap<DomainId, RemotePath>,
}

impl TrustedRemotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, domain: DomainId, path: RemotePath, log: &mut EventLog) {
        self.entries.insert(domain, path.clone());
        log.emit(BridgeEvent::TrustedRemoteSet { domain, path });
    }

    pub fn get(&self, domain: DomainId) -> Option<&RemotePath> {
        self.entries.get(&domain)
    }

    /// Byte-exact comparison against the stored entry. An empty candidate never matches.
    pub fn is_trusted(&self, domain: DomainId, path: &RemotePath) -> bool {
        match self.entries.get(&domain) {
            Some(stored) => !stored.is_empty() && stored.as_bytes() == path.as_bytes(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaker_rejects_redundant_transitions() {
        let mut log = EventLog::new();
        let admin = Address::repeat_byte(1);
        let mut breaker = CircuitBreaker::new(true);

        assert_eq!(breaker.pause(admin, &mut log), Err(BridgeError::Paused));
        breaker.unpause(admin, &mut log).unwrap();
        assert_eq!(breaker.unpause(admin, &mut log), Err(BridgeError::Unpaused));
        assert_eq!(log.events().len(), 1);
    }

    #[test]
    fn test_trusted_remotes_exact_match() {
        let mut log = EventLog::new();
        let mut trusted = TrustedRemotes::new();
        let path = RemotePath::new(&Address::repeat_byte(1), &Address::repeat_byte(2));

        assert!(!trusted.is_trusted(7, &path));
        trusted.set(7, path.clone(), &mut log);
        assert!(trusted.is_trusted(7, &path));
        assert!(!trusted.is_trusted(8, &path));

        // A prefix of the stored bytes is not the stored bytes
        let prefix = RemotePath::from_bytes(path.as_bytes()[..20].to_vec());
        assert!(!trusted.is_trusted(7, &prefix));
    }

    #[test]
    fn test_ownable_gate() {
        let mut log = EventLog::new();
        let owner = Address::repeat_byte(1);
        let other = Address::repeat_byte(2);
        let mut ownable = Ownable::new(owner);

        assert_eq!(ownable.only_owner(&other), Err(BridgeError::NotOwner));
        ownable.transfer_ownership(&owner, other, &mut log).unwrap();
        assert_eq!(ownable.owner(), other);
        assert_eq!(ownable.only_owner(&owner), Err(BridgeError::NotOwner));
    }
}
