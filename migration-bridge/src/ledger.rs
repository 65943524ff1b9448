//! Ledger capability consumed by the endpoints, plus a pausable in-memory reference ledger.

use std::collections::HashMap;

use tracing::debug;

use crate::error::LedgerError;
use crate::types::Address;

/// What an endpoint needs from the token ledger on its domain.
pub trait Ledger {
    fn balance_of(&self, account: &Address) -> u128;

    fn total_supply(&self) -> u128;

    fn is_paused(&self) -> bool;

    /// Moves `amount` from `owner` to `spender`, consuming `owner`'s allowance for `spender`.
    fn debit_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Reverses a `debit_from` of `amount`: returns the tokens to `owner` and restores the
    /// allowance it consumed.
    fn undo_debit(
        &mut self,
        spender: &Address,
        owner: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;

    fn mint_to(&mut self, to: &Address, amount: u128) -> Result<(), LedgerError>;
}

/// Pausable ERC20-style ledger. Debits and mints fail while paused.
#[derive(Debug, Clone, Default)]
pub struct MockLedger {
    name: String,
    symbol: String,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    total_supply: u128,
    paused: bool,
}

impl MockLedger {
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances.insert((*owner, *spender), amount);
    }

    pub fn pause(&mut self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::LedgerPaused);
        }
        self.paused = true;
        debug!("Ledger {} paused", self.symbol);
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::LedgerNotPaused);
        }
        self.paused = false;
        debug!("Ledger {} unpaused", self.symbol);
        Ok(())
    }

    fn when_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::LedgerPaused);
        }
        Ok(())
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(LedgerError::BalanceExceeded {
                balance,
                requested: amount,
            });
        }
        self.balances.insert(*from, balance - amount);
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

impl Ledger for MockLedger {
    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn debit_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.when_not_paused()?;
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(LedgerError::AllowanceExceeded {
                allowance,
                requested: amount,
            });
        }
        // Balance is checked before the allowance is consumed so a failure leaves both intact
        self.move_balance(owner, spender, amount)?;
        self.allowances.insert((*owner, *spender), allowance - amount);
        Ok(())
    }

    fn undo_debit(
        &mut self,
        spender: &Address,
        owner: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.when_not_paused()?;
        self.move_balance(spender, owner, amount)?;
        let allowance = self.allowance(owner, spender).saturating_add(amount);
        self.allowances.insert((*owner, *spender), allowance);
        debug!("Reversed debit of {} from {} by {}", amount, owner, spender);
        Ok(())
    }

    fn mint_to(&mut self, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.when_not_paused()?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow)?;
        self.total_supply = total_supply;
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    #[test]
    fn test_debit_from_consumes_allowance() {
        let mut ledger = MockLedger::new("TOKEN", "TKN");
        ledger.mint_to(&alice(), 1000).unwrap();
        ledger.approve(&alice(), &bob(), 600);

        ledger.debit_from(&bob(), &alice(), 400).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 600);
        assert_eq!(ledger.balance_of(&bob()), 400);
        assert_eq!(ledger.allowance(&alice(), &bob()), 200);
        assert_eq!(ledger.total_supply(), 1000);
    }

    #[test]
    fn test_debit_from_insufficient_allowance() {
        let mut ledger = MockLedger::new("TOKEN", "TKN");
        ledger.mint_to(&alice(), 1000).unwrap();

        let result = ledger.debit_from(&bob(), &alice(), 1);
        assert_eq!(
            result,
            Err(LedgerError::AllowanceExceeded {
                allowance: 0,
                requested: 1
            })
        );
    }

    #[test]
    fn test_debit_from_insufficient_balance_keeps_allowance() {
        let mut ledger = MockLedger::new("TOKEN", "TKN");
        ledger.mint_to(&alice(), 10).unwrap();
        ledger.approve(&alice(), &bob(), 2000);

        let result = ledger.debit_from(&bob(), &alice(), 11);
        assert!(matches!(result, Err(LedgerError::BalanceExceeded { .. })));
        assert_eq!(ledger.allowance(&alice(), &bob()), 2000);
    }

    #[test]
    fn test_undo_debit_restores_balance_and_allowance() {
        let mut ledger = MockLedger::new("Token", "TKN");
        ledger.mint_to(&alice(), 1000).unwrap();
        ledger.approve(&alice(), &bob(), 500);
        ledger.debit_from(&bob(), &alice(), 300).unwrap();

        ledger.undo_debit(&bob(), &alice(), 300).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 1000);
        assert_eq!(ledger.balance_of(&bob()), 0);
        assert_eq!(ledger.allowance(&alice(), &bob()), 500);
        assert_eq!(ledger.total_supply(), 1000);
    }

    #[test]
    fn test_paused_ledger_rejects_mint_and_debit() {
        let mut ledger = MockLedger::new("TOKEN", "TKN");
        ledger.mint_to(&alice(), 5).unwrap();
        ledger.pause().unwrap();

        assert_eq!(ledger.mint_to(&alice(), 1), Err(LedgerError::LedgerPaused));
        ledger.approve(&alice(), &bob(), 5);
        assert_eq!(
            ledger.debit_from(&bob(), &alice(), 1),
            Err(LedgerError::LedgerPaused)
        );
        assert_eq!(ledger.pause(), Err(LedgerError::LedgerPaused));

        ledger.unpause().unwrap();
        ledger.mint_to(&alice(), 1).unwrap();
        assert_eq!(ledger.total_supply(), 6);
    }
}
