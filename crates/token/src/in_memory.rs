use std::collections::HashMap;
use std::sync::RwLock;

use coinstake_core::Address;

use crate::{TokenError, TokenService};

/// In-memory fungible token.
///
/// Intended for tests/dev. Mirrors ERC20-style semantics: balances,
/// owner→spender allowances, open mint. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryToken {
    balances: RwLock<HashMap<Address, u128>>,
    allowances: RwLock<HashMap<(Address, Address), u128>>,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn debit(balances: &mut HashMap<Address, u128>, account: Address, amount: u128) -> Result<(), TokenError> {
        let balance = balances.entry(account).or_default();
        if *balance < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(balances: &mut HashMap<Address, u128>, account: Address, amount: u128) -> Result<(), TokenError> {
        let balance = balances.entry(account).or_default();
        *balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        Ok(())
    }
}

impl TokenService for InMemoryToken {
    fn balance_of(&self, account: Address) -> Result<u128, TokenError> {
        let balances = self.balances.read().map_err(|_| TokenError::Poisoned)?;
        Ok(balances.get(&account).copied().unwrap_or(0))
    }

    fn allowance(&self, owner: Address, spender: Address) -> Result<u128, TokenError> {
        let allowances = self.allowances.read().map_err(|_| TokenError::Poisoned)?;
        Ok(allowances.get(&(owner, spender)).copied().unwrap_or(0))
    }

    fn approve(&self, owner: Address, spender: Address, amount: u128) -> Result<(), TokenError> {
        let mut allowances = self.allowances.write().map_err(|_| TokenError::Poisoned)?;
        allowances.insert((owner, spender), amount);
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        let mut balances = self.balances.write().map_err(|_| TokenError::Poisoned)?;
        Self::debit(&mut balances, from, amount)?;
        Self::credit(&mut balances, to, amount)
    }

    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        // Allowance is checked and consumed before balances move; a failure
        // at any step leaves both maps untouched.
        let mut allowances = self.allowances.write().map_err(|_| TokenError::Poisoned)?;
        let approved = allowances.get(&(from, spender)).copied().unwrap_or(0);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                approved,
            });
        }

        let mut balances = self.balances.write().map_err(|_| TokenError::Poisoned)?;
        Self::debit(&mut balances, from, amount)?;
        Self::credit(&mut balances, to, amount)?;
        allowances.insert((from, spender), approved - amount);
        Ok(())
    }

    fn mint(&self, to: Address, amount: u128) -> Result<(), TokenError> {
        let mut balances = self.balances.write().map_err(|_| TokenError::Poisoned)?;
        Self::credit(&mut balances, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::new([tag; 20])
    }

    #[test]
    fn mint_then_transfer_moves_funds() {
        let token = InMemoryToken::new();
        token.mint(addr(1), 100).unwrap();
        token.transfer(addr(1), addr(2), 40).unwrap();

        assert_eq!(token.balance_of(addr(1)).unwrap(), 60);
        assert_eq!(token.balance_of(addr(2)).unwrap(), 40);
    }

    #[test]
    fn transfer_without_funds_fails_cleanly() {
        let token = InMemoryToken::new();
        let err = token.transfer(addr(1), addr(2), 1).unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientBalance {
                required: 1,
                available: 0
            }
        );
        assert_eq!(token.balance_of(addr(2)).unwrap(), 0);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let token = InMemoryToken::new();
        let owner = addr(1);
        let spender = addr(2);
        let vault = addr(3);

        token.mint(owner, 100).unwrap();
        token.approve(owner, spender, 70).unwrap();

        token.transfer_from(spender, owner, vault, 50).unwrap();
        assert_eq!(token.balance_of(vault).unwrap(), 50);
        assert_eq!(token.allowance(owner, spender).unwrap(), 20);

        let err = token.transfer_from(spender, owner, vault, 30).unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientAllowance {
                required: 30,
                approved: 20
            }
        );
    }

    #[test]
    fn failed_transfer_from_leaves_allowance_intact() {
        let token = InMemoryToken::new();
        let owner = addr(1);
        let spender = addr(2);

        token.mint(owner, 10).unwrap();
        token.approve(owner, spender, 100).unwrap();

        let err = token.transfer_from(spender, owner, addr(3), 50).unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientBalance {
                required: 50,
                available: 10
            }
        );
        assert_eq!(token.allowance(owner, spender).unwrap(), 100);
        assert_eq!(token.balance_of(owner).unwrap(), 10);
    }
}
