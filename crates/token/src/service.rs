use thiserror::Error;

use coinstake_core::Address;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: u128, approved: u128 },

    #[error("balance overflow")]
    Overflow,

    #[error("token store lock poisoned")]
    Poisoned,
}

/// The fungible token collaborator.
///
/// Off-chain there is no implicit `msg.sender`, so the acting account is an
/// explicit argument everywhere: `transfer` moves the caller's own funds,
/// `transfer_from` spends a previously `approve`d allowance on someone
/// else's.
///
/// Every operation either fully applies or fails without effect.
pub trait TokenService: Send + Sync {
    fn balance_of(&self, account: Address) -> Result<u128, TokenError>;

    /// Remaining amount `spender` may pull from `owner` via `transfer_from`.
    fn allowance(&self, owner: Address, spender: Address) -> Result<u128, TokenError>;

    /// Set `spender`'s allowance on `owner`'s funds to `amount`.
    fn approve(&self, owner: Address, spender: Address, amount: u128) -> Result<(), TokenError>;

    /// Move `amount` from `from`'s own balance to `to`.
    fn transfer(&self, from: Address, to: Address, amount: u128) -> Result<(), TokenError>;

    /// As `spender`, move `amount` from `from` to `to`, consuming allowance.
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    /// Issue `amount` new tokens to `to`. Privileged on a real token; the
    /// ledger is assumed to be authorized.
    fn mint(&self, to: Address, amount: u128) -> Result<(), TokenError>;
}
