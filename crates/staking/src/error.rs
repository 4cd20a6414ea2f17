//! Error taxonomy for the staking engine.
//!
//! Everything here is a rejected precondition, not a crash: a failing check
//! aborts the whole call (including every entry of a batch) with no partial
//! state change, and the caller may resubmit.

use thiserror::Error;

use coinstake_auth::AuthzError;
use coinstake_core::{DepositId, YieldConfigId};
use coinstake_events::EventLogError;
use coinstake_token::TokenError;

/// Failures decided by the pure ledger aggregate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("deposit {0}: user cannot be the zero address")]
    InvalidUser(DepositId),

    #[error("deposit {0}: amount must be non-zero")]
    InvalidAmount(DepositId),

    #[error("yield config {0} is unset or has a zero lockup")]
    InvalidLockup(YieldConfigId),

    #[error("deposit id {0} already exists")]
    DuplicateDepositId(DepositId),

    #[error("yield config {0} is already set")]
    ConfigAlreadySet(YieldConfigId),

    #[error("deposit {0} not found")]
    DepositNotFound(DepositId),

    #[error("deposit {0} has not reached its lockup yet")]
    LockupNotMet(DepositId),

    #[error("deposit {0} has already reached its lockup")]
    LockupAlreadyMet(DepositId),

    #[error("mint allowance is zero")]
    ZeroMintAllowance,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Umbrella error for the role-gated service surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StakingError {
    #[error(transparent)]
    Auth(#[from] AuthzError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    EventLog(#[from] EventLogError),
}
