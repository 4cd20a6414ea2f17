//! Value types of the staking domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coinstake_core::{Address, DepositId, YieldConfigId};

/// Reward terms for deposits referencing this config.
///
/// Set once per id, immutable thereafter. `lockup_secs == 0` is the "unset"
/// sentinel and is never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldConfig {
    /// Per-mille-like annualized coefficient (see [`crate::reward`]).
    pub rate: u64,
    /// Minimum holding duration before a reward-bearing withdrawal, in the
    /// same time unit as deposit timestamps.
    pub lockup_secs: u64,
}

/// A live deposit, keyed by its `DepositId` in the ledger map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub user: Address,
    /// Principal, in token base units. Always non-zero.
    pub amount: u128,
    pub yield_config_id: YieldConfigId,
    /// Caller-supplied business time. Deliberately not server-stamped, so
    /// batches are deterministic and may be back-dated; trusting it is the
    /// operator's responsibility.
    pub deposit_time: DateTime<Utc>,
}

/// One entry of a batch deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub deposit_id: DepositId,
    pub user: Address,
    pub amount: u128,
    pub yield_config_id: YieldConfigId,
    pub deposit_time: DateTime<Utc>,
}
