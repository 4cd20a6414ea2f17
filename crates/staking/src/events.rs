//! Observable staking events, consumed by external indexers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coinstake_core::{Address, DepositId, YieldConfigId};
use coinstake_events::Event;

/// Events emitted by committed ledger transitions.
///
/// `TokensWithdrawn` carries the settled principal and reward alongside the
/// deposit id so that applying it (and paying the principal out) needs no
/// second ledger lookup; indexers key on `deposit_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingEvent {
    YieldConfigSet {
        yield_config_id: YieldConfigId,
        rate: u64,
        lockup_secs: u64,
        occurred_at: DateTime<Utc>,
    },
    TokensDeposited {
        deposit_id: DepositId,
        user: Address,
        amount: u128,
        yield_config_id: YieldConfigId,
        deposit_time: DateTime<Utc>,
    },
    TokensWithdrawn {
        deposit_id: DepositId,
        user: Address,
        amount: u128,
        /// Reward credited to the mint allowance; zero on the early-exit path.
        reward: u128,
        occurred_at: DateTime<Utc>,
    },
    RewardMinted {
        to: Address,
        amount: u128,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for StakingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StakingEvent::YieldConfigSet { .. } => "staking.yield_config_set",
            StakingEvent::TokensDeposited { .. } => "staking.tokens_deposited",
            StakingEvent::TokensWithdrawn { .. } => "staking.tokens_withdrawn",
            StakingEvent::RewardMinted { .. } => "staking.reward_minted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StakingEvent::YieldConfigSet { occurred_at, .. } => *occurred_at,
            StakingEvent::TokensDeposited { deposit_time, .. } => *deposit_time,
            StakingEvent::TokensWithdrawn { occurred_at, .. } => *occurred_at,
            StakingEvent::RewardMinted { occurred_at, .. } => *occurred_at,
        }
    }
}
