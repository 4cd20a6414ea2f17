//! `coinstake-staking` — the deposit/withdrawal accounting engine.
//!
//! The heart of the crate is [`StakingLedger`], a pure aggregate holding the
//! yield-config registry, the deposit map with its per-user index, and the
//! mint-allowance accumulator. [`StakingService`] wraps it with role checks,
//! token transfers, and event logging; all mutation flows through the
//! aggregate's `handle`/`apply` split, so every call either fully commits or
//! fully aborts.

pub mod error;
pub mod events;
pub mod ledger;
pub mod reward;
pub mod service;
pub mod types;

pub use error::{LedgerError, StakingError};
pub use events::StakingEvent;
pub use ledger::{StakingCommand, StakingLedger};
pub use reward::{pending_reward, RATE_DENOMINATOR, SECONDS_PER_YEAR};
pub use service::StakingService;
pub use types::{Deposit, DepositRequest, YieldConfig};
