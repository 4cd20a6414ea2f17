//! The staking ledger aggregate.
//!
//! Pure state machine: [`StakingLedger::handle`] validates a command against
//! current state and returns the events it would commit; `apply` evolves the
//! state from those events and cannot fail. Token transfers and role checks
//! live in [`crate::service`], between a fully-validated `handle` and the
//! infallible `apply` — which is what makes every call, batches included,
//! all-or-nothing.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use coinstake_core::{Address, Aggregate, AggregateRoot, DepositId, YieldConfigId};

use crate::error::LedgerError;
use crate::events::StakingEvent;
use crate::reward::{elapsed_secs, pending_reward};
use crate::types::{Deposit, DepositRequest, YieldConfig};

/// Commands accepted by the ledger.
///
/// Time is always caller-relative: `now` on the settlement commands, per-entry
/// `deposit_time` on deposits. The ledger never reads a clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakingCommand {
    SetYieldConfig {
        yield_config_id: YieldConfigId,
        config: YieldConfig,
        now: DateTime<Utc>,
    },
    /// Batch deposit; entries are validated and committed in the given order.
    Deposit { entries: Vec<DepositRequest> },
    /// Reward-bearing withdrawal, only at or past the lockup.
    Withdraw {
        deposit_id: DepositId,
        now: DateTime<Utc>,
    },
    /// Early exit strictly before the lockup; no reward accrues.
    WithdrawNoReward {
        deposit_id: DepositId,
        now: DateTime<Utc>,
    },
    /// Drain the full mint allowance to `to`.
    Mint { to: Address, now: DateTime<Utc> },
}

/// Authoritative store of yield configs, live deposits, the per-user deposit
/// index, and the mint-allowance accumulator.
///
/// Identified by the vault address whose custody it accounts for.
///
/// # Invariants
/// - Every live `DepositId` is unique; a removed id's slot is simply absent
///   and may be reused by a later deposit.
/// - Every live deposit's `yield_config_id` resolves to a stored config, and
///   stored configs always have `lockup_secs > 0`.
/// - `deposits_by_user(u)` lists exactly the live deposits owned by `u`, in
///   insertion order, with no duplicates.
/// - The mint allowance only grows between `Mint` commands and is zeroed by
///   them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingLedger {
    vault: Address,
    configs: HashMap<YieldConfigId, YieldConfig>,
    deposits: HashMap<DepositId, Deposit>,
    user_index: HashMap<Address, Vec<DepositId>>,
    mint_allowance: u128,
    version: u64,
}

impl StakingLedger {
    pub fn new(vault: Address) -> Self {
        Self {
            vault,
            configs: HashMap::new(),
            deposits: HashMap::new(),
            user_index: HashMap::new(),
            mint_allowance: 0,
            version: 0,
        }
    }

    pub fn vault(&self) -> Address {
        self.vault
    }

    pub fn yield_config(&self, id: YieldConfigId) -> Option<&YieldConfig> {
        self.configs.get(&id)
    }

    pub fn deposit(&self, id: DepositId) -> Option<&Deposit> {
        self.deposits.get(&id)
    }

    /// Live deposit ids owned by `user`, in insertion order.
    pub fn deposits_by_user(&self, user: Address) -> &[DepositId] {
        self.user_index.get(&user).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn mint_allowance(&self) -> u128 {
        self.mint_allowance
    }

    /// Reward the given deposit would earn if withdrawn at `now`.
    pub fn pending_reward_at(
        &self,
        deposit_id: DepositId,
        now: DateTime<Utc>,
    ) -> Result<u128, LedgerError> {
        let deposit = self
            .deposits
            .get(&deposit_id)
            .ok_or(LedgerError::DepositNotFound(deposit_id))?;
        let config = self.config_for(deposit)?;
        pending_reward(
            deposit.amount,
            config.rate,
            elapsed_secs(deposit.deposit_time, now),
        )
    }

    fn config_for(&self, deposit: &Deposit) -> Result<&YieldConfig, LedgerError> {
        self.configs
            .get(&deposit.yield_config_id)
            .ok_or(LedgerError::InvalidLockup(deposit.yield_config_id))
    }

    fn handle_set_yield_config(
        &self,
        yield_config_id: YieldConfigId,
        config: YieldConfig,
        now: DateTime<Utc>,
    ) -> Result<Vec<StakingEvent>, LedgerError> {
        // lockup_secs == 0 is the "unset" sentinel; storing it would make the
        // config indistinguishable from absent and reopen the id to re-setting.
        if config.lockup_secs == 0 {
            return Err(LedgerError::InvalidLockup(yield_config_id));
        }
        if self.configs.contains_key(&yield_config_id) {
            return Err(LedgerError::ConfigAlreadySet(yield_config_id));
        }

        Ok(vec![StakingEvent::YieldConfigSet {
            yield_config_id,
            rate: config.rate,
            lockup_secs: config.lockup_secs,
            occurred_at: now,
        }])
    }

    fn handle_deposit(&self, entries: &[DepositRequest]) -> Result<Vec<StakingEvent>, LedgerError> {
        let mut events = Vec::with_capacity(entries.len());
        let mut batch_ids: HashSet<DepositId> = HashSet::with_capacity(entries.len());

        for entry in entries {
            if entry.user.is_zero() {
                return Err(LedgerError::InvalidUser(entry.deposit_id));
            }
            if entry.amount == 0 {
                return Err(LedgerError::InvalidAmount(entry.deposit_id));
            }
            if !self.configs.contains_key(&entry.yield_config_id) {
                return Err(LedgerError::InvalidLockup(entry.yield_config_id));
            }
            // Unique against live deposits and against earlier entries of the
            // same batch; either collision voids the whole call.
            if self.deposits.contains_key(&entry.deposit_id)
                || !batch_ids.insert(entry.deposit_id)
            {
                return Err(LedgerError::DuplicateDepositId(entry.deposit_id));
            }

            events.push(StakingEvent::TokensDeposited {
                deposit_id: entry.deposit_id,
                user: entry.user,
                amount: entry.amount,
                yield_config_id: entry.yield_config_id,
                deposit_time: entry.deposit_time,
            });
        }

        Ok(events)
    }

    fn handle_withdraw(
        &self,
        deposit_id: DepositId,
        now: DateTime<Utc>,
    ) -> Result<Vec<StakingEvent>, LedgerError> {
        let deposit = self
            .deposits
            .get(&deposit_id)
            .ok_or(LedgerError::DepositNotFound(deposit_id))?;
        let config = self.config_for(deposit)?;

        let elapsed = elapsed_secs(deposit.deposit_time, now);
        if elapsed < config.lockup_secs {
            return Err(LedgerError::LockupNotMet(deposit_id));
        }

        let reward = pending_reward(deposit.amount, config.rate, elapsed)?;
        self.mint_allowance
            .checked_add(reward)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        Ok(vec![StakingEvent::TokensWithdrawn {
            deposit_id,
            user: deposit.user,
            amount: deposit.amount,
            reward,
            occurred_at: now,
        }])
    }

    fn handle_withdraw_no_reward(
        &self,
        deposit_id: DepositId,
        now: DateTime<Utc>,
    ) -> Result<Vec<StakingEvent>, LedgerError> {
        let deposit = self
            .deposits
            .get(&deposit_id)
            .ok_or(LedgerError::DepositNotFound(deposit_id))?;
        let config = self.config_for(deposit)?;

        // Early-exit path only: once matured, the holder must take the
        // reward-bearing withdrawal.
        if elapsed_secs(deposit.deposit_time, now) >= config.lockup_secs {
            return Err(LedgerError::LockupAlreadyMet(deposit_id));
        }

        Ok(vec![StakingEvent::TokensWithdrawn {
            deposit_id,
            user: deposit.user,
            amount: deposit.amount,
            reward: 0,
            occurred_at: now,
        }])
    }

    fn handle_mint(&self, to: Address, now: DateTime<Utc>) -> Result<Vec<StakingEvent>, LedgerError> {
        if self.mint_allowance == 0 {
            return Err(LedgerError::ZeroMintAllowance);
        }

        Ok(vec![StakingEvent::RewardMinted {
            to,
            amount: self.mint_allowance,
            occurred_at: now,
        }])
    }
}

impl AggregateRoot for StakingLedger {
    type Id = Address;

    fn id(&self) -> &Self::Id {
        &self.vault
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for StakingLedger {
    type Command = StakingCommand;
    type Event = StakingEvent;
    type Error = LedgerError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StakingEvent::YieldConfigSet {
                yield_config_id,
                rate,
                lockup_secs,
                ..
            } => {
                self.configs.insert(
                    *yield_config_id,
                    YieldConfig {
                        rate: *rate,
                        lockup_secs: *lockup_secs,
                    },
                );
            }
            StakingEvent::TokensDeposited {
                deposit_id,
                user,
                amount,
                yield_config_id,
                deposit_time,
            } => {
                self.deposits.insert(
                    *deposit_id,
                    Deposit {
                        user: *user,
                        amount: *amount,
                        yield_config_id: *yield_config_id,
                        deposit_time: *deposit_time,
                    },
                );
                self.user_index.entry(*user).or_default().push(*deposit_id);
            }
            StakingEvent::TokensWithdrawn {
                deposit_id,
                user,
                reward,
                ..
            } => {
                self.deposits.remove(deposit_id);
                if let Some(ids) = self.user_index.get_mut(user) {
                    ids.retain(|id| id != deposit_id);
                    if ids.is_empty() {
                        self.user_index.remove(user);
                    }
                }
                // Overflow was checked in handle; saturating keeps apply total.
                self.mint_allowance = self.mint_allowance.saturating_add(*reward);
            }
            StakingEvent::RewardMinted { .. } => {
                self.mint_allowance = 0;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StakingCommand::SetYieldConfig {
                yield_config_id,
                config,
                now,
            } => self.handle_set_yield_config(*yield_config_id, *config, *now),
            StakingCommand::Deposit { entries } => self.handle_deposit(entries),
            StakingCommand::Withdraw { deposit_id, now } => {
                self.handle_withdraw(*deposit_id, *now)
            }
            StakingCommand::WithdrawNoReward { deposit_id, now } => {
                self.handle_withdraw_no_reward(*deposit_id, *now)
            }
            StakingCommand::Mint { to, now } => self.handle_mint(*to, *now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn addr(tag: u8) -> Address {
        Address::new([tag; 20])
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()
    }

    fn ledger_with_config(lockup_secs: u64, rate: u64) -> StakingLedger {
        let mut ledger = StakingLedger::new(addr(0xff));
        let events = ledger
            .handle(&StakingCommand::SetYieldConfig {
                yield_config_id: YieldConfigId::new(0),
                config: YieldConfig { rate, lockup_secs },
                now: t0(),
            })
            .unwrap();
        apply_all(&mut ledger, &events);
        ledger
    }

    fn apply_all(ledger: &mut StakingLedger, events: &[StakingEvent]) {
        for event in events {
            ledger.apply(event);
        }
    }

    fn request(id: u64, user: Address, amount: u128) -> DepositRequest {
        DepositRequest {
            deposit_id: DepositId::new(id),
            user,
            amount,
            yield_config_id: YieldConfigId::new(0),
            deposit_time: t0(),
        }
    }

    fn commit(ledger: &mut StakingLedger, command: StakingCommand) -> Vec<StakingEvent> {
        let events = ledger.handle(&command).unwrap();
        apply_all(ledger, &events);
        events
    }

    #[test]
    fn yield_config_is_immutable_once_set() {
        let mut ledger = ledger_with_config(600, 100);

        let err = ledger
            .handle(&StakingCommand::SetYieldConfig {
                yield_config_id: YieldConfigId::new(0),
                config: YieldConfig {
                    rate: 999,
                    lockup_secs: 1,
                },
                now: t0(),
            })
            .unwrap_err();

        assert_eq!(err, LedgerError::ConfigAlreadySet(YieldConfigId::new(0)));
        // Stored terms are untouched.
        assert_eq!(
            ledger.yield_config(YieldConfigId::new(0)),
            Some(&YieldConfig {
                rate: 100,
                lockup_secs: 600
            })
        );
    }

    #[test]
    fn zero_lockup_config_is_rejected() {
        let ledger = StakingLedger::new(addr(0xff));
        let err = ledger
            .handle(&StakingCommand::SetYieldConfig {
                yield_config_id: YieldConfigId::new(7),
                config: YieldConfig {
                    rate: 100,
                    lockup_secs: 0,
                },
                now: t0(),
            })
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidLockup(YieldConfigId::new(7)));
    }

    #[test]
    fn deposit_validation_rejects_bad_entries() {
        let ledger = ledger_with_config(600, 100);

        let zero_user = ledger.handle(&StakingCommand::Deposit {
            entries: vec![request(1, Address::ZERO, 100)],
        });
        assert_eq!(zero_user, Err(LedgerError::InvalidUser(DepositId::new(1))));

        let zero_amount = ledger.handle(&StakingCommand::Deposit {
            entries: vec![request(1, addr(1), 0)],
        });
        assert_eq!(zero_amount, Err(LedgerError::InvalidAmount(DepositId::new(1))));

        let mut unset_config = request(1, addr(1), 100);
        unset_config.yield_config_id = YieldConfigId::new(9);
        let err = ledger.handle(&StakingCommand::Deposit {
            entries: vec![unset_config],
        });
        assert_eq!(err, Err(LedgerError::InvalidLockup(YieldConfigId::new(9))));
    }

    #[test]
    fn batch_aborts_on_any_invalid_entry() {
        let mut ledger = ledger_with_config(600, 100);

        let err = ledger
            .handle(&StakingCommand::Deposit {
                entries: vec![
                    request(1, addr(1), 100),
                    request(2, addr(2), 200),
                    request(3, addr(3), 0),
                ],
            })
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(DepositId::new(3)));

        // handle returned an error, so nothing was applied: entries 1 and 2
        // must not be observable.
        assert!(ledger.deposit(DepositId::new(1)).is_none());
        assert!(ledger.deposit(DepositId::new(2)).is_none());
        assert!(ledger.deposits_by_user(addr(1)).is_empty());

        // The same batch with the bad entry fixed commits all three.
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![
                    request(1, addr(1), 100),
                    request(2, addr(2), 200),
                    request(3, addr(3), 300),
                ],
            },
        );
        assert_eq!(ledger.deposits_by_user(addr(2)), &[DepositId::new(2)]);
    }

    #[test]
    fn duplicate_ids_rejected_across_ledger_and_within_batch() {
        let mut ledger = ledger_with_config(600, 100);
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(1), 100)],
            },
        );

        let live_dup = ledger.handle(&StakingCommand::Deposit {
            entries: vec![request(1, addr(2), 50)],
        });
        assert_eq!(live_dup, Err(LedgerError::DuplicateDepositId(DepositId::new(1))));

        let batch_dup = ledger.handle(&StakingCommand::Deposit {
            entries: vec![request(2, addr(2), 50), request(2, addr(3), 60)],
        });
        assert_eq!(batch_dup, Err(LedgerError::DuplicateDepositId(DepositId::new(2))));
    }

    #[test]
    fn deposit_id_is_reusable_after_withdrawal() {
        let mut ledger = ledger_with_config(600, 100);
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(1), 100)],
            },
        );
        commit(
            &mut ledger,
            StakingCommand::Withdraw {
                deposit_id: DepositId::new(1),
                now: t0() + Duration::seconds(600),
            },
        );

        // The slot is absent now; the id may be taken again.
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(2), 42)],
            },
        );
        assert_eq!(ledger.deposit(DepositId::new(1)).unwrap().user, addr(2));
    }

    #[test]
    fn withdraw_boundary_is_inclusive() {
        let mut ledger = ledger_with_config(600, 100);
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(1), 100)],
            },
        );

        let early = ledger.handle(&StakingCommand::Withdraw {
            deposit_id: DepositId::new(1),
            now: t0() + Duration::seconds(599),
        });
        assert_eq!(early, Err(LedgerError::LockupNotMet(DepositId::new(1))));

        // elapsed == lockup passes.
        let events = ledger
            .handle(&StakingCommand::Withdraw {
                deposit_id: DepositId::new(1),
                now: t0() + Duration::seconds(600),
            })
            .unwrap();
        apply_all(&mut ledger, &events);
        assert!(ledger.deposit(DepositId::new(1)).is_none());
    }

    #[test]
    fn withdraw_no_reward_boundary_is_exclusive() {
        let mut ledger = ledger_with_config(600, 100);
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(1), 100)],
            },
        );

        let matured = ledger.handle(&StakingCommand::WithdrawNoReward {
            deposit_id: DepositId::new(1),
            now: t0() + Duration::seconds(600),
        });
        assert_eq!(matured, Err(LedgerError::LockupAlreadyMet(DepositId::new(1))));

        let events = ledger
            .handle(&StakingCommand::WithdrawNoReward {
                deposit_id: DepositId::new(1),
                now: t0() + Duration::seconds(599),
            })
            .unwrap();
        match &events[0] {
            StakingEvent::TokensWithdrawn { reward, .. } => assert_eq!(*reward, 0),
            other => panic!("unexpected event {other:?}"),
        }
        apply_all(&mut ledger, &events);
        assert_eq!(ledger.mint_allowance(), 0);
    }

    #[test]
    fn withdrawal_is_terminal() {
        let mut ledger = ledger_with_config(600, 100);
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(1), 100)],
            },
        );
        let now = t0() + Duration::seconds(600);
        commit(
            &mut ledger,
            StakingCommand::Withdraw {
                deposit_id: DepositId::new(1),
                now,
            },
        );

        // Both settlement paths see the absent slot.
        assert_eq!(
            ledger.handle(&StakingCommand::Withdraw {
                deposit_id: DepositId::new(1),
                now
            }),
            Err(LedgerError::DepositNotFound(DepositId::new(1)))
        );
        assert_eq!(
            ledger.handle(&StakingCommand::WithdrawNoReward {
                deposit_id: DepositId::new(1),
                now
            }),
            Err(LedgerError::DepositNotFound(DepositId::new(1)))
        );
    }

    #[test]
    fn reward_accrues_to_allowance_and_mint_drains_it() {
        // rate 55, amount 31_536_000, elapsed 10_080 -> 554 (floored).
        let mut ledger = ledger_with_config(600, 55);
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(1), 31_536_000), request(2, addr(2), 31_536_000)],
            },
        );

        let now = t0() + Duration::seconds(10_080);
        commit(
            &mut ledger,
            StakingCommand::Withdraw {
                deposit_id: DepositId::new(1),
                now,
            },
        );
        commit(
            &mut ledger,
            StakingCommand::Withdraw {
                deposit_id: DepositId::new(2),
                now,
            },
        );
        assert_eq!(ledger.mint_allowance(), 2 * 554);

        let events = commit(
            &mut ledger,
            StakingCommand::Mint {
                to: addr(9),
                now,
            },
        );
        match &events[0] {
            StakingEvent::RewardMinted { to, amount, .. } => {
                assert_eq!(*to, addr(9));
                assert_eq!(*amount, 2 * 554);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(ledger.mint_allowance(), 0);

        assert_eq!(
            ledger.handle(&StakingCommand::Mint { to: addr(9), now }),
            Err(LedgerError::ZeroMintAllowance)
        );
    }

    #[test]
    fn accrual_continues_past_lockup() {
        let mut ledger = ledger_with_config(600, 1_000);
        commit(
            &mut ledger,
            StakingCommand::Deposit {
                entries: vec![request(1, addr(1), 31_536_000_000)],
            },
        );

        let at_lockup = ledger
            .pending_reward_at(DepositId::new(1), t0() + Duration::seconds(600))
            .unwrap();
        let much_later = ledger
            .pending_reward_at(DepositId::new(1), t0() + Duration::seconds(600_000))
            .unwrap();
        assert!(much_later > at_lockup);
    }

    proptest! {
        /// Index consistency: after any interleaving of deposits and
        /// withdrawals, the per-user index lists exactly the live deposits of
        /// that user, in insertion order, without duplicates.
        #[test]
        fn user_index_tracks_live_deposits(ops in prop::collection::vec((0u64..24, 1u8..4, any::<bool>()), 1..60)) {
            let mut ledger = ledger_with_config(600, 100);
            let now = t0() + Duration::seconds(600);
            let mut insertion_order: Vec<(DepositId, Address)> = Vec::new();

            for (raw_id, user_tag, withdraw) in ops {
                let deposit_id = DepositId::new(raw_id);
                let user = addr(user_tag);

                if withdraw {
                    let cmd = StakingCommand::Withdraw { deposit_id, now };
                    if let Ok(events) = ledger.handle(&cmd) {
                        apply_all(&mut ledger, &events);
                        insertion_order.retain(|(id, _)| *id != deposit_id);
                    }
                } else {
                    let cmd = StakingCommand::Deposit {
                        entries: vec![request(raw_id, user, 100)],
                    };
                    if let Ok(events) = ledger.handle(&cmd) {
                        apply_all(&mut ledger, &events);
                        insertion_order.push((deposit_id, user));
                    }
                }
            }

            for user_tag in 1u8..4 {
                let user = addr(user_tag);
                let expected: Vec<DepositId> = insertion_order
                    .iter()
                    .filter(|(_, owner)| *owner == user)
                    .map(|(id, _)| *id)
                    .collect();
                prop_assert_eq!(ledger.deposits_by_user(user), expected.as_slice());
            }
        }
    }
}
