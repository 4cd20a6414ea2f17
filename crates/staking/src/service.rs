//! Role-gated facade over the ledger aggregate.
//!
//! Every operation follows the same shape: authorize → `handle` (pure
//! validation, returns events) → token side effects → `apply` + event log.
//! The token service is called only after the whole command validated, and
//! ledger state mutates only after the token call succeeded, so a failure at
//! any step leaves no partial state behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use coinstake_auth::{authorize, Role, RoleRegistry};
use coinstake_core::{Address, Aggregate, DepositId, YieldConfigId};
use coinstake_events::EventLog;
use coinstake_token::TokenService;

use crate::error::{LedgerError, StakingError};
use crate::events::StakingEvent;
use crate::ledger::{StakingCommand, StakingLedger};
use crate::types::{Deposit, DepositRequest, YieldConfig};

pub struct StakingService<T: TokenService> {
    ledger: StakingLedger,
    roles: RoleRegistry,
    token: Arc<T>,
    log: EventLog<StakingEvent>,
}

impl<T: TokenService> StakingService<T> {
    /// Create a service accounting for `vault`'s custody, with `admin` as the
    /// bootstrap admin principal.
    pub fn new(admin: Address, vault: Address, token: Arc<T>) -> Self {
        Self {
            ledger: StakingLedger::new(vault),
            roles: RoleRegistry::new(admin),
            token,
            log: EventLog::new(),
        }
    }

    // ── access control ──────────────────────────────────────────────────

    pub fn grant_manager_role(&mut self, caller: Address, grantee: Address) -> Result<(), StakingError> {
        self.roles.grant_role(caller, grantee, Role::Manager)?;
        tracing::info!(%caller, %grantee, "manager role granted");
        Ok(())
    }

    pub fn revoke_manager_role(&mut self, caller: Address, grantee: Address) -> Result<(), StakingError> {
        self.roles.revoke_role(caller, grantee, Role::Manager)?;
        tracing::info!(%caller, %grantee, "manager role revoked");
        Ok(())
    }

    pub fn grant_operator_role(&mut self, caller: Address, grantee: Address) -> Result<(), StakingError> {
        self.roles.grant_role(caller, grantee, Role::Operator)?;
        tracing::info!(%caller, %grantee, "operator role granted");
        Ok(())
    }

    pub fn revoke_operator_role(&mut self, caller: Address, grantee: Address) -> Result<(), StakingError> {
        self.roles.revoke_role(caller, grantee, Role::Operator)?;
        tracing::info!(%caller, %grantee, "operator role revoked");
        Ok(())
    }

    // ── yield registry ──────────────────────────────────────────────────

    pub fn set_yield_config(
        &mut self,
        caller: Address,
        yield_config_id: YieldConfigId,
        config: YieldConfig,
        now: DateTime<Utc>,
    ) -> Result<(), StakingError> {
        authorize(&self.roles, caller, Role::Manager)?;

        let events = self.ledger.handle(&StakingCommand::SetYieldConfig {
            yield_config_id,
            config,
            now,
        })?;
        self.commit(events)?;

        tracing::info!(
            %caller,
            %yield_config_id,
            rate = config.rate,
            lockup_secs = config.lockup_secs,
            "yield config set"
        );
        Ok(())
    }

    // ── deposits ────────────────────────────────────────────────────────

    /// Register a batch of deposits, pulling the batch total from the
    /// caller's token balance into the vault. All-or-nothing: any invalid
    /// entry or a failed token pull leaves the ledger untouched.
    pub fn deposit(
        &mut self,
        caller: Address,
        entries: Vec<DepositRequest>,
    ) -> Result<(), StakingError> {
        authorize(&self.roles, caller, Role::Operator)?;

        let count = entries.len();
        let events = self.ledger.handle(&StakingCommand::Deposit { entries })?;

        // One aggregated pull for the whole batch; per-entry pulls would need
        // compensating transfers to stay atomic on a mid-batch failure.
        let mut total: u128 = 0;
        for event in &events {
            if let StakingEvent::TokensDeposited { amount, .. } = event {
                total = total
                    .checked_add(*amount)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
            }
        }
        let vault = self.ledger.vault();
        self.token.transfer_from(vault, caller, vault, total)?;

        self.commit(events)?;

        tracing::info!(%caller, deposits = count, total, "deposit batch committed");
        Ok(())
    }

    // ── withdrawals ─────────────────────────────────────────────────────

    /// Reward-bearing withdrawal at or past the lockup: the principal goes
    /// back to the deposit's user, the reward accrues to the mint allowance.
    pub fn withdraw(
        &mut self,
        caller: Address,
        deposit_id: DepositId,
        now: DateTime<Utc>,
    ) -> Result<(), StakingError> {
        authorize(&self.roles, caller, Role::Operator)?;

        let events = self
            .ledger
            .handle(&StakingCommand::Withdraw { deposit_id, now })?;
        self.pay_out_principal(&events)?;
        self.commit(events)?;

        tracing::info!(%caller, %deposit_id, "tokens withdrawn");
        Ok(())
    }

    /// Early exit strictly before the lockup: principal only, no reward.
    pub fn withdraw_no_reward(
        &mut self,
        caller: Address,
        deposit_id: DepositId,
        now: DateTime<Utc>,
    ) -> Result<(), StakingError> {
        authorize(&self.roles, caller, Role::Operator)?;

        let events = self
            .ledger
            .handle(&StakingCommand::WithdrawNoReward { deposit_id, now })?;
        self.pay_out_principal(&events)?;
        self.commit(events)?;

        tracing::info!(%caller, %deposit_id, "tokens withdrawn without reward");
        Ok(())
    }

    // ── minting ─────────────────────────────────────────────────────────

    /// Drain the full mint allowance: the token service mints it to the
    /// caller and the allowance resets to zero in the same transition.
    pub fn mint(&mut self, caller: Address, now: DateTime<Utc>) -> Result<(), StakingError> {
        authorize(&self.roles, caller, Role::Operator)?;

        let events = self.ledger.handle(&StakingCommand::Mint { to: caller, now })?;
        for event in &events {
            if let StakingEvent::RewardMinted { to, amount, .. } = event {
                self.token.mint(*to, *amount)?;
                tracing::info!(%caller, amount, "reward minted");
            }
        }
        self.commit(events)?;
        Ok(())
    }

    // ── queries ─────────────────────────────────────────────────────────

    pub fn vault(&self) -> Address {
        self.ledger.vault()
    }

    pub fn yield_config(&self, id: YieldConfigId) -> Option<&YieldConfig> {
        self.ledger.yield_config(id)
    }

    pub fn deposit_by_id(&self, id: DepositId) -> Option<&Deposit> {
        self.ledger.deposit(id)
    }

    pub fn deposits_by_user(&self, user: Address) -> &[DepositId] {
        self.ledger.deposits_by_user(user)
    }

    pub fn mint_allowance(&self) -> u128 {
        self.ledger.mint_allowance()
    }

    pub fn pending_reward_at(
        &self,
        deposit_id: DepositId,
        now: DateTime<Utc>,
    ) -> Result<u128, StakingError> {
        Ok(self.ledger.pending_reward_at(deposit_id, now)?)
    }

    pub fn roles_of(&self, principal: Address) -> Vec<Role> {
        self.roles.roles_of(principal)
    }

    /// Snapshot of the observable event log, in commit order.
    pub fn events(&self) -> Result<Vec<StakingEvent>, StakingError> {
        Ok(self.log.snapshot()?)
    }

    // ── internals ───────────────────────────────────────────────────────

    fn pay_out_principal(&self, events: &[StakingEvent]) -> Result<(), StakingError> {
        for event in events {
            if let StakingEvent::TokensWithdrawn { user, amount, .. } = event {
                self.token.transfer(self.ledger.vault(), *user, *amount)?;
            }
        }
        Ok(())
    }

    /// Apply validated events and append them to the log as one batch.
    fn commit(&mut self, events: Vec<StakingEvent>) -> Result<(), StakingError> {
        for event in &events {
            self.ledger.apply(event);
        }
        self.log.append_batch(&events)?;
        Ok(())
    }
}
