//! The vault service.
//!
//! [`Sentinel`] is the single entry point for every external call. Each call
//! reads the ledger clock once, loads a working copy of the vault, applies the
//! rules and commits the copy. Only after the commit are transfer instructions
//! handed to the [`TransferDispatcher`] and events to the [`EventSink`], so a
//! failed call leaves no trace and a failed dispatch never undoes a commit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::clock::Clock;
use crate::error::{SentinelError, SentinelResult};
use crate::events::{EventSink, LogEventSink, VaultEvent};
use crate::ledger;
use crate::registry::{parse_beneficiary, VaultRegistry};
use crate::settlement::{TransferDispatcher, TransferInstruction};
use crate::store::{MemoryVaultStore, VaultStore};
use crate::types::{AccountId, Timestamp};
use crate::vault::{PulseStatus, ResumeStatus, Vault, WarningStatus};
use crate::view::VaultView;

/// Returned by [`Sentinel::setup_vault`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupReceipt {
    /// Owner of the new vault.
    pub owner: AccountId,
}

/// Returned by [`Sentinel::deposit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Balance after the deposit.
    pub new_balance: Amount,
}

/// Returned by [`Sentinel::withdraw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    /// Amount sent to the owner.
    pub withdrawn: Amount,
    /// Balance left in the vault.
    pub remaining: Amount,
}

/// Returned by [`Sentinel::reset_vault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetReceipt {
    /// Balance refunded to the owner.
    pub returned_balance: Amount,
}

/// Returned by [`Sentinel::raise_warning`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningReport {
    /// What the call found or did.
    pub status: WarningStatus,
    /// `true` only when this call raised the warning.
    pub warning_sent: bool,
    /// Account the call targeted.
    pub owner: AccountId,
}

/// Returned by [`Sentinel::pulse_check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseReport {
    /// What the call found or did.
    pub status: PulseStatus,
    /// Whether the vault is yielding after the call.
    pub is_yielding: bool,
    /// Account the call targeted.
    pub owner: AccountId,
}

/// Returned by [`Sentinel::resume_pulse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeReport {
    /// What the call did.
    pub status: ResumeStatus,
    /// Amount released to the beneficiary; zero unless death was confirmed.
    pub transferred: Amount,
    /// Account the call targeted.
    pub owner: AccountId,
}

/// Side effects a transaction hands out after its commit.
struct Outcome<T> {
    value: T,
    transfer: Option<TransferInstruction>,
    event: Option<VaultEvent>,
}

impl<T> Outcome<T> {
    const fn quiet(value: T) -> Self {
        Self {
            value,
            transfer: None,
            event: None,
        }
    }

    const fn announced(value: T, event: VaultEvent) -> Self {
        Self {
            value,
            transfer: None,
            event: Some(event),
        }
    }

    fn with_transfer(self, transfer: Option<TransferInstruction>) -> Self {
        Self { transfer, ..self }
    }
}

/// Dead man's switch vault service.
///
/// Owner operations take the caller explicitly and always act on the caller's
/// own vault. Trigger operations ([`raise_warning`](Self::raise_warning),
/// [`pulse_check`](Self::pulse_check), [`resume_pulse`](Self::resume_pulse))
/// may be called by anyone for any account and report ordinary phase
/// mismatches as statuses rather than errors.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use sentinel_core::{AccountId, Amount, ManualClock, MemoryVaultStore, Sentinel, TransferOutbox};
///
/// let clock = Arc::new(ManualClock::at_millis(0));
/// let outbox = Arc::new(TransferOutbox::new());
/// let mut sentinel = Sentinel::new(MemoryVaultStore::new(), clock.clone(), outbox.clone());
///
/// let alice = AccountId::new("alice.near").unwrap();
/// sentinel.setup_vault(&alice, "bob.near", Some(60_000), Some(60_000)).unwrap();
/// sentinel.deposit(&alice, Amount::from(100u128)).unwrap();
///
/// clock.set_millis(61_000);
/// assert!(sentinel.raise_warning(&alice).unwrap().warning_sent);
/// ```
pub struct Sentinel<S = MemoryVaultStore> {
    registry: VaultRegistry<S>,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<dyn TransferDispatcher>,
    events: Arc<dyn EventSink>,
    agent: Option<AccountId>,
}

impl<S: VaultStore> Sentinel<S> {
    /// Creates a service over `store` with no authorized agent, publishing
    /// events to the `log` facade.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>, dispatcher: Arc<dyn TransferDispatcher>) -> Self {
        Self {
            registry: VaultRegistry::new(store),
            clock,
            dispatcher,
            events: Arc::new(LogEventSink),
            agent: None,
        }
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(self, events: Arc<dyn EventSink>) -> Self {
        Self { events, ..self }
    }

    /// Sets the account allowed to call [`agent_ping`](Self::agent_ping).
    #[must_use]
    pub fn with_agent(self, agent: Option<AccountId>) -> Self {
        Self { agent, ..self }
    }

    /// The authorized agent, if one is configured.
    #[must_use]
    pub const fn agent(&self) -> Option<&AccountId> {
        self.agent.as_ref()
    }

    /// Borrows the vault registry.
    #[must_use]
    pub const fn registry(&self) -> &VaultRegistry<S> {
        &self.registry
    }

    /// Unwraps the underlying store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.registry.into_store()
    }

    // Owner operations

    /// Creates a vault owned by `caller`.
    ///
    /// Missing or sub-floor durations fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `caller` already has a vault and
    /// `InvalidArgument` if `beneficiary` is blank.
    pub fn setup_vault(
        &mut self,
        caller: &AccountId,
        beneficiary: &str,
        interval_ms: Option<u64>,
        grace_period_ms: Option<u64>,
    ) -> SentinelResult<SetupReceipt> {
        let now = self.clock.now();
        let vault = self
            .registry
            .create(caller, beneficiary, interval_ms, grace_period_ms, now)?;
        log::info!(
            "vault created for {} (beneficiary {}, interval {}ms, grace {}ms)",
            vault.owner(),
            vault.beneficiary(),
            vault.heartbeat_interval_ms(),
            vault.grace_period_ms()
        );
        self.events.emit(&VaultEvent::VaultCreated {
            owner: vault.owner().clone(),
            beneficiary: vault.beneficiary().clone(),
            heartbeat_interval_ms: vault.heartbeat_interval_ms(),
            grace_period_ms: vault.grace_period_ms(),
        });
        Ok(SetupReceipt {
            owner: caller.clone(),
        })
    }

    /// Records a heartbeat for the caller's vault.
    ///
    /// Cancels any running warning, yield or emergency.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault.
    pub fn ping(&mut self, caller: &AccountId) -> SentinelResult<()> {
        self.owner_transaction(caller, "ping", |vault, now| {
            let effect = vault.heartbeat(now);
            if effect.cancelled_yield {
                log::info!("yield cancelled for {}: owner is alive", vault.owner());
            } else {
                log::info!("heartbeat from {}", vault.owner());
            }
            Ok(Outcome::announced(
                (),
                VaultEvent::Heartbeat {
                    owner: vault.owner().clone(),
                    timestamp: now,
                    cancelled_distress: effect.cancelled_distress(),
                },
            ))
        })
    }

    /// Adds `amount` to the caller's vault. Allowed in every phase.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault and `InvalidArgument`
    /// for a zero amount or on overflow.
    pub fn deposit(&mut self, caller: &AccountId, amount: Amount) -> SentinelResult<DepositReceipt> {
        self.owner_transaction(caller, "deposit", |vault, _| {
            let new_balance = ledger::deposit(vault, amount)?;
            log::info!(
                "deposit of {amount} into vault {}, balance {new_balance}",
                vault.owner()
            );
            Ok(Outcome::announced(
                DepositReceipt { new_balance },
                VaultEvent::Deposit {
                    owner: vault.owner().clone(),
                    amount,
                    new_balance,
                },
            ))
        })
    }

    /// Sends `amount` (the whole balance when `None`) back to the caller.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault, `InvalidState` while
    /// the vault is yielding or in emergency, and `InvalidArgument` for a
    /// zero amount or one exceeding the balance.
    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        amount: Option<Amount>,
    ) -> SentinelResult<WithdrawReceipt> {
        self.owner_transaction(caller, "withdraw", |vault, now| {
            let transfer = ledger::withdraw(vault, amount, now)?;
            let receipt = WithdrawReceipt {
                withdrawn: transfer.amount,
                remaining: vault.balance(),
            };
            log::info!(
                "withdrawal of {} from vault {}, remaining {}",
                receipt.withdrawn,
                vault.owner(),
                receipt.remaining
            );
            Ok(Outcome::announced(
                receipt,
                VaultEvent::Withdraw {
                    owner: vault.owner().clone(),
                    amount: receipt.withdrawn,
                    remaining: receipt.remaining,
                },
            )
            .with_transfer(Some(transfer)))
        })
    }

    /// Replaces the beneficiary of the caller's vault.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `new_beneficiary` is blank and `NotFound`
    /// if the caller has no vault.
    pub fn update_beneficiary(
        &mut self,
        caller: &AccountId,
        new_beneficiary: &str,
    ) -> SentinelResult<()> {
        let beneficiary = parse_beneficiary(new_beneficiary)?;
        self.owner_transaction(caller, "update_beneficiary", |vault, _| {
            log::info!("beneficiary of {} set to {beneficiary}", vault.owner());
            let value = beneficiary.to_string();
            vault.set_beneficiary(beneficiary);
            Ok(Outcome::announced(
                (),
                VaultEvent::ConfigUpdated {
                    owner: vault.owner().clone(),
                    field: "beneficiary",
                    value,
                },
            ))
        })
    }

    /// Replaces the heartbeat interval of the caller's vault.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault, `InvalidArgument`
    /// below the interval floor and `InvalidState` while yielding or in emergency.
    pub fn update_interval(&mut self, caller: &AccountId, new_interval_ms: u64) -> SentinelResult<()> {
        self.owner_transaction(caller, "update_interval", |vault, _| {
            vault.set_heartbeat_interval(new_interval_ms)?;
            log::info!("heartbeat interval of {} set to {new_interval_ms}ms", vault.owner());
            Ok(Outcome::announced(
                (),
                VaultEvent::ConfigUpdated {
                    owner: vault.owner().clone(),
                    field: "heartbeat_interval_ms",
                    value: new_interval_ms.to_string(),
                },
            ))
        })
    }

    /// Replaces the grace period of the caller's vault.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault, `InvalidArgument`
    /// below the grace floor and `InvalidState` while yielding or in emergency.
    pub fn update_grace_period(
        &mut self,
        caller: &AccountId,
        new_grace_period_ms: u64,
    ) -> SentinelResult<()> {
        self.owner_transaction(caller, "update_grace_period", |vault, _| {
            vault.set_grace_period(new_grace_period_ms)?;
            log::info!("grace period of {} set to {new_grace_period_ms}ms", vault.owner());
            Ok(Outcome::announced(
                (),
                VaultEvent::ConfigUpdated {
                    owner: vault.owner().clone(),
                    field: "grace_period_ms",
                    value: new_grace_period_ms.to_string(),
                },
            ))
        })
    }

    /// Deletes the caller's vault and refunds the balance, whatever the phase.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault.
    pub fn reset_vault(&mut self, caller: &AccountId) -> SentinelResult<ResetReceipt> {
        let now = self.clock.now();
        let mut vault = self.registry.require(caller)?;
        authorize_owner(&vault, caller, "reset_vault")?;

        let refund = ledger::refund_to_owner(&mut vault, now);
        let returned_balance = refund.as_ref().map_or(Amount::ZERO, |refund| refund.amount);
        self.registry.remove(&vault)?;
        log::info!(
            "vault of {} reset, {returned_balance} returned",
            vault.owner()
        );

        let outcome = Outcome::announced(
            ResetReceipt { returned_balance },
            VaultEvent::VaultReset {
                owner: vault.owner().clone(),
                returned_balance,
            },
        )
        .with_transfer(refund);
        Ok(self.publish(outcome))
    }

    // Trigger protocol

    /// Raises the inactivity warning for `account_id` once its heartbeat has
    /// lapsed. Anyone may call this.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn raise_warning(&mut self, account_id: &AccountId) -> SentinelResult<WarningReport> {
        let status = self.trigger_transaction(account_id, |vault, now| {
            let status = vault.raise_warning(now);
            if status != WarningStatus::WarningTriggered {
                log::debug!("raise_warning for {}: {status}", vault.owner());
                return Ok(Outcome::quiet(status));
            }
            log::warn!(
                "heartbeat of {} lapsed, grace period of {}ms started",
                vault.owner(),
                vault.grace_period_ms()
            );
            Ok(Outcome::announced(
                status,
                VaultEvent::WarningSent {
                    owner: vault.owner().clone(),
                    timestamp: now,
                },
            ))
        })?;
        let status = status.unwrap_or(WarningStatus::VaultNotFound);
        Ok(WarningReport {
            status,
            warning_sent: status == WarningStatus::WarningTriggered,
            owner: account_id.clone(),
        })
    }

    /// Starts the yield for `account_id` once the grace period is over.
    /// Anyone may call this.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn pulse_check(&mut self, account_id: &AccountId) -> SentinelResult<PulseReport> {
        let report = self.trigger_transaction(account_id, |vault, now| {
            let status = vault.pulse_check(now);
            let is_yielding = vault.is_yielding();
            if status != PulseStatus::YieldInitiated {
                log::debug!("pulse_check for {}: {status}", vault.owner());
                return Ok(Outcome::quiet((status, is_yielding)));
            }
            log::warn!(
                "grace period of {} elapsed, awaiting death confirmation",
                vault.owner()
            );
            Ok(Outcome::announced(
                (status, is_yielding),
                VaultEvent::YieldInitiated {
                    owner: vault.owner().clone(),
                    timestamp: now,
                },
            ))
        })?;
        let (status, is_yielding) = report.unwrap_or((PulseStatus::VaultNotFound, false));
        Ok(PulseReport {
            status,
            is_yielding,
            owner: account_id.clone(),
        })
    }

    /// Ends the yield of `account_id`.
    ///
    /// With `confirm_death` the whole balance is released to the beneficiary
    /// and the vault enters the emergency phase; otherwise the owner is
    /// treated as alive and the warning is cleared.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the vault exists but is not yielding.
    pub fn resume_pulse(
        &mut self,
        account_id: &AccountId,
        confirm_death: bool,
    ) -> SentinelResult<ResumeReport> {
        let report = self.trigger_transaction(account_id, |vault, now| {
            let (status, transfer) = vault.resume(confirm_death, now)?;
            let transferred = transfer.as_ref().map_or(Amount::ZERO, |t| t.amount);
            let event = if confirm_death {
                log::warn!(
                    "death of {} confirmed, {transferred} released to {}",
                    vault.owner(),
                    vault.beneficiary()
                );
                VaultEvent::TransferComplete {
                    owner: vault.owner().clone(),
                    beneficiary: vault.beneficiary().clone(),
                    amount: transferred,
                }
            } else {
                log::info!("{} verified alive, yield cancelled", vault.owner());
                VaultEvent::ResumedAlive {
                    owner: vault.owner().clone(),
                }
            };
            Ok(Outcome::announced((status, transferred), event).with_transfer(transfer))
        })?;
        let (status, transferred) = report.unwrap_or((ResumeStatus::VaultNotFound, Amount::ZERO));
        Ok(ResumeReport {
            status,
            transferred,
            owner: account_id.clone(),
        })
    }

    /// Refreshes the heartbeat of `account_id` on behalf of its owner.
    ///
    /// Only the configured agent may call this, and it cannot cancel a yield
    /// or an emergency.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless `caller` is the configured agent,
    /// `NotFound` if `account_id` has no vault and `InvalidState` while the
    /// vault is yielding or in emergency.
    pub fn agent_ping(&mut self, caller: &AccountId, account_id: &AccountId) -> SentinelResult<()> {
        if self.agent.as_ref() != Some(caller) {
            return Err(SentinelError::Unauthorized {
                caller: caller.clone(),
                owner: account_id.clone(),
                action: "agent_ping",
            });
        }
        let now = self.clock.now();
        let mut vault = self.registry.require(account_id)?;
        vault.relay_heartbeat(now)?;
        self.registry.commit(vault)?;
        log::info!("agent {caller} refreshed heartbeat of {account_id}");
        self.events.emit(&VaultEvent::AgentPing {
            owner: account_id.clone(),
            agent: caller.clone(),
            timestamp: now,
        });
        Ok(())
    }

    // Queries

    /// Snapshot of the vault of `account_id` as of now.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn get_vault(&self, account_id: &AccountId) -> SentinelResult<Option<VaultView>> {
        let now = self.clock.now();
        Ok(self
            .registry
            .get(account_id)?
            .map(|vault| VaultView::at(&vault, now)))
    }

    /// Owners of every vault in stable order, optionally paginated.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn get_all_vaults(
        &self,
        from_index: Option<usize>,
        limit: Option<usize>,
    ) -> SentinelResult<Vec<AccountId>> {
        self.registry.list_owners(from_index.unwrap_or(0), limit)
    }

    /// Number of registered vaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn get_vault_count(&self) -> SentinelResult<usize> {
        self.registry.count()
    }

    // Transactions

    fn owner_transaction<T>(
        &mut self,
        caller: &AccountId,
        action: &'static str,
        apply: impl FnOnce(&mut Vault, Timestamp) -> SentinelResult<Outcome<T>>,
    ) -> SentinelResult<T> {
        let now = self.clock.now();
        let mut vault = self.registry.require(caller)?;
        authorize_owner(&vault, caller, action)?;
        let outcome = apply(&mut vault, now)?;
        self.registry.commit(vault)?;
        Ok(self.publish(outcome))
    }

    /// Like `owner_transaction` but open to any caller. Returns `None` for a
    /// missing vault and skips the write when nothing changed.
    fn trigger_transaction<T>(
        &mut self,
        account_id: &AccountId,
        apply: impl FnOnce(&mut Vault, Timestamp) -> SentinelResult<Outcome<T>>,
    ) -> SentinelResult<Option<T>> {
        let now = self.clock.now();
        let Some(mut vault) = self.registry.get(account_id)? else {
            log::debug!("no vault registered for {account_id}");
            return Ok(None);
        };
        let before = vault.clone();
        let outcome = apply(&mut vault, now)?;
        if vault != before {
            self.registry.commit(vault)?;
        }
        Ok(Some(self.publish(outcome)))
    }

    fn publish<T>(&self, outcome: Outcome<T>) -> T {
        let Outcome {
            value,
            transfer,
            event,
        } = outcome;
        if let Some(transfer) = transfer {
            self.dispatch(transfer);
        }
        if let Some(event) = event {
            self.events.emit(&event);
        }
        value
    }

    fn dispatch(&self, transfer: TransferInstruction) {
        let summary = format!(
            "{} of {} from vault {} to {}",
            transfer.reason, transfer.amount, transfer.vault_owner, transfer.recipient
        );
        if let Err(err) = self.dispatcher.dispatch(transfer) {
            log::error!("transfer dispatch failed ({summary}): {err}");
        }
    }
}

// Owner operations look the vault up by caller, so this only fails if a store
// returns a record filed under the wrong owner.
fn authorize_owner(vault: &Vault, caller: &AccountId, action: &'static str) -> SentinelResult<()> {
    if vault.owner() == caller {
        return Ok(());
    }
    Err(SentinelError::Unauthorized {
        caller: caller.clone(),
        owner: vault.owner().clone(),
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::MemoryEventSink;
    use crate::settlement::{TransferOutbox, TransferReason};
    use crate::ErrorKind;

    struct Harness {
        clock: Arc<ManualClock>,
        outbox: Arc<TransferOutbox>,
        events: Arc<MemoryEventSink>,
        sentinel: Sentinel,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::at_millis(0));
        let outbox = Arc::new(TransferOutbox::new());
        let events = Arc::new(MemoryEventSink::new());
        let sentinel = Sentinel::new(MemoryVaultStore::new(), clock.clone(), outbox.clone())
            .with_event_sink(events.clone());
        Harness {
            clock,
            outbox,
            events,
            sentinel,
        }
    }

    fn id(name: &str) -> AccountId {
        AccountId::new(name).unwrap()
    }

    /// Answers every lookup with the first stored vault.
    struct MisfiledStore(MemoryVaultStore);

    impl VaultStore for MisfiledStore {
        fn get(&self, _owner: &AccountId) -> SentinelResult<Option<Vault>> {
            Ok(self.0.to_vaults().into_iter().next())
        }

        fn put(&mut self, vault: Vault) -> SentinelResult<()> {
            self.0.put(vault)
        }

        fn remove(&mut self, owner: &AccountId) -> SentinelResult<Option<Vault>> {
            self.0.remove(owner)
        }

        fn owners(&self, from_index: usize, limit: Option<usize>) -> SentinelResult<Vec<AccountId>> {
            self.0.owners(from_index, limit)
        }

        fn len(&self) -> SentinelResult<usize> {
            self.0.len()
        }
    }

    #[test]
    fn test_owner_calls_refuse_a_misfiled_record() {
        let alice = id("alice.near");
        let mallory = id("mallory.near");
        let vault = Vault::new(
            alice.clone(),
            id("bob.near"),
            60_000,
            60_000,
            Timestamp::from_millis(0),
        );
        let store = MisfiledStore(MemoryVaultStore::from_vaults(vec![vault]).unwrap());
        let outbox = Arc::new(TransferOutbox::new());
        let mut sentinel = Sentinel::new(store, Arc::new(ManualClock::at_millis(5)), outbox.clone());

        for err in [
            sentinel.ping(&mallory).unwrap_err(),
            sentinel.withdraw(&mallory, None).unwrap_err(),
            sentinel.update_interval(&mallory, 120_000).unwrap_err(),
            sentinel.reset_vault(&mallory).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                SentinelError::Unauthorized { ref caller, ref owner, .. }
                    if *caller == mallory && *owner == alice
            ));
        }
        assert!(outbox.pending().unwrap().is_empty());
        let stored = sentinel.into_store().0.to_vaults();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].last_active(), Timestamp::from_millis(0));
        assert_eq!(stored[0].heartbeat_interval_ms(), 60_000);
    }

    #[test]
    fn test_failed_owner_call_changes_nothing() {
        let mut h = harness();
        let alice = id("alice.near");
        h.sentinel
            .setup_vault(&alice, "bob.near", Some(60_000), Some(60_000))
            .unwrap();
        h.sentinel.deposit(&alice, Amount::from(10u128)).unwrap();
        let _ = h.events.take();

        let err = h.sentinel.withdraw(&alice, Some(Amount::from(11u128))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(h.events.take().is_empty());
        assert!(h.outbox.pending().unwrap().is_empty());
        let view = h.sentinel.get_vault(&alice).unwrap().unwrap();
        assert_eq!(view.vault_balance, Amount::from(10u128));
    }

    #[test]
    fn test_transfer_dispatched_after_commit() {
        let mut h = harness();
        let alice = id("alice.near");
        h.sentinel.setup_vault(&alice, "bob.near", None, None).unwrap();
        h.sentinel.deposit(&alice, Amount::from(40u128)).unwrap();

        let receipt = h.sentinel.withdraw(&alice, Some(Amount::from(15u128))).unwrap();
        assert_eq!(receipt.remaining, Amount::from(25u128));

        let pending = h.outbox.drain().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reason, TransferReason::Withdrawal);
        assert_eq!(pending[0].amount, Amount::from(15u128));
        assert_eq!(pending[0].issued_at, h.clock.now());
    }

    #[test]
    fn test_trigger_no_op_emits_nothing() {
        let mut h = harness();
        let alice = id("alice.near");
        h.sentinel
            .setup_vault(&alice, "bob.near", Some(60_000), Some(60_000))
            .unwrap();
        let _ = h.events.take();

        let report = h.sentinel.raise_warning(&alice).unwrap();
        assert_eq!(report.status, WarningStatus::NotExpired);
        assert!(!report.warning_sent);
        assert!(h.events.take().is_empty());

        h.clock.set_millis(61_000);
        h.sentinel.raise_warning(&alice).unwrap();
        let events = h.events.take();
        assert!(matches!(events.as_slice(), [VaultEvent::WarningSent { .. }]));
    }

    #[test]
    fn test_reset_refunds_and_removes() {
        let mut h = harness();
        let alice = id("alice.near");
        h.sentinel.setup_vault(&alice, "bob.near", None, None).unwrap();
        h.sentinel.deposit(&alice, Amount::from(9u128)).unwrap();

        let receipt = h.sentinel.reset_vault(&alice).unwrap();
        assert_eq!(receipt.returned_balance, Amount::from(9u128));
        assert_eq!(h.sentinel.get_vault_count().unwrap(), 0);
        let refund = h.outbox.drain().unwrap();
        assert_eq!(refund[0].recipient, alice);
        assert_eq!(refund[0].reason, TransferReason::OwnerRefund);

        // The owner may start over.
        h.sentinel.setup_vault(&alice, "carol.near", None, None).unwrap();
    }

    #[test]
    fn test_agent_ping_requires_configured_agent() {
        let mut h = harness();
        let alice = id("alice.near");
        let agent = id("agent.near");
        h.sentinel.setup_vault(&alice, "bob.near", None, None).unwrap();

        let err = h.sentinel.agent_ping(&agent, &alice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let mut sentinel = h.sentinel.with_agent(Some(agent.clone()));
        h.clock.set_millis(5_000);
        sentinel.agent_ping(&agent, &alice).unwrap();
        let view = sentinel.get_vault(&alice).unwrap().unwrap();
        assert_eq!(view.last_active, Timestamp::from_millis(5_000));

        let err = sentinel.agent_ping(&agent, &id("nobody.near")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
