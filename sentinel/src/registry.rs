//! The exported vault registry object.

use std::sync::{Arc, Mutex, MutexGuard};

use sentinel_core::{
    AccountId, Amount, Clock, MemoryVaultStore, Sentinel, SentinelError, SystemClock,
    TransferOutbox,
};

use crate::error::{SentinelFfiError, SentinelFfiResult};
use crate::records::{
    PulseOutcome, ResumeOutcome, TransferRecord, VaultRecord, WarningOutcome, WithdrawOutcome,
};

/// Settles transfers on the host side.
///
/// Called after the vault update is committed and the registry lock is
/// released, so the handler may call back into the registry. Settlement is
/// one-way: the registry does not wait for it and does not roll back if it
/// fails.
///
/// ## Swift
///
/// ```swift
/// final class LedgerBridge: Sentinel.TransferHandler {
///     func onTransfer(transfer: Sentinel.TransferRecord) {
///         ledger.enqueue(to: transfer.recipient, amount: transfer.amount)
///     }
/// }
/// ```
#[uniffi::export(with_foreign)]
pub trait TransferHandler: Send + Sync {
    /// Receives one transfer to settle.
    fn on_transfer(&self, transfer: TransferRecord);
}

/// Thread-safe vault registry for foreign callers.
///
/// Every call is serialized behind a mutex and reads the system clock once.
///
/// # Example (Kotlin)
///
/// ```kotlin
/// val registry = SentinelRegistry(handler, agent = null)
/// registry.setupVault("alice.near", "bob.near", null, null)
/// registry.deposit("alice.near", "1000000000000000000000000")
/// ```
#[derive(uniffi::Object)]
pub struct SentinelRegistry {
    inner: Mutex<Sentinel<MemoryVaultStore>>,
    pending: Arc<TransferOutbox>,
    handler: Arc<dyn TransferHandler>,
}

impl SentinelRegistry {
    fn with_clock(
        clock: Arc<dyn Clock>,
        handler: Arc<dyn TransferHandler>,
        agent: Option<String>,
    ) -> SentinelFfiResult<Self> {
        let agent = agent.map(AccountId::new).transpose()?;
        let pending = Arc::new(TransferOutbox::new());
        let sentinel =
            Sentinel::new(MemoryVaultStore::new(), clock, pending.clone()).with_agent(agent);
        Ok(Self {
            inner: Mutex::new(sentinel),
            pending,
            handler,
        })
    }

    /// Hands queued transfers to the host. Call only with the lock released.
    fn settle(&self) {
        match self.pending.drain() {
            Ok(transfers) => {
                for transfer in transfers {
                    self.handler.on_transfer(transfer.into());
                }
            }
            Err(err) => log::error!("failed to drain pending transfers: {err}"),
        }
    }

    fn lock(&self) -> SentinelFfiResult<MutexGuard<'_, Sentinel<MemoryVaultStore>>> {
        self.inner
            .lock()
            .map_err(|_| SentinelError::storage("registry mutex poisoned").into())
    }
}

#[uniffi::export]
impl SentinelRegistry {
    /// Creates an empty registry on the system clock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `agent` is blank.
    #[uniffi::constructor]
    pub fn new(
        handler: Arc<dyn TransferHandler>,
        agent: Option<String>,
    ) -> SentinelFfiResult<Arc<Self>> {
        Self::with_clock(Arc::new(SystemClock::new()), handler, agent).map(Arc::new)
    }

    /// Creates a vault owned by `caller`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `caller` has a vault and `InvalidArgument`
    /// for a blank account.
    pub fn setup_vault(
        &self,
        caller: String,
        beneficiary: &str,
        interval_ms: Option<u64>,
        grace_period_ms: Option<u64>,
    ) -> SentinelFfiResult<String> {
        let caller = AccountId::new(caller)?;
        let receipt =
            self.lock()?
                .setup_vault(&caller, beneficiary, interval_ms, grace_period_ms)?;
        Ok(receipt.owner.into())
    }

    /// Records a heartbeat for the caller's vault.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault.
    pub fn ping(&self, caller: String) -> SentinelFfiResult<()> {
        let caller = AccountId::new(caller)?;
        Ok(self.lock()?.ping(&caller)?)
    }

    /// Deposits a decimal `amount` and returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed or zero amount and `NotFound`
    /// if the caller has no vault.
    pub fn deposit(&self, caller: String, amount: &str) -> SentinelFfiResult<String> {
        let caller = AccountId::new(caller)?;
        let amount = Amount::try_from_decimal_string(amount)?;
        let receipt = self.lock()?.deposit(&caller, amount)?;
        Ok(receipt.new_balance.to_decimal_string())
    }

    /// Withdraws a decimal `amount`, or everything when `None`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` while yielding or in emergency and
    /// `InvalidArgument` for a bad amount.
    pub fn withdraw(
        &self,
        caller: String,
        amount: Option<String>,
    ) -> SentinelFfiResult<WithdrawOutcome> {
        let caller = AccountId::new(caller)?;
        let amount = amount
            .map(|amount| Amount::try_from_decimal_string(&amount))
            .transpose()?;
        let receipt = self.lock()?.withdraw(&caller, amount)?;
        self.settle();
        Ok(receipt.into())
    }

    /// Replaces the beneficiary of the caller's vault.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank beneficiary.
    pub fn update_beneficiary(&self, caller: String, new_beneficiary: &str) -> SentinelFfiResult<()> {
        let caller = AccountId::new(caller)?;
        Ok(self.lock()?.update_beneficiary(&caller, new_beneficiary)?)
    }

    /// Replaces the heartbeat interval of the caller's vault.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` below the floor.
    pub fn update_interval(&self, caller: String, new_interval_ms: u64) -> SentinelFfiResult<()> {
        let caller = AccountId::new(caller)?;
        Ok(self.lock()?.update_interval(&caller, new_interval_ms)?)
    }

    /// Replaces the grace period of the caller's vault.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` below the floor.
    pub fn update_grace_period(
        &self,
        caller: String,
        new_grace_period_ms: u64,
    ) -> SentinelFfiResult<()> {
        let caller = AccountId::new(caller)?;
        Ok(self.lock()?.update_grace_period(&caller, new_grace_period_ms)?)
    }

    /// Deletes the caller's vault and returns the refunded balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the caller has no vault.
    pub fn reset_vault(&self, caller: String) -> SentinelFfiResult<String> {
        let caller = AccountId::new(caller)?;
        let receipt = self.lock()?.reset_vault(&caller)?;
        self.settle();
        Ok(receipt.returned_balance.to_decimal_string())
    }

    /// Raises the inactivity warning for `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank account.
    pub fn raise_warning(&self, account_id: String) -> SentinelFfiResult<WarningOutcome> {
        let account_id = AccountId::new(account_id)?;
        Ok(self.lock()?.raise_warning(&account_id)?.into())
    }

    /// Starts the yield for `account_id` once its grace period is over.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank account.
    pub fn pulse_check(&self, account_id: String) -> SentinelFfiResult<PulseOutcome> {
        let account_id = AccountId::new(account_id)?;
        Ok(self.lock()?.pulse_check(&account_id)?.into())
    }

    /// Ends the yield of `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the vault is not yielding.
    pub fn resume_pulse(
        &self,
        account_id: String,
        confirm_death: bool,
    ) -> SentinelFfiResult<ResumeOutcome> {
        let account_id = AccountId::new(account_id)?;
        let report = self.lock()?.resume_pulse(&account_id, confirm_death)?;
        self.settle();
        Ok(report.into())
    }

    /// Refreshes the heartbeat of `account_id` on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless `caller` is the configured agent.
    pub fn agent_ping(&self, caller: String, account_id: String) -> SentinelFfiResult<()> {
        let caller = AccountId::new(caller)?;
        let account_id = AccountId::new(account_id)?;
        Ok(self.lock()?.agent_ping(&caller, &account_id)?)
    }

    /// Snapshot of the vault of `account_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank account.
    pub fn get_vault(&self, account_id: String) -> SentinelFfiResult<Option<VaultRecord>> {
        let account_id = AccountId::new(account_id)?;
        Ok(self.lock()?.get_vault(&account_id)?.map(VaultRecord::from))
    }

    /// Owners of every vault in stable order, optionally paginated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a bound does not fit the platform word.
    pub fn get_all_vaults(
        &self,
        from_index: Option<u64>,
        limit: Option<u64>,
    ) -> SentinelFfiResult<Vec<String>> {
        let from_index = from_index.map(|n| to_usize("from_index", n)).transpose()?;
        let limit = limit.map(|n| to_usize("limit", n)).transpose()?;
        let owners = self.lock()?.get_all_vaults(from_index, limit)?;
        Ok(owners.into_iter().map(String::from).collect())
    }

    /// Number of registered vaults.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the registry lock is poisoned.
    pub fn get_vault_count(&self) -> SentinelFfiResult<u64> {
        let count = self.lock()?.get_vault_count()?;
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

fn to_usize(parameter: &'static str, value: u64) -> SentinelFfiResult<usize> {
    usize::try_from(value)
        .map_err(|_| SentinelError::invalid_argument(parameter, "out of range").into())
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, OnceLock, Weak};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use sentinel_core::ManualClock;

    #[derive(Default)]
    struct RecordingHandler {
        transfers: Mutex<Vec<TransferRecord>>,
    }

    impl TransferHandler for RecordingHandler {
        fn on_transfer(&self, transfer: TransferRecord) {
            self.transfers.lock().unwrap().push(transfer);
        }
    }

    /// Reads the registry from inside the callback, as a host UI would.
    #[derive(Default)]
    struct ReentrantHandler {
        registry: OnceLock<Weak<SentinelRegistry>>,
        observed: Mutex<Vec<(String, Option<String>)>>,
    }

    impl TransferHandler for ReentrantHandler {
        fn on_transfer(&self, transfer: TransferRecord) {
            let balance = self
                .registry
                .get()
                .and_then(Weak::upgrade)
                .and_then(|registry| registry.get_vault(transfer.vault_owner.clone()).unwrap())
                .map(|vault| vault.vault_balance);
            self.observed.lock().unwrap().push((transfer.amount, balance));
        }
    }

    fn registry(clock: Arc<ManualClock>, handler: Arc<RecordingHandler>) -> SentinelRegistry {
        SentinelRegistry::with_clock(clock, handler, Some("agent.near".to_string())).unwrap()
    }

    #[test]
    fn test_release_reaches_foreign_handler() {
        let clock = Arc::new(ManualClock::at_millis(0));
        let handler = Arc::new(RecordingHandler::default());
        let registry = registry(clock.clone(), handler.clone());

        registry
            .setup_vault("alice.near".into(), "bob.near", Some(60_000), Some(60_000))
            .unwrap();
        let balance = registry
            .deposit("alice.near".into(), "1000000000000000000000000")
            .unwrap();
        assert_eq!(balance, "1000000000000000000000000");

        clock.set_millis(61_000);
        let warning = registry.raise_warning("alice.near".into()).unwrap();
        assert_eq!(warning.status, "WARNING_TRIGGERED");
        clock.set_millis(122_000);
        assert_eq!(
            registry.pulse_check("alice.near".into()).unwrap().status,
            "YIELD_INITIATED"
        );
        let resume = registry.resume_pulse("alice.near".into(), true).unwrap();
        assert_eq!(resume.status, "TRANSFER_COMPLETE");
        assert_eq!(resume.transferred, "1000000000000000000000000");

        let transfers = handler.transfers.lock().unwrap().clone();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].recipient, "bob.near");
        assert_eq!(transfers[0].reason, "beneficiary_release");

        let vault = registry.get_vault("alice.near".into()).unwrap().unwrap();
        assert_eq!(vault.phase, "EMERGENCY_DONE");
        assert_eq!(vault.vault_balance, "0");
    }

    #[test]
    fn test_errors_map_to_kinds() {
        let clock = Arc::new(ManualClock::at_millis(0));
        let registry = registry(clock, Arc::new(RecordingHandler::default()));

        assert!(matches!(
            registry.ping("alice.near".into()),
            Err(SentinelFfiError::NotFound(_))
        ));
        registry
            .setup_vault("alice.near".into(), "bob.near", None, None)
            .unwrap();
        assert!(matches!(
            registry.deposit("alice.near".into(), "12abc"),
            Err(SentinelFfiError::InvalidArgument(_))
        ));
        assert!(matches!(
            registry.agent_ping("mallory.near".into(), "alice.near".into()),
            Err(SentinelFfiError::Unauthorized(_))
        ));
        registry
            .agent_ping("agent.near".into(), "alice.near".into())
            .unwrap();
        assert!(matches!(
            registry.resume_pulse("alice.near".into(), false),
            Err(SentinelFfiError::InvalidState(_))
        ));
        assert_eq!(registry.get_vault_count().unwrap(), 1);
        assert_eq!(
            registry.get_all_vaults(Some(0), Some(10)).unwrap(),
            vec!["alice.near".to_string()]
        );
    }

    #[test]
    fn test_handler_may_call_back_into_registry() {
        let handler = Arc::new(ReentrantHandler::default());
        let registry = Arc::new(
            SentinelRegistry::with_clock(Arc::new(ManualClock::at_millis(0)), handler.clone(), None)
                .unwrap(),
        );
        handler.registry.set(Arc::downgrade(&registry)).unwrap();
        registry
            .setup_vault("alice.near".into(), "bob.near", None, None)
            .unwrap();
        registry.deposit("alice.near".into(), "100").unwrap();

        let (done, finished) = mpsc::channel();
        let worker = Arc::clone(&registry);
        thread::spawn(move || {
            done.send(worker.withdraw("alice.near".into(), Some("30".into())))
                .unwrap();
        });
        let outcome = finished
            .recv_timeout(Duration::from_secs(5))
            .expect("withdraw blocked inside the transfer callback")
            .unwrap();
        assert_eq!(outcome.remaining, "70");

        let refunded = registry.reset_vault("alice.near".into()).unwrap();
        assert_eq!(refunded, "70");
        assert_eq!(
            handler.observed.lock().unwrap().clone(),
            vec![
                ("30".to_string(), Some("70".to_string())),
                ("70".to_string(), None),
            ]
        );
    }
}
