//! The per-owner vault record and its phase transitions.
//!
//! Phases are never stored. They are derived from the stored timestamps and
//! the two distress flags against the current time, so the record cannot
//! drift out of sync with the clock:
//!
//! ```text
//!            ping (owner) resets every phase to ALIVE
//!
//! ALIVE --time--> WARNING_REQUIRED --raise_warning--> WARNING_GRACE
//!                                                         |
//!                                                       time
//!                                                         v
//! EMERGENCY_DONE <--resume(true)-- YIELD_PENDING <--pulse_check-- YIELD_ELIGIBLE
//!                                       |
//!                                  resume(false) --> ALIVE
//! ```

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::amount::Amount;
use crate::defaults::{MIN_GRACE_PERIOD_MS, MIN_INTERVAL_MS};
use crate::error::{SentinelError, SentinelResult};
use crate::ledger;
use crate::settlement::TransferInstruction;
use crate::time::TimeStatus;
use crate::types::{AccountId, Timestamp};

/// Derived phase of a vault at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultPhase {
    /// The heartbeat is current.
    Alive,
    /// The heartbeat lapsed but nobody raised a warning yet.
    WarningRequired,
    /// A warning is raised and the grace period is running.
    WarningGrace,
    /// The grace period is over; the next pulse check starts the yield.
    YieldEligible,
    /// Waiting for an external call to confirm death or revival.
    YieldPending,
    /// Death was confirmed and custody released.
    EmergencyDone,
}

/// Outcome of [`Vault::raise_warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningStatus {
    /// No vault is registered for the account.
    VaultNotFound,
    /// The heartbeat has not lapsed.
    NotExpired,
    /// A warning is already running; nothing changed.
    WarningAlreadySent,
    /// This call raised the warning.
    WarningTriggered,
}

/// Outcome of [`Vault::pulse_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PulseStatus {
    /// No vault is registered for the account.
    VaultNotFound,
    /// The heartbeat is current.
    Alive,
    /// The heartbeat lapsed; a warning must be raised first.
    WarningRequired,
    /// The grace period is still running.
    WarningGracePeriod,
    /// Already yielding; nothing changed.
    YieldPending,
    /// This call started the yield.
    YieldInitiated,
    /// Custody was already released; the cycle restarts only when the owner pings.
    EmergencyComplete,
}

/// Outcome of [`Vault::resume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResumeStatus {
    /// No vault is registered for the account.
    VaultNotFound,
    /// The owner was verified alive; the yield and warning were cleared.
    ResumedAlive,
    /// Death was confirmed and the balance released to the beneficiary.
    TransferComplete,
}

/// What a heartbeat cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatEffect {
    /// A warning had been raised.
    pub cleared_warning: bool,
    /// A yield was pending.
    pub cancelled_yield: bool,
    /// The vault was in the emergency-done phase.
    pub cleared_emergency: bool,
}

impl HeartbeatEffect {
    /// Returns `true` if any distress phase was cancelled.
    #[must_use]
    pub const fn cancelled_distress(&self) -> bool {
        self.cleared_warning || self.cancelled_yield || self.cleared_emergency
    }
}

/// The custody record of one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    owner: AccountId,
    beneficiary: AccountId,
    pub(crate) balance: Amount,
    heartbeat_interval_ms: u64,
    grace_period_ms: u64,
    last_active: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warning_raised_at: Option<Timestamp>,
    is_yielding: bool,
    is_emergency: bool,
}

impl Vault {
    /// Creates a fresh, empty vault that counts as active at `now`.
    ///
    /// Durations are taken as given; the registry applies the policy floors.
    #[must_use]
    pub const fn new(
        owner: AccountId,
        beneficiary: AccountId,
        heartbeat_interval_ms: u64,
        grace_period_ms: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            owner,
            beneficiary,
            balance: Amount::ZERO,
            heartbeat_interval_ms,
            grace_period_ms,
            last_active: now,
            warning_raised_at: None,
            is_yielding: false,
            is_emergency: false,
        }
    }

    /// Owner of the vault.
    #[must_use]
    pub const fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Designated beneficiary.
    #[must_use]
    pub const fn beneficiary(&self) -> &AccountId {
        &self.beneficiary
    }

    /// Custodied balance.
    #[must_use]
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    /// Heartbeat interval in milliseconds.
    #[must_use]
    pub const fn heartbeat_interval_ms(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    /// Grace period in milliseconds.
    #[must_use]
    pub const fn grace_period_ms(&self) -> u64 {
        self.grace_period_ms
    }

    /// Time of the last heartbeat or of creation.
    #[must_use]
    pub const fn last_active(&self) -> Timestamp {
        self.last_active
    }

    /// When the running warning was raised, if any.
    #[must_use]
    pub const fn warning_raised_at(&self) -> Option<Timestamp> {
        self.warning_raised_at
    }

    /// Waiting for death confirmation or revival.
    #[must_use]
    pub const fn is_yielding(&self) -> bool {
        self.is_yielding
    }

    /// Death was confirmed and custody released.
    #[must_use]
    pub const fn is_emergency(&self) -> bool {
        self.is_emergency
    }

    /// Withdrawals are blocked while a distress sequence is in flight.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.is_emergency || self.is_yielding
    }

    /// Evaluates the time policy for this vault.
    #[must_use]
    pub fn time_status(&self, now: Timestamp) -> TimeStatus {
        TimeStatus::evaluate(
            now,
            self.last_active,
            self.heartbeat_interval_ms,
            self.warning_raised_at,
            self.grace_period_ms,
        )
    }

    /// Derives the phase at `now`.
    #[must_use]
    pub fn phase(&self, now: Timestamp) -> VaultPhase {
        if self.is_emergency {
            return VaultPhase::EmergencyDone;
        }
        if self.is_yielding {
            return VaultPhase::YieldPending;
        }
        let status = self.time_status(now);
        if !status.expired {
            VaultPhase::Alive
        } else if self.warning_raised_at.is_none() {
            VaultPhase::WarningRequired
        } else if status.grace_active {
            VaultPhase::WarningGrace
        } else {
            VaultPhase::YieldEligible
        }
    }

    /// Checks the structural invariants of a record loaded from outside.
    ///
    /// # Errors
    ///
    /// Returns a storage error describing the first violated invariant.
    pub fn check_invariants(&self) -> SentinelResult<()> {
        if self.warning_raised_at.is_some_and(Timestamp::is_zero) {
            return Err(SentinelError::storage(format!(
                "vault {}: warning timestamp must be unset or positive",
                self.owner
            )));
        }
        if self.is_yielding && self.warning_raised_at.is_none() {
            return Err(SentinelError::storage(format!(
                "vault {}: yielding without a raised warning",
                self.owner
            )));
        }
        if self.heartbeat_interval_ms < MIN_INTERVAL_MS || self.grace_period_ms < MIN_GRACE_PERIOD_MS
        {
            return Err(SentinelError::storage(format!(
                "vault {}: durations below policy floor",
                self.owner
            )));
        }
        Ok(())
    }

    // Owner transitions

    /// Records a heartbeat: the owner is alive at `now`.
    ///
    /// Clears the warning and both distress flags whatever the phase.
    pub fn heartbeat(&mut self, now: Timestamp) -> HeartbeatEffect {
        let effect = HeartbeatEffect {
            cleared_warning: self.warning_raised_at.is_some(),
            cancelled_yield: self.is_yielding,
            cleared_emergency: self.is_emergency,
        };
        self.last_active = now;
        self.warning_raised_at = None;
        self.is_yielding = false;
        self.is_emergency = false;
        effect
    }

    /// Heartbeat relayed by the authorized agent.
    ///
    /// Unlike the owner's own heartbeat it cannot cancel a yield or an
    /// emergency: those need the owner or the resume handshake.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` while yielding or in emergency.
    pub fn relay_heartbeat(&mut self, now: Timestamp) -> SentinelResult<()> {
        if self.is_locked() {
            return Err(SentinelError::invalid_state(
                &self.owner,
                "cannot relay a heartbeat while yielding or in emergency",
            ));
        }
        self.last_active = now;
        self.warning_raised_at = None;
        Ok(())
    }

    /// Replaces the beneficiary.
    pub fn set_beneficiary(&mut self, beneficiary: AccountId) {
        self.beneficiary = beneficiary;
    }

    /// Replaces the heartbeat interval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `interval_ms` is below [`MIN_INTERVAL_MS`]
    /// and `InvalidState` while yielding or in emergency.
    pub fn set_heartbeat_interval(&mut self, interval_ms: u64) -> SentinelResult<()> {
        self.ensure_unlocked("change the heartbeat interval")?;
        if interval_ms < MIN_INTERVAL_MS {
            return Err(SentinelError::invalid_argument(
                "new_interval_ms",
                format!("interval must be >= {MIN_INTERVAL_MS}ms"),
            ));
        }
        self.heartbeat_interval_ms = interval_ms;
        Ok(())
    }

    /// Replaces the grace period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `grace_ms` is below [`MIN_GRACE_PERIOD_MS`]
    /// and `InvalidState` while yielding or in emergency.
    pub fn set_grace_period(&mut self, grace_ms: u64) -> SentinelResult<()> {
        self.ensure_unlocked("change the grace period")?;
        if grace_ms < MIN_GRACE_PERIOD_MS {
            return Err(SentinelError::invalid_argument(
                "new_grace_period_ms",
                format!("grace period must be >= {MIN_GRACE_PERIOD_MS}ms"),
            ));
        }
        self.grace_period_ms = grace_ms;
        Ok(())
    }

    // Durations stay fixed from the yield until the owner's next ping.
    fn ensure_unlocked(&self, action: &str) -> SentinelResult<()> {
        if self.is_locked() {
            return Err(SentinelError::invalid_state(
                &self.owner,
                format!("cannot {action} while yielding or in emergency"),
            ));
        }
        Ok(())
    }

    // Trigger transitions

    /// Raises the warning if the heartbeat has lapsed.
    ///
    /// Idempotent: once raised, repeated calls report
    /// [`WarningStatus::WarningAlreadySent`] and keep the original timestamp.
    pub fn raise_warning(&mut self, now: Timestamp) -> WarningStatus {
        if !self.time_status(now).expired {
            return WarningStatus::NotExpired;
        }
        if self.warning_raised_at.is_some() {
            return WarningStatus::WarningAlreadySent;
        }
        // Expired means now > last_active + interval > 0, so `now` is never zero.
        self.warning_raised_at = Some(now);
        WarningStatus::WarningTriggered
    }

    /// Starts the yield once the grace period is over.
    ///
    /// Idempotent: a vault already yielding reports
    /// [`PulseStatus::YieldPending`], and a vault whose custody was already
    /// released reports [`PulseStatus::EmergencyComplete`].
    pub fn pulse_check(&mut self, now: Timestamp) -> PulseStatus {
        let status = self.time_status(now);
        if !status.expired {
            return PulseStatus::Alive;
        }
        if self.is_emergency {
            return PulseStatus::EmergencyComplete;
        }
        if self.warning_raised_at.is_none() {
            return PulseStatus::WarningRequired;
        }
        if status.grace_active {
            return PulseStatus::WarningGracePeriod;
        }
        if self.is_yielding {
            return PulseStatus::YieldPending;
        }
        debug_assert!(status.execution_ready);
        self.is_yielding = true;
        PulseStatus::YieldInitiated
    }

    /// Ends the yield.
    ///
    /// With `confirm_death == false` the owner is treated as alive and the
    /// warning is cleared, but `last_active` is untouched: only the owner's own
    /// heartbeat restarts the interval. With `confirm_death == true` the vault
    /// enters the emergency phase and the whole balance is released to the
    /// beneficiary; the returned instruction is `None` for an empty vault.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the vault is not yielding.
    pub fn resume(
        &mut self,
        confirm_death: bool,
        now: Timestamp,
    ) -> SentinelResult<(ResumeStatus, Option<TransferInstruction>)> {
        if !self.is_yielding {
            return Err(SentinelError::invalid_state(
                &self.owner,
                "vault is not in yield state",
            ));
        }
        self.is_yielding = false;

        if !confirm_death {
            self.warning_raised_at = None;
            return Ok((ResumeStatus::ResumedAlive, None));
        }

        self.is_emergency = true;
        let transfer = ledger::release_to_beneficiary(self, now);
        Ok((ResumeStatus::TransferComplete, transfer))
    }
}
