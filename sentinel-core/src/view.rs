//! Read-only snapshot of a vault, with every time-derived field recomputed.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::types::{AccountId, Timestamp};
use crate::vault::{Vault, VaultPhase};

/// What an observer sees of a vault at a given instant.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultView {
    /// Vault owner.
    pub owner_id: AccountId,
    /// Designated beneficiary.
    pub beneficiary_id: AccountId,
    /// Custodied balance.
    pub vault_balance: Amount,
    /// Heartbeat interval.
    pub heartbeat_interval_ms: u64,
    /// Grace period.
    pub grace_period_ms: u64,
    /// Last heartbeat or creation.
    pub last_active: Timestamp,
    /// Milliseconds until the heartbeat lapses; zero once expired.
    pub time_remaining_ms: u64,
    /// Zero when no warning is raised.
    pub warning_triggered_at: Timestamp,
    /// Milliseconds until the grace period ends.
    pub warning_grace_remaining_ms: u64,
    /// Always `true` for a registered vault.
    pub is_initialized: bool,
    /// The heartbeat deadline has passed.
    pub is_expired: bool,
    /// A warning is raised.
    pub is_warning_active: bool,
    /// The next pulse check starts the yield.
    pub is_execution_ready: bool,
    /// Waiting for death confirmation or revival.
    pub is_yielding: bool,
    /// Custody was released.
    pub is_emergency: bool,
    /// Derived phase.
    pub phase: VaultPhase,
}

impl VaultView {
    /// Builds the view of `vault` as of `now`.
    #[must_use]
    pub fn at(vault: &Vault, now: Timestamp) -> Self {
        let status = vault.time_status(now);
        Self {
            owner_id: vault.owner().clone(),
            beneficiary_id: vault.beneficiary().clone(),
            vault_balance: vault.balance(),
            heartbeat_interval_ms: vault.heartbeat_interval_ms(),
            grace_period_ms: vault.grace_period_ms(),
            last_active: vault.last_active(),
            time_remaining_ms: status.time_remaining_ms,
            warning_triggered_at: vault.warning_raised_at().unwrap_or(Timestamp::ZERO),
            warning_grace_remaining_ms: status.warning_grace_remaining_ms,
            is_initialized: true,
            is_expired: status.expired,
            is_warning_active: vault.warning_raised_at().is_some(),
            is_execution_ready: status.execution_ready,
            is_yielding: vault.is_yielding(),
            is_emergency: vault.is_emergency(),
            phase: vault.phase(now),
        }
    }
}
