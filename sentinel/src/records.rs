//! Plain records passed across the FFI boundary.
//!
//! Amounts are decimal strings because most foreign runtimes have no native
//! 256-bit integer. Timestamps are nanoseconds and durations milliseconds,
//! both as `u64`.

use sentinel_core::{
    PulseReport, ResumeReport, TransferInstruction, VaultView, WarningReport, WithdrawReceipt,
};

/// Snapshot of a vault.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct VaultRecord {
    /// Vault owner.
    pub owner_id: String,
    /// Designated beneficiary.
    pub beneficiary_id: String,
    /// Custodied balance, in decimal.
    pub vault_balance: String,
    /// Heartbeat interval in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Grace period in milliseconds.
    pub grace_period_ms: u64,
    /// Last heartbeat, nanoseconds.
    pub last_active: u64,
    /// Milliseconds until the heartbeat lapses.
    pub time_remaining_ms: u64,
    /// When the warning was raised, nanoseconds; zero if none.
    pub warning_triggered_at: u64,
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
    /// Derived phase, e.g. `WARNING_GRACE`.
    pub phase: String,
}

impl From<VaultView> for VaultRecord {
    fn from(view: VaultView) -> Self {
        Self {
            owner_id: view.owner_id.into(),
            beneficiary_id: view.beneficiary_id.into(),
            vault_balance: view.vault_balance.to_decimal_string(),
            heartbeat_interval_ms: view.heartbeat_interval_ms,
            grace_period_ms: view.grace_period_ms,
            last_active: view.last_active.as_nanos(),
            time_remaining_ms: view.time_remaining_ms,
            warning_triggered_at: view.warning_triggered_at.as_nanos(),
            warning_grace_remaining_ms: view.warning_grace_remaining_ms,
            is_initialized: view.is_initialized,
            is_expired: view.is_expired,
            is_warning_active: view.is_warning_active,
            is_execution_ready: view.is_execution_ready,
            is_yielding: view.is_yielding,
            is_emergency: view.is_emergency,
            phase: view.phase.to_string(),
        }
    }
}

/// Result of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct WithdrawOutcome {
    /// Amount sent to the owner.
    pub withdrawn: String,
    /// Balance left in the vault.
    pub remaining: String,
}

impl From<WithdrawReceipt> for WithdrawOutcome {
    fn from(receipt: WithdrawReceipt) -> Self {
        Self {
            withdrawn: receipt.withdrawn.to_decimal_string(),
            remaining: receipt.remaining.to_decimal_string(),
        }
    }
}

/// Result of raising a warning.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct WarningOutcome {
    /// `VAULT_NOT_FOUND`, `NOT_EXPIRED`, `WARNING_ALREADY_SENT` or `WARNING_TRIGGERED`.
    pub status: String,
    /// `true` only when this call raised the warning.
    pub warning_sent: bool,
    /// Account the call targeted.
    pub owner: String,
}

impl From<WarningReport> for WarningOutcome {
    fn from(report: WarningReport) -> Self {
        Self {
            status: report.status.to_string(),
            warning_sent: report.warning_sent,
            owner: report.owner.into(),
        }
    }
}

/// Result of a pulse check.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct PulseOutcome {
    /// Pulse status, e.g. `YIELD_INITIATED`.
    pub status: String,
    /// Whether the vault is yielding after the call.
    pub is_yielding: bool,
    /// Account the call targeted.
    pub owner: String,
}

impl From<PulseReport> for PulseOutcome {
    fn from(report: PulseReport) -> Self {
        Self {
            status: report.status.to_string(),
            is_yielding: report.is_yielding,
            owner: report.owner.into(),
        }
    }
}

/// Result of ending a yield.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ResumeOutcome {
    /// `VAULT_NOT_FOUND`, `RESUMED_ALIVE` or `TRANSFER_COMPLETE`.
    pub status: String,
    /// Amount released to the beneficiary, in decimal.
    pub transferred: String,
    /// Account the call targeted.
    pub owner: String,
}

impl From<ResumeReport> for ResumeOutcome {
    fn from(report: ResumeReport) -> Self {
        Self {
            status: report.status.to_string(),
            transferred: report.transferred.to_decimal_string(),
            owner: report.owner.into(),
        }
    }
}

/// A transfer the host must settle.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct TransferRecord {
    /// Vault the funds came from.
    pub vault_owner: String,
    /// Account to credit.
    pub recipient: String,
    /// Amount, in decimal.
    pub amount: String,
    /// `withdrawal`, `beneficiary_release` or `owner_refund`.
    pub reason: String,
    /// Ledger time of the debit, nanoseconds.
    pub issued_at: u64,
}

impl From<TransferInstruction> for TransferRecord {
    fn from(instruction: TransferInstruction) -> Self {
        Self {
            vault_owner: instruction.vault_owner.into(),
            recipient: instruction.recipient.into(),
            amount: instruction.amount.to_decimal_string(),
            reason: instruction.reason.to_string(),
            issued_at: instruction.issued_at.as_nanos(),
        }
    }
}
