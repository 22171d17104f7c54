//! Balance bookkeeping for a single vault.
//!
//! Every function debits or credits the vault record and, when value leaves
//! the vault, returns the matching [`TransferInstruction`]. The caller commits
//! the record first and dispatches the instruction afterwards.

use crate::amount::Amount;
use crate::error::{SentinelError, SentinelResult};
use crate::settlement::{TransferInstruction, TransferReason};
use crate::types::{AccountId, Timestamp};
use crate::vault::Vault;

/// Credits `amount` to the vault and returns the new balance.
///
/// Allowed in every phase, including mid-warning and after an emergency.
///
/// # Errors
///
/// Returns `InvalidArgument` for a zero amount or if the balance would
/// overflow 256 bits.
pub fn deposit(vault: &mut Vault, amount: Amount) -> SentinelResult<Amount> {
    if amount.is_zero() {
        return Err(SentinelError::invalid_argument(
            "amount",
            "deposit amount required",
        ));
    }
    let new_balance = vault
        .balance
        .checked_add(amount)
        .ok_or_else(|| SentinelError::invalid_argument("amount", "balance overflow"))?;
    vault.balance = new_balance;
    Ok(new_balance)
}

/// Debits a withdrawal for the owner. `None` withdraws the whole balance.
///
/// # Errors
///
/// Returns `InvalidState` while the vault is yielding or in emergency, and
/// `InvalidArgument` for a zero amount or one exceeding the balance.
pub fn withdraw(
    vault: &mut Vault,
    amount: Option<Amount>,
    now: Timestamp,
) -> SentinelResult<TransferInstruction> {
    if vault.is_locked() {
        return Err(SentinelError::invalid_state(
            vault.owner(),
            "vault is locked during emergency/yield state",
        ));
    }
    let amount = amount.unwrap_or(vault.balance);
    if amount.is_zero() {
        return Err(SentinelError::invalid_argument(
            "amount",
            "withdrawal amount must be greater than zero",
        ));
    }
    let remaining = vault.balance.checked_sub(amount).ok_or_else(|| {
        SentinelError::invalid_argument(
            "amount",
            format!("insufficient balance: requested {amount}, available {}", vault.balance),
        )
    })?;
    vault.balance = remaining;
    Ok(TransferInstruction {
        vault_owner: vault.owner().clone(),
        recipient: vault.owner().clone(),
        amount,
        reason: TransferReason::Withdrawal,
        issued_at: now,
    })
}

/// Empties the vault into the beneficiary.
///
/// Returns `None` when there is nothing to move.
pub fn release_to_beneficiary(vault: &mut Vault, now: Timestamp) -> Option<TransferInstruction> {
    let recipient = vault.beneficiary().clone();
    drain(vault, recipient, TransferReason::BeneficiaryRelease, now)
}

/// Empties the vault back into the owner, ignoring any lock.
///
/// Returns `None` when there is nothing to move.
pub fn refund_to_owner(vault: &mut Vault, now: Timestamp) -> Option<TransferInstruction> {
    let recipient = vault.owner().clone();
    drain(vault, recipient, TransferReason::OwnerRefund, now)
}

fn drain(
    vault: &mut Vault,
    recipient: AccountId,
    reason: TransferReason,
    now: Timestamp,
) -> Option<TransferInstruction> {
    let amount = std::mem::take(&mut vault.balance);
    if amount.is_zero() {
        return None;
    }
    Some(TransferInstruction {
        vault_owner: vault.owner().clone(),
        recipient,
        amount,
        reason,
        issued_at: now,
    })
}
