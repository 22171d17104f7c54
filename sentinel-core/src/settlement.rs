//! Outbound transfer instructions.
//!
//! Moving value out of a vault is a two-part affair: the vault's balance is
//! debited inside the protocol transaction, and a [`TransferInstruction`] is
//! handed to the ledger's settlement layer afterwards. Dispatch is one-way:
//! the protocol does not wait for settlement and does not roll back the
//! debit if settlement later fails.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::amount::Amount;
use crate::error::{SentinelError, SentinelResult};
use crate::types::{AccountId, Timestamp};

/// Why funds are leaving a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferReason {
    /// Owner withdrew part or all of the balance.
    Withdrawal,
    /// Death was confirmed; the whole balance goes to the beneficiary.
    BeneficiaryRelease,
    /// Owner reset the vault; the whole balance goes back to the owner.
    OwnerRefund,
}

/// A request to the settlement layer to pay `amount` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    /// Vault the funds came from.
    pub vault_owner: AccountId,
    /// Account to be credited.
    pub recipient: AccountId,
    /// Amount debited from the vault.
    pub amount: Amount,
    /// Which protocol step produced the instruction.
    pub reason: TransferReason,
    /// Ledger time of the debit.
    pub issued_at: Timestamp,
}

/// Settlement layer that executes transfer instructions.
pub trait TransferDispatcher: Send + Sync {
    /// Accepts an instruction for asynchronous execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not even be queued. The
    /// caller logs the failure; the vault debit stands regardless.
    fn dispatch(&self, instruction: TransferInstruction) -> SentinelResult<()>;
}

/// In-memory FIFO of instructions awaiting settlement.
///
/// The developer CLI persists the drained contents alongside the vaults, and
/// tests use it to observe exactly which transfers a call produced.
#[derive(Debug, Default)]
pub struct TransferOutbox {
    queue: Mutex<VecDeque<TransferInstruction>>,
}

impl TransferOutbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an outbox pre-filled with previously pending instructions.
    #[must_use]
    pub fn with_pending(pending: Vec<TransferInstruction>) -> Self {
        Self {
            queue: Mutex::new(pending.into()),
        }
    }

    /// Removes and returns every queued instruction in dispatch order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the queue mutex is poisoned.
    pub fn drain(&self) -> SentinelResult<Vec<TransferInstruction>> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| SentinelError::storage("outbox mutex poisoned"))?;
        Ok(queue.drain(..).collect())
    }

    /// Returns a copy of the queued instructions without removing them.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the queue mutex is poisoned.
    pub fn pending(&self) -> SentinelResult<Vec<TransferInstruction>> {
        let queue = self
            .queue
            .lock()
            .map_err(|_| SentinelError::storage("outbox mutex poisoned"))?;
        Ok(queue.iter().cloned().collect())
    }
}

impl TransferDispatcher for TransferOutbox {
    fn dispatch(&self, instruction: TransferInstruction) -> SentinelResult<()> {
        self.queue
            .lock()
            .map_err(|_| SentinelError::storage("outbox mutex poisoned"))?
            .push_back(instruction);
        Ok(())
    }
}

/// Dispatcher that only records instructions in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl TransferDispatcher for LogDispatcher {
    fn dispatch(&self, instruction: TransferInstruction) -> SentinelResult<()> {
        log::info!(
            "TRANSFER: {} -> {} ({}) from vault {}",
            instruction.amount,
            instruction.recipient,
            instruction.reason,
            instruction.vault_owner
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(amount: u128) -> TransferInstruction {
        TransferInstruction {
            vault_owner: AccountId::new("alice.near").unwrap(),
            recipient: AccountId::new("bob.near").unwrap(),
            amount: Amount::from(amount),
            reason: TransferReason::BeneficiaryRelease,
            issued_at: Timestamp::from_millis(1),
        }
    }

    #[test]
    fn test_outbox_preserves_order_and_drains() {
        let outbox = TransferOutbox::new();
        outbox.dispatch(instruction(1)).unwrap();
        outbox.dispatch(instruction(2)).unwrap();

        assert_eq!(outbox.pending().unwrap().len(), 2);
        let drained = outbox.drain().unwrap();
        assert_eq!(drained[0].amount, Amount::from(1u128));
        assert_eq!(drained[1].amount, Amount::from(2u128));
        assert!(outbox.pending().unwrap().is_empty());
    }

    #[test]
    fn test_instruction_json_shape() {
        let json = serde_json::to_value(instruction(7)).unwrap();
        assert_eq!(json["reason"], "beneficiary_release");
        assert_eq!(json["amount"], "7");
        assert_eq!(json["recipient"], "bob.near");
    }
}
