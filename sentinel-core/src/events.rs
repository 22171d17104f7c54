//! Structured protocol events for off-chain indexers.
//!
//! Each event is rendered as a single `EVENT_JSON:` line:
//!
//! ```text
//! EVENT_JSON:{"standard":"sentinel","version":"1.0.0","event":"warning_sent","data":{...}}
//! ```

use std::sync::Mutex;

use serde::Serialize;

use crate::amount::Amount;
use crate::types::{AccountId, Timestamp};

/// Event standard name written into every envelope.
pub const EVENT_STANDARD: &str = "sentinel";

/// Event standard version written into every envelope.
pub const EVENT_VERSION: &str = "1.0.0";

/// Prefix that marks a log line as a machine-readable event.
pub const EVENT_JSON_PREFIX: &str = "EVENT_JSON:";

/// A state change worth telling the outside world about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum VaultEvent {
    /// A vault was set up.
    VaultCreated {
        /// New vault owner.
        owner: AccountId,
        /// Designated beneficiary.
        beneficiary: AccountId,
        /// Effective heartbeat interval.
        heartbeat_interval_ms: u64,
        /// Effective grace period.
        grace_period_ms: u64,
    },
    /// The owner proved liveness.
    Heartbeat {
        /// Vault owner.
        owner: AccountId,
        /// New `last_active`.
        timestamp: Timestamp,
        /// A running warning, yield or emergency was cancelled.
        cancelled_distress: bool,
    },
    /// Funds were added.
    Deposit {
        /// Vault owner.
        owner: AccountId,
        /// Amount added.
        amount: Amount,
        /// Balance afterwards.
        new_balance: Amount,
    },
    /// Funds were withdrawn by the owner.
    Withdraw {
        /// Vault owner.
        owner: AccountId,
        /// Amount debited.
        amount: Amount,
        /// Balance afterwards.
        remaining: Amount,
    },
    /// An owner setting changed.
    ConfigUpdated {
        /// Vault owner.
        owner: AccountId,
        /// Setting name.
        field: &'static str,
        /// New value, rendered as text.
        value: String,
    },
    /// The heartbeat lapsed and the grace period started.
    WarningSent {
        /// Vault owner.
        owner: AccountId,
        /// When the warning was raised.
        timestamp: Timestamp,
    },
    /// The grace period ended and the vault awaits confirmation.
    YieldInitiated {
        /// Vault owner.
        owner: AccountId,
        /// When the yield began.
        timestamp: Timestamp,
    },
    /// The yield was cancelled because the owner was verified alive.
    ResumedAlive {
        /// Vault owner.
        owner: AccountId,
    },
    /// Death was confirmed and custody released.
    TransferComplete {
        /// Vault owner.
        owner: AccountId,
        /// Recipient of the balance.
        beneficiary: AccountId,
        /// Amount released; zero when the vault was empty.
        amount: Amount,
    },
    /// The authorized agent refreshed the heartbeat on the owner's behalf.
    AgentPing {
        /// Vault owner.
        owner: AccountId,
        /// Agent that made the call.
        agent: AccountId,
        /// New `last_active`.
        timestamp: Timestamp,
    },
    /// The owner deleted the vault.
    VaultReset {
        /// Former owner.
        owner: AccountId,
        /// Balance refunded to the owner.
        returned_balance: Amount,
    },
}

#[derive(Serialize)]
struct EventEnvelope<'a> {
    standard: &'static str,
    version: &'static str,
    #[serde(flatten)]
    event: &'a VaultEvent,
}

impl VaultEvent {
    /// Renders the event as an `EVENT_JSON:` line.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_event_json(&self) -> Result<String, serde_json::Error> {
        let body = serde_json::to_string(&EventEnvelope {
            standard: EVENT_STANDARD,
            version: EVENT_VERSION,
            event: self,
        })?;
        Ok(format!("{EVENT_JSON_PREFIX}{body}"))
    }
}

/// Receiver of protocol events.
pub trait EventSink: Send + Sync {
    /// Publishes an event. Must not fail the calling transaction.
    fn emit(&self, event: &VaultEvent);
}

/// Writes events to the `log` facade under the `sentinel::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &VaultEvent) {
        match event.to_event_json() {
            Ok(line) => log::info!(target: "sentinel::events", "{line}"),
            Err(err) => log::error!(target: "sentinel::events", "failed to encode event: {err}"),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<VaultEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all collected events.
    #[must_use]
    pub fn take(&self) -> Vec<VaultEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &VaultEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
