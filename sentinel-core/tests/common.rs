//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sentinel_core::{
    AccountId, ManualClock, MemoryEventSink, MemoryVaultStore, Sentinel, TransferOutbox,
};

/// Interval and grace used by the timeline scenarios: one minute each.
pub const MINUTE_MS: u64 = 60_000;

pub struct TestEnv {
    pub clock: Arc<ManualClock>,
    pub outbox: Arc<TransferOutbox>,
    pub events: Arc<MemoryEventSink>,
    pub sentinel: Sentinel,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::with_agent(None)
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(agent: Option<&str>) -> Self {
        let clock = Arc::new(ManualClock::at_millis(0));
        let outbox = Arc::new(TransferOutbox::new());
        let events = Arc::new(MemoryEventSink::new());
        let sentinel = Sentinel::new(MemoryVaultStore::new(), clock.clone(), outbox.clone())
            .with_event_sink(events.clone())
            .with_agent(agent.map(account));
        Self {
            clock,
            outbox,
            events,
            sentinel,
        }
    }

    /// Sets up `owner -> beneficiary` at the current time with one-minute
    /// interval and grace.
    pub fn minute_vault(&mut self, owner: &str, beneficiary: &str) -> AccountId {
        let owner = account(owner);
        self.sentinel
            .setup_vault(&owner, beneficiary, Some(MINUTE_MS), Some(MINUTE_MS))
            .expect("setup vault");
        owner
    }

    pub fn at(&self, millis: u64) {
        self.clock.set_millis(millis);
    }
}

pub fn account(name: &str) -> AccountId {
    AccountId::new(name).expect("valid account")
}
