//! `sentinel-core` is a dead man's switch escrow.
//!
//! An owner deposits funds into a [`Vault`] and proves liveness with periodic
//! heartbeats. When the heartbeat lapses, anyone may raise a warning; once the
//! grace period runs out, anyone may start the yield, and an external
//! confirmation either revives the vault or releases the whole balance to the
//! beneficiary. Nothing happens on a timer: every phase is derived from the
//! stored timestamps and the ledger clock at call time.
//!
//! [`Sentinel`] is the entry point. It is generic over a [`VaultStore`] and
//! takes its [`Clock`], [`TransferDispatcher`] and [`EventSink`] as trait
//! objects.

mod amount;
pub use amount::*;

mod clock;
pub use clock::*;

pub mod defaults;

pub mod error;
pub use error::*;

pub mod events;
pub use events::{EventSink, LogEventSink, MemoryEventSink, VaultEvent};

pub mod ledger;

mod protocol;
pub use protocol::*;

mod registry;
pub use registry::*;

pub mod settlement;
pub use settlement::{LogDispatcher, TransferDispatcher, TransferInstruction, TransferOutbox, TransferReason};

mod store;
pub use store::*;

pub mod time;
pub use time::TimeStatus;

mod types;
pub use types::*;

mod vault;
pub use vault::*;

mod view;
pub use view::*;
