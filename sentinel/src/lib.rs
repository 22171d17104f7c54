//! Foreign-language bindings for the Sentinel vault.
//!
//! Exposes [`SentinelRegistry`], a thread-safe registry running on the system
//! clock, together with the [`TransferHandler`] and [`Logger`] callbacks the
//! host implements. Amounts cross the boundary as decimal strings.

mod error;
pub use error::*;

pub mod logger;
pub use logger::{set_logger, LogLevel, Logger};

mod records;
pub use records::*;

mod registry;
pub use registry::*;

uniffi::setup_scaffolding!("sentinel");
