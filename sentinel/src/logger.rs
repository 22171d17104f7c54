use std::sync::{Arc, OnceLock};

/// Receives log records from the vault engine.
///
/// Implement this on the host side and install it once with [`set_logger`].
/// Protocol events arrive as `Info` records whose message starts with
/// `EVENT_JSON:`.
///
/// ## Swift
///
/// ```swift
/// class SentinelLoggerBridge: Sentinel.Logger {
///     func log(level: Sentinel.LogLevel, message: String) {
///         os_log("%{public}@", message)
///     }
/// }
///
/// Sentinel.setLogger(logger: SentinelLoggerBridge()) // once per process
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the given level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing.
    Trace,
    /// Debugging detail, including no-op trigger calls.
    Debug,
    /// State transitions and protocol events.
    Info,
    /// Lapsed heartbeats and started yields.
    Warn,
    /// Failed transfer dispatch.
    Error,
}

/// `log::Log` implementation that forwards to the installed [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        // Debug and trace output from dependencies is noise on a device.
        let is_debug_or_trace =
            record.level() == log::Level::Debug || record.level() == log::Level::Trace;
        let is_from_sentinel = record
            .module_path()
            .is_some_and(|module_path| module_path.starts_with("sentinel"));
        if is_debug_or_trace && !is_from_sentinel {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs the host logger.
///
/// Only the first call takes effect; later calls are reported on stderr and
/// otherwise ignored.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }
    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_map_one_to_one() {
        assert_eq!(log_level(log::Level::Error), LogLevel::Error);
        assert_eq!(log_level(log::Level::Warn), LogLevel::Warn);
        assert_eq!(log_level(log::Level::Trace), LogLevel::Trace);
    }
}
