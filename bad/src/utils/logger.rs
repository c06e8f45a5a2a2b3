//! # Logging
//!
//! Builds the global `slog` logger and bridges the `log` facade into it, so
//! library code only ever uses `log::info!` and friends. Terminal, syslog and
//! journald drains are compiled in through the `termlog`, `syslog` and
//! `journald` features; without any of them every record is discarded.

use slog::{o, Drain};

use super::error::Result;
use super::types::LogLevel;

/// Install the global logger.
///
/// The returned guard must be kept alive for as long as logging is needed;
/// dropping it restores the previous (discarding) logger.
pub fn setup_logging(level: LogLevel) -> Result<slog_scope::GlobalLoggerGuard> {
    let guard = slog_scope::set_global_logger(default_root_logger(level)?);
    slog_stdlog::init()?;

    Ok(guard)
}

/// Root logger with every configured drain merged in.
pub fn default_root_logger(level: LogLevel) -> Result<slog::Logger> {
    let drain = slog::Duplicate(default_discard()?, default_discard()?).fuse();

    #[cfg(feature = "termlog")]
    let drain = slog::Duplicate(default_term_drain(level)?, drain).fuse();

    #[cfg(feature = "syslog")]
    let drain = slog::Duplicate(default_syslog_drain(level)?, drain).fuse();

    #[cfg(all(feature = "journald", target_os = "linux"))]
    let drain = slog::Duplicate(default_journald_drain(level)?, drain).fuse();

    #[cfg(not(any(feature = "termlog", feature = "syslog", feature = "journald")))]
    let _ = level;

    Ok(slog::Logger::root(drain, o!("who" => "badc")))
}

fn default_discard() -> Result<slog_async::Async> {
    Ok(slog_async::Async::default(slog::Discard))
}

// term drain: Log to Terminal
#[cfg(feature = "termlog")]
fn default_term_drain(level: LogLevel) -> Result<slog_async::Async> {
    let plain = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let term = slog_term::FullFormat::new(plain).build();
    let filtered = slog::LevelFilter::new(term, level.to_slog()).fuse();

    Ok(slog_async::Async::default(filtered))
}

// syslog drain: Log to syslog
#[cfg(feature = "syslog")]
fn default_syslog_drain(level: LogLevel) -> Result<slog_async::Async> {
    let syslog = slog_syslog::unix_3164(slog_syslog::Facility::LOG_USER)
        .map_err(|e| super::error::Error::with_source("failed to open syslog", Box::new(e)))?;
    let filtered = slog::LevelFilter::new(syslog.fuse(), level.to_slog()).fuse();

    Ok(slog_async::Async::default(filtered))
}

// journald drain: Log to journald
#[cfg(all(feature = "journald", target_os = "linux"))]
fn default_journald_drain(level: LogLevel) -> Result<slog_async::Async> {
    let journald = slog_journald::JournaldDrain.ignore_res();
    let filtered = slog::LevelFilter::new(journald, level.to_slog()).fuse();

    Ok(slog_async::Async::default(filtered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_logger_builds_and_logs() -> Result<()> {
        let logger = default_root_logger(LogLevel::Warn)?;
        slog::info!(logger, "filtered out"; "stage" => "test");
        slog::warn!(logger, "kept"; "stage" => "test");
        Ok(())
    }
}
