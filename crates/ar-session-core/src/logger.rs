//! Session logger.
//!
//! A small `log` backend for demos and hosts that do not bring their own:
//! `[LEVEL +elapsed target] message` on stderr. Install it once at startup
//! with [`init_with_level`], or [`init`] to honor the `AR_SESSION_LOG`
//! environment variable. Hosts with their own `log` implementation (or
//! the `tracing` feature) skip this module entirely.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

struct SessionLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let millis = self.started.elapsed().as_millis();
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "[{:>5} +{millis}ms {}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

/// Install the session logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| SessionLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install the session logger with the level named by the
/// `AR_SESSION_LOG` environment variable (`info` when unset or
/// unparseable).
pub fn init() -> Result<(), log::SetLoggerError> {
    let level = std::env::var("AR_SESSION_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::Info);
    init_with_level(level)
}

/// Install a `tracing` subscriber honoring `RUST_LOG`, for hosts that
/// prefer structured spans over the plain logger.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::Uptime::default())
        .with_writer(std::io::stderr)
        .finish()
        .try_init();
}
