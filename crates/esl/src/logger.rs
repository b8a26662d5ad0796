//! Structured logging at the core's call sites, plus a thin
//! compatibility shim for callers that still want a raw callback
//! rather than installing a `tracing` subscriber.
//!
//! The crate itself never installs a subscriber -- that decision
//! belongs to the binary that links it (the demo CLI does this at
//! startup via `tracing-subscriber`).

use std::sync::Mutex;

use once_cell::sync::OnceCell;

/// Mirrors the original's eight syslog-style levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Emerg,
    Alert,
    Crit,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

pub type LoggerFn = Box<dyn Fn(Level, &str) + Send + Sync>;

static SINK: OnceCell<Mutex<Option<LoggerFn>>> = OnceCell::new();

/// Registers a callback invoked, in addition to the `tracing` emission
/// below, for every log record the core produces. Pass `None` to
/// silence it again.
pub fn set_logger(sink: Option<LoggerFn>) {
    SINK.get_or_init(|| Mutex::new(None));
    if let Some(cell) = SINK.get() {
        *cell.lock().expect("logger sink mutex poisoned") = sink;
    }
}

/// Emits `message` at `level` via `tracing`, then forwards to the
/// compatibility sink if one is registered.
pub fn log(level: Level, message: &str) {
    match level {
        Level::Emerg | Level::Alert | Level::Crit | Level::Error => tracing::error!("{message}"),
        Level::Warning => tracing::warn!("{message}"),
        Level::Notice | Level::Info => tracing::info!("{message}"),
        Level::Debug => tracing::debug!("{message}"),
    }
    if let Some(cell) = SINK.get() {
        if let Some(sink) = cell.lock().expect("logger sink mutex poisoned").as_ref() {
            sink(level, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn compat_sink_receives_forwarded_records() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        set_logger(Some(Box::new(move |_level, _msg| {
            counted.fetch_add(1, Ordering::SeqCst);
        })));
        log(Level::Info, "hello");
        assert!(calls.load(Ordering::SeqCst) >= 1);
        set_logger(None);
    }
}
