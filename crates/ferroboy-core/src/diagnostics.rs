//! Dependency-free diagnostics seam.
//!
//! The core never picks a logging backend. Embedders install a [`LogSink`]
//! once per process and the `core_*!` macros forward to it; with no sink
//! installed the macros cost a single branch and format nothing.

use std::fmt;
use std::sync::OnceLock;

/// Severity of a core diagnostic message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Trace,
    Info,
    Warn,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Trace => "trace",
            Level::Info => "info",
            Level::Warn => "warn",
        })
    }
}

/// Destination for core diagnostics.
pub trait LogSink: Send + Sync + 'static {
    fn log(&self, level: Level, target: &'static str, args: fmt::Arguments);
}

static LOG_SINK: OnceLock<Box<dyn LogSink>> = OnceLock::new();

/// Install the process-wide sink. Returns the sink back if one was
/// already installed.
pub fn try_set_log_sink(sink: Box<dyn LogSink>) -> Result<(), Box<dyn LogSink>> {
    LOG_SINK.set(sink)
}

pub fn has_log_sink() -> bool {
    LOG_SINK.get().is_some()
}

pub(crate) fn emit(level: Level, target: &'static str, args: fmt::Arguments) {
    if let Some(sink) = LOG_SINK.get() {
        sink.log(level, target, args);
    }
}
