//! Warning sink for non-fatal I/O failures

use std::fmt;

/// Receives warnings emitted before a failure is returned to the caller
pub trait Logger: Send + Sync {
    fn warn(&self, args: fmt::Arguments<'_>);
}

/// [`Logger`] writing through `tracing` at WARN level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "estrace::transport", "{}", args);
    }
}

impl<F> Logger for F
where
    F: Fn(fmt::Arguments<'_>) + Send + Sync,
{
    fn warn(&self, args: fmt::Arguments<'_>) {
        self(args)
    }
}
