//! Logger abstraction consumed by every subsystem.
//!
//! The core never prints directly; it calls through a [`Logger`] so hosts
//! can route diagnostics into whatever transport they already use. The
//! default implementation forwards to [`tracing`].

/// Minimal severity-tiered logging surface the core depends on.
pub trait Logger: Send + Sync {
    /// Fine-grained diagnostic detail, off by default in most hosts.
    fn debug(&self, message: &str);
    /// Slightly coarser than `debug`, for step-by-step tracing.
    fn verbose(&self, message: &str);
    /// Notable events that are not problems.
    fn info(&self, message: &str);
    /// Recoverable problems the host should be aware of.
    fn warn(&self, message: &str);
    /// Failures that aborted an operation.
    fn error(&self, message: &str);
    /// The noisiest tier, reserved for values too large for routine debug
    /// logging (for example, a full candidate list).
    fn silly(&self, message: &str);
}

/// Default [`Logger`] that forwards every call to [`tracing`] at the
/// matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn verbose(&self, message: &str) {
        tracing::trace!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn silly(&self, message: &str) {
        tracing::trace!(silly = true, "{message}");
    }
}

/// A [`Logger`] that discards every message, useful in tests that assert on
/// behaviour rather than diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&self, _message: &str) {}
    fn verbose(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn silly(&self, _message: &str) {}
}
