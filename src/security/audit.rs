//! Bounded, thread-safe audit log for [`SecurityEvent`]s.

use std::collections::VecDeque;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Severity tier of a [`SecurityEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Purely informational.
    Info,
    /// Worth a human's attention but not a failure.
    Warning,
    /// A rule was violated; the value was rejected.
    Error,
    /// A violation severe enough to warrant immediate operator attention.
    Critical,
}

/// Which side of the configuration pipeline produced a [`SecurityEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// A CLI-supplied argument.
    Cli,
    /// A filesystem configuration source.
    Config,
    /// The merged document, checked after CLI and config were combined.
    Merged,
    /// Produced by the core itself rather than an input value.
    System,
}

/// The maximum number of events retained by [`AuditLog`]; older events are
/// dropped on overflow.
pub const EVENT_BUFFER_CAPACITY: usize = 100;

/// A single security-relevant occurrence, recorded by the [`super::SecurityValidator`].
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    /// Short machine-stable category, for example `"path_traversal"`.
    pub event_type: String,
    /// Severity tier.
    pub severity: Severity,
    /// Which side of the pipeline produced this event.
    pub source: EventSource,
    /// Dot-path of the offending field, if applicable.
    pub field: Option<String>,
    /// A taxonomy error code, if this event corresponds to a rejected value.
    pub error_code: Option<String>,
    /// Human-readable detail, sanitized per [`AuditLog::includes_sensitive_details`].
    pub details: String,
    /// Correlates events from the same resolution attempt.
    pub correlation_id: Option<uuid::Uuid>,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Bounded ring buffer of the most recent [`SecurityEvent`]s, safe to append
/// from multiple threads.
pub struct AuditLog {
    events: Mutex<VecDeque<SecurityEvent>>,
    min_severity: Severity,
    include_sensitive_details: bool,
}

impl AuditLog {
    /// Creates a new, empty audit log.
    #[must_use]
    pub fn new(min_severity: Severity, include_sensitive_details: bool) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(EVENT_BUFFER_CAPACITY)),
            min_severity,
            include_sensitive_details,
        }
    }

    /// Returns `true` if sensitive detail (full home-relative paths, long
    /// strings) is retained verbatim rather than sanitized.
    #[must_use]
    pub fn includes_sensitive_details(&self) -> bool {
        self.include_sensitive_details
    }

    /// Records `event` if its severity meets the configured floor, dropping
    /// the oldest entry once the buffer is at capacity.
    pub fn record(&self, mut event: SecurityEvent) {
        if event.severity < self.min_severity {
            return;
        }
        if !self.include_sensitive_details {
            event.details = sanitize_details(&event.details);
        }
        let mut events = self.events.lock();
        if events.len() >= EVENT_BUFFER_CAPACITY {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Returns a snapshot of the currently retained events, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SecurityEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Number of events currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

/// Replaces home-directory prefixes with `~` and truncates long strings to
/// 100 characters, matching the non-sensitive detail policy.
fn sanitize_details(details: &str) -> String {
    let home_stripped = dirs::home_dir()
        .and_then(|home| home.to_str().map(str::to_owned))
        .map(|home| details.replacen(&home, "~", 1))
        .unwrap_or_else(|| details.to_string());
    if home_stripped.chars().count() > 100 {
        let truncated: String = home_stripped.chars().take(97).collect();
        format!("{truncated}...")
    } else {
        home_stripped
    }
}

static GLOBAL_AUDIT_LOG: OnceLock<AuditLog> = OnceLock::new();

/// Returns the process-wide audit logger, constructing it on first use with
/// `Severity::Info` and sensitive-detail sanitization enabled.
///
/// Hosts that need different defaults should construct and own their own
/// [`AuditLog`] instead of using this singleton.
pub fn global_audit_log() -> &'static AuditLog {
    GLOBAL_AUDIT_LOG.get_or_init(|| AuditLog::new(Severity::Info, false))
}
