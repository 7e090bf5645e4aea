//! Where classified failures go for user-facing presentation.

use std::sync::{Mutex, PoisonError};
use tollgate_error::Severity;
use tracing::{error, info, warn};

/// Receives one message per failed call. Presentation is the sink's business.
pub trait Notifier: Send + Sync {
    /// Surface `message` at `severity`.
    fn notify(&self, severity: Severity, message: &str);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!(target: "tollgate::notify", "{}", message),
            Severity::Warning => warn!(target: "tollgate::notify", "{}", message),
            Severity::Error => error!(target: "tollgate::notify", "{}", message),
        }
    }
}

/// Keeps every notification in memory.
///
/// Useful for embedding in a UI loop that drains messages, and in tests.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    events: Mutex<Vec<(Severity, String)>>,
}

impl CollectingNotifier {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub fn events(&self) -> Vec<(Severity, String)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return notifications received so far.
    pub fn drain(&self) -> Vec<(Severity, String)> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_string()));
    }
}
