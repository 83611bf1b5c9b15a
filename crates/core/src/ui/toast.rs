//! Single-slot transient notification.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Bootstrap's toast `delay` default.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(5000);

/// Success or error styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
}

/// The message currently occupying the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

impl Toast {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

/// One toast at a time; each `show` replaces the previous one.
#[derive(Clone)]
pub struct ToastController {
    slot: Arc<watch::Sender<Option<Toast>>>,
    next_id: Arc<AtomicU64>,
    ttl: Duration,
}

impl ToastController {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            slot: Arc::new(tx),
            next_id: Arc::new(AtomicU64::new(1)),
            ttl,
        }
    }

    /// Display `message`, replacing whatever was shown.
    pub fn show(&self, message: impl Into<String>, severity: Severity) -> Toast {
        let toast = Toast {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            severity,
            shown_at: Instant::now(),
        };
        match severity {
            Severity::Success => tracing::info!(message = %toast.message, "toast"),
            Severity::Error => tracing::warn!(message = %toast.message, "toast"),
        }
        self.slot.send_replace(Some(toast.clone()));
        toast
    }

    pub fn success(&self, message: impl Into<String>) -> Toast {
        self.show(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> Toast {
        self.show(message, Severity::Error)
    }

    /// The visible toast, or `None` once it has auto-dismissed.
    #[must_use]
    pub fn current(&self) -> Option<Toast> {
        self.slot
            .borrow()
            .as_ref()
            .filter(|toast| toast.shown_at.elapsed() < self.ttl)
            .cloned()
    }

    /// Hide the toast immediately.
    pub fn dismiss(&self) {
        self.slot.send_replace(None);
    }

    /// Observe every replacement of the slot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Toast>> {
        self.slot.subscribe()
    }
}

impl Default for ToastController {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}
