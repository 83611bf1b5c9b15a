//! Show/hide handle for a dialog.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

/// Explicit visibility state with imperative `open`/`close`.
#[derive(Clone)]
pub struct Modal {
    open: Arc<watch::Sender<bool>>,
    /// Bumped on every `open`; a delayed close only applies to the opening it
    /// was scheduled against.
    generation: Arc<AtomicU64>,
}

impl Modal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            open: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn open(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.open.send_replace(true);
    }

    pub fn close(&self) {
        self.open.send_if_modified(|open| std::mem::replace(open, false));
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Close after `delay`, unless the modal was closed and reopened meanwhile.
    ///
    /// Must be called from within a tokio runtime.
    pub fn close_after(&self, delay: Duration) -> tokio::task::JoinHandle<()> {
        let modal = self.clone();
        let generation = self.generation.load(Ordering::SeqCst);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if modal.generation.load(Ordering::SeqCst) == generation {
                modal.close();
            }
        })
    }

    /// Observe open/close transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.open.subscribe()
    }
}

impl Default for Modal {
    fn default() -> Self {
        Self::new()
    }
}
