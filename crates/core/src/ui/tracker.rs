//! Per-action loading flags.
//!
//! A keyed map from operation tag to "in flight", used to disable a button
//! and show its spinner while its own request runs. Two rows' delete buttons
//! never share a flag.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Tag identifying a tracked operation.
///
/// The string form (`Display`) is the key the flag is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKey {
    Login,
    Verify,
    ProductAction,
    Delete(String),
    CartQty(String),
    CartRemove(String),
    CartAdd(String),
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::Verify => f.write_str("verify"),
            Self::ProductAction => f.write_str("productAction"),
            Self::Delete(id) => write!(f, "delete_{id}"),
            Self::CartQty(id) => write!(f, "cart_qty_{id}"),
            Self::CartRemove(id) => write!(f, "cart_remove_{id}"),
            Self::CartAdd(id) => write!(f, "cart_add_{id}"),
        }
    }
}

/// Loading flags keyed by [`ActionKey`].
///
/// Cloning shares the same flags.
#[derive(Clone)]
pub struct ActionTracker {
    flags: Arc<watch::Sender<HashMap<String, bool>>>,
}

impl ActionTracker {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(HashMap::new());
        Self { flags: Arc::new(tx) }
    }

    /// Run `operation` with `key` marked in flight.
    ///
    /// The flag is reset when the operation settles, and also if the returned
    /// future is dropped early or the operation panics. Re-entry on a key that
    /// is already set is not rejected here; callers check [`is_loading`]
    /// before triggering.
    ///
    /// [`is_loading`]: Self::is_loading
    pub async fn run_tracked<F, T>(&self, key: &ActionKey, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.begin(key);
        operation.await
    }

    /// Whether `key` is currently in flight.
    #[must_use]
    pub fn is_loading(&self, key: &ActionKey) -> bool {
        self.flags
            .borrow()
            .get(&key.to_string())
            .copied()
            .unwrap_or(false)
    }

    /// Snapshot of every flag that has ever been set.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.flags.borrow().clone()
    }

    /// Observe flag changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HashMap<String, bool>> {
        self.flags.subscribe()
    }

    fn begin(&self, key: &ActionKey) -> FlagGuard {
        let key = key.to_string();
        self.set(&key, true);
        FlagGuard {
            flags: Arc::clone(&self.flags),
            key,
        }
    }

    fn set(&self, key: &str, value: bool) {
        self.flags.send_modify(|flags| {
            flags.insert(key.to_owned(), value);
        });
    }
}

impl Default for ActionTracker {
    fn default() -> Self {
        Self::new()
    }
}

struct FlagGuard {
    flags: Arc<watch::Sender<HashMap<String, bool>>>,
    key: String,
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        let key = std::mem::take(&mut self.key);
        self.flags.send_modify(|flags| {
            flags.insert(key, false);
        });
    }
}
