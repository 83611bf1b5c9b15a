//! View-state primitives shared by every controller.
//!
//! Each primitive owns a `tokio::sync::watch` channel: transitions replace the
//! whole published value, and observers (a renderer, the CLI, a test) hold
//! receivers.

pub mod modal;
pub mod toast;
pub mod tracker;

pub use modal::Modal;
pub use toast::{Severity, Toast, ToastController};
pub use tracker::{ActionKey, ActionTracker};
