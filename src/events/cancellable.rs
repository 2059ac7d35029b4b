//! # Cooperative cancellation for events.
//!
//! Cancelling an event is **informational**: the bus never inspects the flag while
//! dispatching and every subscribed listener still receives the event. Listeners and
//! the posting call site decide what "cancelled" means.
//!
//! [`EventBus::post_cancellable`](crate::EventBus::post_cancellable) posts the event and
//! returns the flag as observed after dispatch.
//!
//! ## Example
//! ```rust
//! use typebus::{Cancellable, CancellableEvent};
//!
//! let ev = CancellableEvent::new();
//! assert!(!ev.is_cancelled());
//! ev.cancel();
//! assert!(ev.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

/// An event that carries a cancellation flag.
///
/// Listeners receive shared references, so the flag must be settable through `&self`.
pub trait Cancellable {
    /// Sets the cancelled state.
    fn set_cancelled(&self, cancelled: bool);

    /// Returns whether the event has been cancelled.
    fn is_cancelled(&self) -> bool;

    /// Cancels the event. Equivalent to `set_cancelled(true)`.
    fn cancel(&self) {
        self.set_cancelled(true);
    }
}

/// Reusable cancellation flag; embed it in an event struct or post it directly.
#[derive(Debug, Default)]
pub struct CancellableEvent {
    cancelled: AtomicBool,
}

impl CancellableEvent {
    /// Creates a flag in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cancellable for CancellableEvent {
    fn set_cancelled(&self, cancelled: bool) {
        self.cancelled.store(cancelled, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Common phases an event may be posted at, relative to the action it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
    /// Before the action happens.
    Pre,
    /// While the action happens.
    On,
    /// After the action happened.
    Post,
}
