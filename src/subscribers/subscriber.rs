//! # Subscriber: an object that declares its own listeners.
//!
//! A [`Subscriber`] hands the bus a list of [`ListenerDescriptor`]s when it is first
//! subscribed. Each descriptor wraps an unbound [`Listener`] plus an optional narrowed
//! target. The bus binds every descriptor (validation + narrowing) before it registers
//! anything, and caches the bound listeners per subscriber instance.
//!
//! ```text
//! bus.subscribe(&sub)
//!   └─► cache miss ─► strategies.discover(sub) ─► [ListenerDescriptor]
//!                                                     │ bind (validate, narrow)
//!                                                     ▼
//!                     cache[sub] = [ListenerRef] ─► subscribe each
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use typebus::{DiscoveryError, EventBus, Listener, ListenerDescriptor, Subscriber};
//!
//! struct Login { user: String }
//!
//! #[derive(Default)]
//! struct LoginCounter { hits: AtomicUsize }
//!
//! impl Subscriber for LoginCounter {
//!     fn discover(self: Arc<Self>) -> Result<Vec<ListenerDescriptor>, DiscoveryError> {
//!         let me = Arc::clone(&self);
//!         Ok(vec![Listener::new(move |_: &Login| {
//!             me.hits.fetch_add(1, Ordering::Relaxed);
//!         })
//!         .into()])
//!     }
//! }
//!
//! let bus = EventBus::new("auth");
//! let counter = Arc::new(LoginCounter::default());
//! bus.subscribe(&counter)?;
//! bus.post(&Login { user: "ada".into() })?;
//! assert_eq!(counter.hits.load(Ordering::Relaxed), 1);
//! # Ok::<(), typebus::BusError>(())
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::error::{BusError, DiscoveryError};
use crate::events::{EventType, TypeHierarchy};
use crate::listeners::{Listener, ListenerRef};

/// An object whose listeners are discovered and registered as a unit.
pub trait Subscriber: Send + Sync + 'static {
    /// Declares this subscriber's listeners.
    ///
    /// Results are cached per instance, so this normally runs once per bus. Concurrent
    /// first subscriptions of the same instance may each run it; one result is kept.
    /// Listeners typically capture a clone of `self`.
    ///
    /// # Errors
    /// Return a [`DiscoveryError`] to abort the `subscribe` call; nothing is registered.
    fn discover(self: Arc<Self>) -> Result<Vec<ListenerDescriptor>, DiscoveryError>;

    /// Human-readable name (for logs and errors).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// An unbound listener produced by discovery.
pub struct ListenerDescriptor {
    listener: Listener,
    narrow_to: Option<EventType>,
}

impl ListenerDescriptor {
    /// Wraps a listener as-is.
    pub fn new(listener: Listener) -> Self {
        Self {
            listener,
            narrow_to: None,
        }
    }

    /// Narrows the listener's target to `target` at bind time.
    ///
    /// `target` must be a subtype of the listener's current target in the bus hierarchy,
    /// otherwise binding fails with [`BusError::TargetMismatch`].
    #[must_use]
    pub fn narrow_to(mut self, target: EventType) -> Self {
        self.narrow_to = Some(target);
        self
    }

    /// Target the bound listener will register under.
    pub fn target(&self) -> EventType {
        self.narrow_to.unwrap_or_else(|| self.listener.target())
    }

    /// Validates, narrows and freezes the listener.
    pub(crate) fn bind(self, hierarchy: &TypeHierarchy) -> Result<ListenerRef, BusError> {
        let mut listener = self.listener;
        listener.target().validate()?;
        if let Some(target) = self.narrow_to {
            listener.narrow_target(target, hierarchy)?;
        }
        Ok(listener.into_ref())
    }
}

impl From<Listener> for ListenerDescriptor {
    fn from(listener: Listener) -> Self {
        Self::new(listener)
    }
}

impl fmt::Debug for ListenerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerDescriptor")
            .field("listener", &self.listener)
            .field("narrow_to", &self.narrow_to)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape {}
    struct Circle;

    #[test]
    fn test_bind_plain() {
        let h = TypeHierarchy::new();
        let d = ListenerDescriptor::from(Listener::new(|_: &Circle| {}));
        assert_eq!(d.target(), EventType::of::<Circle>());
        let l = d.bind(&h).unwrap();
        assert_eq!(l.target(), EventType::of::<Circle>());
    }

    #[test]
    fn test_bind_narrows_to_subtype() {
        let mut h = TypeHierarchy::new();
        h.declare::<Circle, dyn Shape>().unwrap();

        let d = ListenerDescriptor::new(Listener::erased(EventType::of::<dyn Shape>(), |_| {}))
            .narrow_to(EventType::of::<Circle>());
        assert_eq!(d.target(), EventType::of::<Circle>());
        assert_eq!(d.bind(&h).unwrap().target(), EventType::of::<Circle>());
    }

    #[test]
    fn test_bind_rejects_widening_and_invalid_targets() {
        let mut h = TypeHierarchy::new();
        h.declare::<Circle, dyn Shape>().unwrap();

        let widen = ListenerDescriptor::new(Listener::new(|_: &Circle| {}))
            .narrow_to(EventType::of::<dyn Shape>());
        let err = widen.bind(&h).unwrap_err();
        assert_eq!(err.as_label(), "bus_target_mismatch");
        assert!(!err.is_type_rejection());

        let invalid = ListenerDescriptor::new(Listener::erased(EventType::of::<i32>(), |_| {}));
        assert!(invalid.bind(&h).unwrap_err().is_type_rejection());
    }
}
