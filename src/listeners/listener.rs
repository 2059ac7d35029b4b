//! # Listener: an ordered, filterable callback bound to one event type.
//!
//! A [`Listener`] owns:
//! - a **target** [`EventType`] (the node it registers under),
//! - a **priority** (higher runs first, see [`priority`](crate::priority)),
//! - zero or more **filters**, checked in registration order before the callback,
//! - the **callback** itself.
//!
//! Listeners are shared as [`ListenerRef`] (`Arc<Listener>`). Identity is the `Arc`
//! allocation, never structural equality: two listeners built from identical parts are
//! distinct entries, and unsubscribing requires the same `ListenerRef` that was subscribed.
//!
//! ## Constructors
//! ```text
//! Listener::new::<E>(|e: &E| ..)         target E; receives E or a declared view as E
//! Listener::view::<dyn S>(|s: &dyn S| ..) target dyn S; receives events with a declared view
//! Listener::erased(ty, |ev: &EventRef| ..) target ty; receives the raw envelope
//! Listener::any(|ev: &EventRef| ..)       target root; receives every event (supertype dispatch)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use typebus::{priority, EventRef, Listener, TypeHierarchy};
//!
//! struct Deposit { amount: u64 }
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let listener = Listener::new(move |d: &Deposit| {
//!     counter.fetch_add(d.amount as usize, Ordering::Relaxed);
//! })
//! .with_priority(priority::HIGH)
//! .filter(|d: &Deposit| d.amount > 10);
//!
//! let hierarchy = TypeHierarchy::new();
//! listener.accept(&EventRef::new(&Deposit { amount: 5 }, &hierarchy));
//! listener.accept(&EventRef::new(&Deposit { amount: 50 }, &hierarchy));
//! assert_eq!(seen.load(Ordering::Relaxed), 50);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::BusError;
use crate::events::{EventRef, EventType, TypeHierarchy};
use crate::listeners::priority;

/// Shared handle to a listener; identity is the allocation.
pub type ListenerRef = Arc<Listener>;

/// Erased filter predicate.
pub type Filter = Arc<dyn Fn(&EventRef<'_>) -> bool + Send + Sync>;

type Callback = Box<dyn Fn(&EventRef<'_>) + Send + Sync>;

/// An event callback bound to a target event type.
pub struct Listener {
    target: EventType,
    priority: i64,
    name: Option<Cow<'static, str>>,
    filters: Vec<Filter>,
    callback: Callback,
}

impl Listener {
    /// Creates a listener targeting `E`.
    ///
    /// The callback receives the event as `&E` when the posted value is an `E`, or when a
    /// view from the posted type to `E` was declared. Otherwise the event is skipped with a
    /// `warn!`.
    pub fn new<E, F>(callback: F) -> Self
    where
        E: Any + Send + Sync,
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self::erased(EventType::of::<E>(), move |ev: &EventRef<'_>| {
            match ev.get::<E>() {
                Some(e) => callback(e),
                None => warn!(
                    target_type = std::any::type_name::<E>(),
                    event_type = ev.event_type().name(),
                    "no view of event for typed listener; skipped"
                ),
            }
        })
    }

    /// Creates a listener targeting `S`, typically a trait object such as `dyn Shape`.
    ///
    /// The callback receives posted events for which a view to `S` was declared with
    /// [`TypeHierarchy::declare_view`]; other events are skipped with a `warn!`.
    ///
    /// Views are not transitive. With a view `Circle -> dyn Shape` and an edge
    /// `dyn Shape -> dyn Drawable`, supertype dispatch routes `Circle` to a
    /// `dyn Drawable` listener, but this callback only runs if `Circle -> dyn Drawable`
    /// was declared as a view too. Every concrete type needs its own view per target.
    pub fn view<S, F>(callback: F) -> Self
    where
        S: ?Sized + 'static,
        F: Fn(&S) + Send + Sync + 'static,
    {
        Self::erased(EventType::of::<S>(), move |ev: &EventRef<'_>| {
            match ev.view::<S>() {
                Some(s) => callback(s),
                None => warn!(
                    target_type = std::any::type_name::<S>(),
                    event_type = ev.event_type().name(),
                    "no declared view of event; skipped"
                ),
            }
        })
    }

    /// Creates a listener for an explicit target that receives the raw [`EventRef`].
    pub fn erased<F>(target: EventType, callback: F) -> Self
    where
        F: Fn(&EventRef<'_>) + Send + Sync + 'static,
    {
        Self {
            target,
            priority: priority::DEFAULT,
            name: None,
            filters: Vec::new(),
            callback: Box::new(callback),
        }
    }

    /// Creates a listener on the root event type.
    ///
    /// With supertype dispatch enabled it receives every posted event; without it, nothing
    /// (no value is ever exactly of the root type).
    pub fn any<F>(callback: F) -> Self
    where
        F: Fn(&EventRef<'_>) + Send + Sync + 'static,
    {
        Self::erased(EventType::root(), callback)
    }

    /// Sets the priority (higher runs first).
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Sets a human-readable name (for logs).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a typed filter; events that cannot be read as `E` are rejected.
    #[must_use]
    pub fn filter<E, P>(self, predicate: P) -> Self
    where
        E: Any + Send + Sync,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter_event(move |ev: &EventRef<'_>| ev.get::<E>().is_some_and(&predicate))
    }

    /// Adds a filter over the raw envelope.
    #[must_use]
    pub fn filter_event<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&EventRef<'_>) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(predicate));
        self
    }

    /// Adds an already-erased filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Freezes the listener into a shareable handle.
    #[must_use]
    pub fn into_ref(self) -> ListenerRef {
        Arc::new(self)
    }

    /// The event type this listener registers under.
    #[inline]
    pub fn target(&self) -> EventType {
        self.target
    }

    /// The listener's priority.
    #[inline]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Name given with [`Listener::with_name`], if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of filters attached.
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Runs the filters in order and, if all pass, the callback.
    ///
    /// A rejecting filter silently skips the callback; that is not an error.
    pub fn accept(&self, event: &EventRef<'_>) {
        if self.filters.iter().all(|f| f(event)) {
            (self.callback)(event);
        }
    }

    /// Replaces the target with a more specific subtype.
    ///
    /// Used by discovery to correct a conservatively-resolved target before the listener
    /// is shared. The new target must be valid and a subtype of (or equal to) the current one.
    ///
    /// # Errors
    /// - [`BusError::InvalidEventType`] if `target` fails validation.
    /// - [`BusError::TargetMismatch`] if `target` is not a subtype of the current target.
    pub fn narrow_target(
        &mut self,
        target: EventType,
        hierarchy: &TypeHierarchy,
    ) -> Result<(), BusError> {
        target.validate()?;
        if !hierarchy.is_subtype_of(target, self.target) {
            return Err(BusError::TargetMismatch {
                current: self.target.name(),
                requested: target.name(),
            });
        }
        self.target = target;
        Ok(())
    }

    /// Dispatch order between two listeners: higher priority first.
    #[inline]
    pub fn cmp_priority(&self, other: &Listener) -> Ordering {
        other.priority.cmp(&self.priority)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("priority", &self.priority)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}@{}[{}]", self.target, self.priority),
            None => write!(f, "{}[{}]", self.target, self.priority),
        }
    }
}
