//! # Posted event envelope.
//!
//! [`EventRef`] is what every listener callback and filter receives: a borrowed,
//! type-erased view of the posted value, tagged with its exact [`EventType`] and the
//! bus's [`TypeHierarchy`] (for declared upcast views).
//!
//! ## Access paths
//! ```text
//! downcast_ref::<T>()   exact type only (T must be the posted type)
//! view::<S>()           declared upcast view (posted type ─► S), S may be `dyn Trait`
//! get::<T>()            downcast_ref, falling back to view
//! value()               raw &dyn Any
//! ```

use std::any::Any;
use std::fmt;

use crate::events::{EventType, TypeHierarchy};

/// Borrowed, type-erased reference to a posted event.
#[derive(Clone, Copy)]
pub struct EventRef<'a> {
    value: &'a (dyn Any + Send + Sync),
    event_type: EventType,
    hierarchy: &'a TypeHierarchy,
}

impl<'a> EventRef<'a> {
    /// Wraps `value` for dispatch.
    pub fn new<E: Any + Send + Sync>(value: &'a E, hierarchy: &'a TypeHierarchy) -> Self {
        Self {
            value,
            event_type: EventType::of::<E>(),
            hierarchy,
        }
    }

    /// Exact runtime type of the posted value.
    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// The posted value as `&dyn Any`.
    #[inline]
    pub fn value(&self) -> &'a (dyn Any + Send + Sync) {
        self.value
    }

    /// Returns `true` if the posted value is exactly a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Downcasts to the exact posted type.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.value.downcast_ref::<T>()
    }

    /// Views the posted value as `S` through a view declared with
    /// [`TypeHierarchy::declare_view`].
    pub fn view<S: ?Sized + 'static>(&self) -> Option<&'a S> {
        self.hierarchy
            .view::<S>(self.event_type.type_id(), self.value)
    }

    /// Returns the value as a `T`: the exact type if it matches, otherwise a declared view.
    pub fn get<T: Any>(&self) -> Option<&'a T> {
        self.downcast_ref::<T>().or_else(|| self.view::<T>())
    }

    /// The hierarchy this event is being dispatched under.
    #[inline]
    pub fn hierarchy(&self) -> &'a TypeHierarchy {
        self.hierarchy
    }
}

impl fmt::Debug for EventRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRef")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}
