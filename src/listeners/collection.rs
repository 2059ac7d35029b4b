//! # ListenerCollection: the ordered listener set behind one event type.
//!
//! Every strategy keeps listeners sorted by **descending priority**, with equal
//! priorities in **insertion order**, and never holds the same [`ListenerRef`] twice.
//!
//! ```text
//! add(L{p=0})  add(M{p=100})  add(N{p=0})
//!
//!   [ M(100) | L(0) | N(0) ]      ◄── M first (higher), then L before N (FIFO tie-break)
//! ```
//!
//! ## Rules
//! - `add` returns `false` (and changes nothing) if the listener is already present.
//! - `remove` returns `false` (and changes nothing) if the listener is absent.
//! - `post` hands one **consistent snapshot** to the dispatcher: a concurrent `add`/`remove`
//!   is seen either fully or not at all.
//! - `post` never holds a collection lock while listeners run, so a listener may add,
//!   remove or post on the same collection.

use std::any::type_name;

use crate::dispatch::EventDispatcher;
use crate::events::EventRef;
use crate::listeners::ListenerRef;

/// Ordered, duplicate-free set of listeners for one event type.
pub trait ListenerCollection {
    /// Inserts `listener` at its sorted position. Returns `true` if it was newly added.
    fn add(&self, listener: ListenerRef) -> bool;

    /// Removes `listener` by identity. Returns `true` if it was present.
    fn remove(&self, listener: &ListenerRef) -> bool;

    /// Hands the current ordered listeners to `dispatcher`.
    fn post(&self, event: &EventRef<'_>, dispatcher: &EventDispatcher);

    /// Number of listeners currently held.
    fn len(&self) -> usize;

    /// Returns `true` if no listener is held.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current ordered listeners.
    fn snapshot(&self) -> Vec<ListenerRef>;

    /// Strategy name (for logs).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Position at which `listener` keeps `items` sorted, after any equal priorities.
#[inline]
fn insertion_point(items: &[ListenerRef], listener: &ListenerRef) -> usize {
    items.partition_point(|l| l.priority() >= listener.priority())
}

#[inline]
fn position_of(items: &[ListenerRef], listener: &ListenerRef) -> Option<usize> {
    items.iter().position(|l| ListenerRef::ptr_eq(l, listener))
}

/// Sorted `Vec` backing shared by all strategies.
#[derive(Clone, Default)]
pub(crate) struct SortedListeners {
    items: Vec<ListenerRef>,
}

impl SortedListeners {
    pub(crate) fn from_slice(items: &[ListenerRef]) -> Self {
        Self {
            items: items.to_vec(),
        }
    }

    pub(crate) fn insert(&mut self, listener: ListenerRef) -> bool {
        if position_of(&self.items, &listener).is_some() {
            return false;
        }
        let at = insertion_point(&self.items, &listener);
        self.items.insert(at, listener);
        true
    }

    pub(crate) fn remove(&mut self, listener: &ListenerRef) -> bool {
        match position_of(&self.items, listener) {
            Some(at) => {
                self.items.remove(at);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[ListenerRef] {
        &self.items
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn into_vec(self) -> Vec<ListenerRef> {
        self.items
    }
}
