//! Unsynchronized listener collection for single-threaded use.
//!
//! Backed by a `RefCell`, so the type is `!Sync`: it can never be shared across threads
//! and therefore cannot back an [`EventBus`](crate::EventBus) node. Use it when driving a
//! [`EventDispatcher`] directly from one thread.

use std::cell::RefCell;
use std::fmt;

use crate::dispatch::EventDispatcher;
use crate::events::EventRef;
use crate::listeners::collection::SortedListeners;
use crate::listeners::{ListenerCollection, ListenerRef};

/// Single-threaded listener collection.
#[derive(Default)]
pub struct UnsyncListeners {
    inner: RefCell<SortedListeners>,
}

impl UnsyncListeners {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListenerCollection for UnsyncListeners {
    fn add(&self, listener: ListenerRef) -> bool {
        self.inner.borrow_mut().insert(listener)
    }

    fn remove(&self, listener: &ListenerRef) -> bool {
        self.inner.borrow_mut().remove(listener)
    }

    fn post(&self, event: &EventRef<'_>, dispatcher: &EventDispatcher) {
        // Copy out so the borrow is released before listeners run.
        let snapshot = self.snapshot();
        dispatcher.dispatch(event, &snapshot);
    }

    fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    fn snapshot(&self) -> Vec<ListenerRef> {
        self.inner.borrow().as_slice().to_vec()
    }

    fn name(&self) -> &'static str {
        "unsync"
    }
}

impl fmt::Debug for UnsyncListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsyncListeners")
            .field("len", &self.len())
            .finish()
    }
}
