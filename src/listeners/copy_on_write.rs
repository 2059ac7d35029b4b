//! # Copy-on-write listener collection (default strategy).
//!
//! Writers rebuild the sorted list under a short writer lock and publish it atomically;
//! posts load the latest published list without taking any lock.
//!
//! ```text
//!  add/remove ──► lock(write) ──► clone + insert/remove ──► store(Arc<Vec>) ──► unlock
//!                                                                │
//!  post ───────────────────────► load_full() ◄───────────────────┘  (no lock)
//!                                     │
//!                                     └──► dispatcher.dispatch(event, &snapshot)
//! ```
//!
//! Mutations cost O(n); posts cost one atomic load. Suited to the usual
//! subscribe-once, post-often workload.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::dispatch::EventDispatcher;
use crate::events::EventRef;
use crate::listeners::collection::SortedListeners;
use crate::listeners::{ListenerCollection, ListenerRef};

/// Lock-free-read listener collection.
pub struct CopyOnWriteListeners {
    write: Mutex<()>,
    current: ArcSwap<Vec<ListenerRef>>,
}

impl CopyOnWriteListeners {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            write: Mutex::new(()),
            current: ArcSwap::from_pointee(Vec::new()),
        }
    }

    fn mutate(&self, apply: impl FnOnce(&mut SortedListeners) -> bool) -> bool {
        let _guard = self.write.lock();
        let mut next = SortedListeners::from_slice(&self.current.load());
        if !apply(&mut next) {
            return false;
        }
        self.current.store(Arc::new(next.into_vec()));
        true
    }
}

impl Default for CopyOnWriteListeners {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerCollection for CopyOnWriteListeners {
    fn add(&self, listener: ListenerRef) -> bool {
        self.mutate(|s| s.insert(listener))
    }

    fn remove(&self, listener: &ListenerRef) -> bool {
        self.mutate(|s| s.remove(listener))
    }

    fn post(&self, event: &EventRef<'_>, dispatcher: &EventDispatcher) {
        let snapshot = self.current.load_full();
        dispatcher.dispatch(event, &snapshot);
    }

    fn len(&self) -> usize {
        self.current.load().len()
    }

    fn snapshot(&self) -> Vec<ListenerRef> {
        self.current.load().to_vec()
    }

    fn name(&self) -> &'static str {
        "copy_on_write"
    }
}

impl fmt::Debug for CopyOnWriteListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOnWriteListeners")
            .field("len", &self.len())
            .finish()
    }
}
