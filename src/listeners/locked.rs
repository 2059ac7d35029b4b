//! Lock-based listener collections.
//!
//! Both keep one sorted `Vec` behind a `parking_lot` lock and copy it out under the lock
//! on every post, then dispatch after releasing it. A post therefore costs O(n), and a
//! listener can safely touch its own collection while being invoked.

use std::fmt;

use parking_lot::{Mutex, RwLock};

use crate::dispatch::EventDispatcher;
use crate::events::EventRef;
use crate::listeners::collection::SortedListeners;
use crate::listeners::{ListenerCollection, ListenerRef};

/// Listener collection guarded by a read-write lock: mutations are exclusive, posts shared.
#[derive(Default)]
pub struct RwLockListeners {
    inner: RwLock<SortedListeners>,
}

impl RwLockListeners {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListenerCollection for RwLockListeners {
    fn add(&self, listener: ListenerRef) -> bool {
        self.inner.write().insert(listener)
    }

    fn remove(&self, listener: &ListenerRef) -> bool {
        self.inner.write().remove(listener)
    }

    fn post(&self, event: &EventRef<'_>, dispatcher: &EventDispatcher) {
        let snapshot = self.snapshot();
        dispatcher.dispatch(event, &snapshot);
    }

    fn len(&self) -> usize {
        self.inner.read().len()
    }

    fn snapshot(&self) -> Vec<ListenerRef> {
        self.inner.read().as_slice().to_vec()
    }

    fn name(&self) -> &'static str {
        "read_write_lock"
    }
}

impl fmt::Debug for RwLockListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwLockListeners")
            .field("len", &self.len())
            .finish()
    }
}

/// Listener collection guarded by a single mutex for every operation.
#[derive(Default)]
pub struct MutexListeners {
    inner: Mutex<SortedListeners>,
}

impl MutexListeners {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListenerCollection for MutexListeners {
    fn add(&self, listener: ListenerRef) -> bool {
        self.inner.lock().insert(listener)
    }

    fn remove(&self, listener: &ListenerRef) -> bool {
        self.inner.lock().remove(listener)
    }

    fn post(&self, event: &EventRef<'_>, dispatcher: &EventDispatcher) {
        let snapshot = self.snapshot();
        dispatcher.dispatch(event, &snapshot);
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn snapshot(&self) -> Vec<ListenerRef> {
        self.inner.lock().as_slice().to_vec()
    }

    fn name(&self) -> &'static str {
        "mutex"
    }
}

impl fmt::Debug for MutexListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexListeners")
            .field("len", &self.len())
            .finish()
    }
}
