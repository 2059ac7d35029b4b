//! # Per-instance cache of bound subscriber listeners.
//!
//! Discovery runs once per subscriber instance; later `subscribe`/`unsubscribe` calls reuse
//! the exact same [`ListenerRef`]s, which is what makes identity-based removal work.
//!
//! ```text
//! key = address of the subscriber's Arc allocation
//!
//! DashMap<key, Binding { Arc<dyn Subscriber>, Arc<[ListenerRef]> }>
//! ```
//!
//! ## Rules
//! - Entries hold the subscriber strongly: its address cannot be reused while it is cached.
//! - Discovery runs outside any map lock (it is user code).
//! - If two threads bind the same subscriber concurrently, both run discovery; the first
//!   insert wins and both get its listeners.
//! - Entries live until [`SubscriberBindingCache::remove`].

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::listeners::ListenerRef;
use crate::subscribers::Subscriber;

struct Binding {
    // Pins the allocation so the key stays unique.
    _subscriber: Arc<dyn Subscriber>,
    listeners: Arc<[ListenerRef]>,
}

#[inline]
fn key(subscriber: &Arc<dyn Subscriber>) -> usize {
    Arc::as_ptr(subscriber) as *const () as usize
}

/// Subscriber instance → bound listeners.
#[derive(Default)]
pub struct SubscriberBindingCache {
    entries: DashMap<usize, Binding>,
}

impl SubscriberBindingCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached listeners for `subscriber`, if any.
    pub fn get(&self, subscriber: &Arc<dyn Subscriber>) -> Option<Arc<[ListenerRef]>> {
        self.entries
            .get(&key(subscriber))
            .map(|entry| Arc::clone(&entry.listeners))
    }

    /// Returns the cached listeners for `subscriber`, running `bind` on a miss.
    ///
    /// # Errors
    /// Propagates the error from `bind`; nothing is cached in that case.
    pub fn get_or_bind<F>(
        &self,
        subscriber: &Arc<dyn Subscriber>,
        bind: F,
    ) -> Result<Arc<[ListenerRef]>, DiscoveryError>
    where
        F: FnOnce(&Arc<dyn Subscriber>) -> Result<Vec<ListenerRef>, DiscoveryError>,
    {
        if let Some(listeners) = self.get(subscriber) {
            return Ok(listeners);
        }

        let listeners: Arc<[ListenerRef]> = bind(subscriber)?.into();
        match self.entries.entry(key(subscriber)) {
            Entry::Occupied(slot) => Ok(Arc::clone(&slot.get().listeners)),
            Entry::Vacant(slot) => {
                debug!(
                    subscriber = subscriber.name(),
                    listeners = listeners.len(),
                    "subscriber bound"
                );
                slot.insert(Binding {
                    _subscriber: Arc::clone(subscriber),
                    listeners: Arc::clone(&listeners),
                });
                Ok(listeners)
            }
        }
    }

    /// Drops the entry for `subscriber`, returning its listeners.
    ///
    /// This releases the cache's hold on the subscriber.
    pub fn remove(&self, subscriber: &Arc<dyn Subscriber>) -> Option<Arc<[ListenerRef]>> {
        self.entries
            .remove(&key(subscriber))
            .map(|(_, binding)| binding.listeners)
    }

    /// Number of bound subscribers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for SubscriberBindingCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberBindingCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
