//! # Collection factory: which strategy backs each new lattice node.
//!
//! The registry calls [`ListenerCollectionFactory::create`] once per event type, the first
//! time that type is subscribed to or posted. [`CollectionStrategy`] covers the built-in
//! thread-safe strategies; closures work too.
//!
//! ## Example
//! ```rust
//! use typebus::{CollectionStrategy, EventBus, EventType, ListenerCollection, RwLockListeners};
//!
//! let bus = EventBus::builder("locked")
//!     .with_collection_strategy(CollectionStrategy::ReadWriteLock)
//!     .build();
//!
//! let custom = EventBus::builder("custom")
//!     .with_collection_factory(|_: EventType| {
//!         Box::new(RwLockListeners::new()) as Box<dyn ListenerCollection + Send + Sync>
//!     })
//!     .build();
//! # let _ = (bus, custom);
//! ```

use std::any::type_name;

use crate::events::EventType;
use crate::listeners::{
    CopyOnWriteListeners, ListenerCollection, MutexListeners, RwLockListeners,
};

/// Boxed collection shared by a lattice node.
pub type SharedCollection = Box<dyn ListenerCollection + Send + Sync>;

/// Creates the listener collection for a newly registered event type.
pub trait ListenerCollectionFactory: Send + Sync {
    /// Builds an empty collection for `event_type`.
    fn create(&self, event_type: EventType) -> SharedCollection;

    /// Factory name (for logs).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Built-in thread-safe collection strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollectionStrategy {
    /// [`CopyOnWriteListeners`]: lock-free posts, O(n) mutations.
    #[default]
    CopyOnWrite,
    /// [`RwLockListeners`]: shared lock on post, exclusive on mutation.
    ReadWriteLock,
    /// [`MutexListeners`]: one lock for everything.
    Mutex,
}

impl CollectionStrategy {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            CollectionStrategy::CopyOnWrite => "copy_on_write",
            CollectionStrategy::ReadWriteLock => "read_write_lock",
            CollectionStrategy::Mutex => "mutex",
        }
    }
}

impl ListenerCollectionFactory for CollectionStrategy {
    fn create(&self, _event_type: EventType) -> SharedCollection {
        match self {
            CollectionStrategy::CopyOnWrite => Box::new(CopyOnWriteListeners::new()),
            CollectionStrategy::ReadWriteLock => Box::new(RwLockListeners::new()),
            CollectionStrategy::Mutex => Box::new(MutexListeners::new()),
        }
    }

    fn name(&self) -> &'static str {
        self.as_label()
    }
}

impl<F> ListenerCollectionFactory for F
where
    F: Fn(EventType) -> SharedCollection + Send + Sync,
{
    fn create(&self, event_type: EventType) -> SharedCollection {
        self(event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names_match_collections() {
        for strategy in [
            CollectionStrategy::CopyOnWrite,
            CollectionStrategy::ReadWriteLock,
            CollectionStrategy::Mutex,
        ] {
            let collection = strategy.create(EventType::root());
            assert_eq!(collection.name(), strategy.as_label());
            assert!(collection.is_empty());
        }
        assert_eq!(CollectionStrategy::default(), CollectionStrategy::CopyOnWrite);
    }

    #[test]
    fn test_closure_factory() {
        let factory = |_: EventType| Box::new(MutexListeners::new()) as SharedCollection;
        assert_eq!(factory.create(EventType::root()).name(), "mutex");
    }
}
