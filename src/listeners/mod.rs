//! Listeners and the ordered collections that hold them.
//!
//! ## Contents
//! - [`Listener`], [`ListenerRef`] callback + target + priority + filters
//! - [`priority`] named priority levels
//! - [`ListenerCollection`] the ordered set contract
//! - [`CopyOnWriteListeners`] lock-free posts (default)
//! - [`RwLockListeners`], [`MutexListeners`] lock-based alternatives
//! - [`UnsyncListeners`] single-threaded only (`!Sync`)
//! - [`ListenerCollectionFactory`], [`CollectionStrategy`] strategy selection per bus
//!
//! ## Ordering
//! ```text
//! priority:   200 ─► 100 ─► 0 ─► 0' ─► -100 ─► -200
//!                           └──┬──┘
//!                  equal priorities: subscription order
//! ```
//! All strategies order identically; they differ only in locking.

mod collection;
mod copy_on_write;
mod factory;
mod listener;
mod locked;
pub mod priority;
mod unsync;

pub use collection::ListenerCollection;
pub use copy_on_write::CopyOnWriteListeners;
pub use factory::{CollectionStrategy, ListenerCollectionFactory, SharedCollection};
pub use listener::{Filter, Listener, ListenerRef};
pub use locked::{MutexListeners, RwLockListeners};
pub use unsync::UnsyncListeners;
