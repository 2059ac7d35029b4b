//! # typebus
//!
//! **Typebus** is an in-process, synchronous publish/subscribe engine for Rust.
//!
//! Listeners register for an event *type*; posting a value runs every listener of that
//! type in priority order on the posting thread. Optionally, declared subtype
//! relationships let a listener for a supertype (a trait object such as `dyn Shape`, or
//! the root type) receive events of every subtype, exactly once each.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Subscriber ──discover──► [ListenerDescriptor] ──bind──► SubscriberBindingCache
//!                                                                   │
//!   Listener::new/view/erased/any ──► ListenerRef ◄─────────────────┘
//!                                          │ subscribe_listener
//!                                          ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                            │
//! │  - Registry: EventType ─► TypeNode       (append-only, arc-swapped)  │
//! │  - EventDispatcher: Fast | Handling(ListenerExceptionHandler)        │
//! │  - attached buses                        (attachable() only)         │
//! └──────┬──────────────────────┬──────────────────────┬─────────────────┘
//!        ▼                      ▼                      ▼
//!  ┌────────────┐        ┌────────────┐         ┌────────────┐
//!  │ TypeNode A │──link─►│ TypeNode B │         │ TypeNode C │
//!  │  own: [..] │──link──┼────────────┼────────►│  own: [..] │
//!  └────────────┘        │  own: [..] │──link──►└────────────┘
//!                        └────────────┘
//!   (A <: B <: C: posting A runs A.own, B.own, C.own; one hop, no recursion)
//! ```
//!
//! ### Post path
//! ```text
//! bus.post(&event)
//!   ├─► registry.get_or_create(EventType::of::<E>())   lock-free hit, or validate + create + link
//!   ├─► node.own.post(event, dispatcher)               descending priority, FIFO ties
//!   ├─► link.own.post(event, dispatcher)  for each     supertype listeners
//!   └─► attached.post(&event)             for each     attachable buses
//!
//! listener panic:
//!   Fast      ─► unwinds to the poster
//!   Handling  ─► handler(event, listener, panic) ─► true: resume │ false: swallow
//!                (rest of that collection is skipped either way)
//! ```
//!
//! ## Features
//! | Area               | Description                                                      | Key types / traits                                  |
//! |--------------------|------------------------------------------------------------------|-----------------------------------------------------|
//! | **Bus**            | Subscribe, unsubscribe, post; attach child buses.                | [`EventBus`], [`EventBusBuilder`], [`BusConfig`]    |
//! | **Event types**    | Type identity, validation, declared subtype edges and views.     | [`EventType`], [`TypeHierarchy`], [`EventRef`]      |
//! | **Listeners**      | Priority-ordered, filterable callbacks.                          | [`Listener`], [`ListenerRef`], [`priority`]         |
//! | **Collections**    | Interchangeable concurrency strategies for listener sets.        | [`ListenerCollection`], [`CollectionStrategy`]      |
//! | **Dispatch**       | Panic policy for listener invocation.                            | [`EventDispatcher`], [`ListenerExceptionHandler`]   |
//! | **Subscribers**    | Objects that declare their listeners; discovery and caching.     | [`Subscriber`], [`DiscoveryStrategy`]               |
//! | **Cancellation**   | Cooperative, informational cancel flag for events.               | [`Cancellable`], [`CancellableEvent`]               |
//! | **Errors**         | Typed registry and discovery errors.                             | [`BusError`], [`DiscoveryError`]                    |
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use typebus::{priority, EventBus, Listener, TypeHierarchy};
//!
//! trait Shape: Send + Sync { fn area(&self) -> f64; }
//!
//! struct Square(f64);
//! impl Shape for Square { fn area(&self) -> f64 { self.0 * self.0 } }
//!
//! fn main() -> Result<(), typebus::BusError> {
//!     let mut hierarchy = TypeHierarchy::new();
//!     hierarchy.declare_view::<Square, dyn Shape>(|s| s)?;
//!
//!     let bus = EventBus::builder("shapes")
//!         .with_supertype_dispatch(hierarchy)
//!         .build();
//!
//!     let log = Arc::new(Mutex::new(Vec::new()));
//!     let (exact, any) = (Arc::clone(&log), Arc::clone(&log));
//!
//!     let area = Listener::view::<dyn Shape, _>(move |s| {
//!         exact.lock().unwrap().push(format!("area {}", s.area()));
//!     })
//!     .with_priority(priority::HIGH)
//!     .into_ref();
//!     let audit = Listener::any(move |ev| {
//!         any.lock().unwrap().push(ev.event_type().name().to_owned());
//!     })
//!     .into_ref();
//!
//!     bus.subscribe_all(&[area, audit])?;
//!
//!     bus.post(&Square(2.0))?;
//!     assert_eq!(log.lock().unwrap().len(), 2);
//!     Ok(())
//! }
//! ```
mod core;
mod dispatch;
mod error;
mod events;
mod listeners;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{BusConfig, EventBus, EventBusBuilder};
pub use dispatch::{
    DefaultExceptionHandler, EventDispatcher, ListenerExceptionHandler, ListenerPanic,
};
pub use error::{BusError, DiscoveryError};
pub use events::{Cancellable, CancellableEvent, EventPhase, EventRef, EventType, TypeHierarchy};
pub use listeners::{
    priority, CollectionStrategy, CopyOnWriteListeners, Filter, Listener, ListenerCollection,
    ListenerCollectionFactory, ListenerRef, MutexListeners, RwLockListeners, SharedCollection,
    UnsyncListeners,
};
pub use subscribers::{
    DeclaredListeners, DiscoveryStrategy, ListenerDescriptor, Subscriber, SubscriberBindingCache,
};
