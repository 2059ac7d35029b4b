//! Event identity, type hierarchy and the posted-event envelope.
//!
//! This module groups the **data model** the dispatch engine keys on.
//!
//! ## Contents
//! - [`EventType`] opaque, comparable identity of a runtime type (plus validation)
//! - [`TypeHierarchy`] declared `Sub -> Super` edges and upcast views
//! - [`EventRef`] the borrowed, type-erased envelope handed to listeners
//! - [`Cancellable`], [`CancellableEvent`], [`EventPhase`] payload helpers
//!
//! ## Quick reference
//! - **Producers**: `EventBus::post` wraps every posted value in an [`EventRef`].
//! - **Consumers**: `Listener` callbacks and filters, `ListenerExceptionHandler`.
//! - **Keying**: `Registry` maps each [`EventType`] to exactly one lattice node.

mod cancellable;
mod event_ref;
mod event_type;
mod hierarchy;

pub use cancellable::{Cancellable, CancellableEvent, EventPhase};
pub use event_ref::EventRef;
pub use event_type::EventType;
pub use hierarchy::TypeHierarchy;
