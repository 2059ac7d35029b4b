//! Subscriber discovery and binding.
//!
//! This module is the seam between objects that *declare* listeners and the registry that
//! *stores* them.
//!
//! ## Contents
//! - [`Subscriber`] declares listeners for one instance
//! - [`ListenerDescriptor`] unbound listener + optional narrowed target
//! - [`DiscoveryStrategy`], [`DeclaredListeners`] pluggable discovery (default: ask the subscriber)
//! - [`SubscriberBindingCache`] bound listeners per subscriber instance
//!
//! ## Flow
//! ```text
//! EventBus::subscribe(&Arc<S>)
//!     │
//!     ├─ cache hit ──────────────────────────────┐
//!     └─ miss ─► strategies ─► bind all ─► cache ┤
//!                      │ error: nothing happens  │
//!                      ▼                         ▼
//!                 DiscoveryError          subscribe_listener(each)
//! ```

mod cache;
mod discovery;
mod subscriber;

pub use cache::SubscriberBindingCache;
pub use discovery::{DeclaredListeners, DiscoveryStrategy};
pub(crate) use discovery::discover_all;
pub use subscriber::{ListenerDescriptor, Subscriber};
