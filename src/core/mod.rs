//! Bus core: the registry of lattice nodes and the public [`EventBus`] surface.
//!
//! Internal modules:
//! - [`node`]: one lattice node (own collection + supertype links);
//! - [`registry`]: append-only, double-checked node map and the linking scan;
//! - [`config`]: [`BusConfig`];
//! - [`builder`]: [`EventBusBuilder`];
//! - [`bus`]: [`EventBus`] (subscribe, unsubscribe, post, attach).

mod builder;
mod bus;
mod config;
mod node;
mod registry;

pub use builder::EventBusBuilder;
pub use bus::EventBus;
pub use config::BusConfig;
