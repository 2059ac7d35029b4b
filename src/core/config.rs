//! # Bus configuration.
//!
//! Provides [`BusConfig`], the settings an [`EventBus`](crate::EventBus) is built from.
//! Usually filled through [`EventBusBuilder`](crate::EventBusBuilder), but it is a plain
//! struct and can be built and passed in directly.
//!
//! ## Sentinel values
//! - `exception_handler = None` → fast dispatch (listener panics unwind to the poster)
//! - `discovery` empty → [`DeclaredListeners`] only

use std::fmt;
use std::sync::Arc;

use crate::dispatch::{DefaultExceptionHandler, EventDispatcher, ListenerExceptionHandler};
use crate::events::TypeHierarchy;
use crate::listeners::{CollectionStrategy, ListenerCollectionFactory};
use crate::subscribers::{DeclaredListeners, DiscoveryStrategy};

/// Settings consumed when a bus is built.
///
/// ## Field semantics
/// - `name`: shown in logs and `Display`
/// - `supertype_dispatch`: link lattice nodes so supertype listeners see subtype events
/// - `hierarchy`: declared subtype edges and upcast views
/// - `exception_handler`: panic policy (`None` = fast dispatch)
/// - `collection_factory`: strategy backing each event type's listeners
/// - `discovery`: strategies run by `subscribe(subscriber)`
/// - `attachable`: whether other buses may be attached
#[derive(Clone)]
pub struct BusConfig {
    /// Bus name.
    pub name: String,

    /// Enables the type lattice. When `false`, listeners receive exact-type events only.
    pub supertype_dispatch: bool,

    /// Declared type relationships. Frozen for the lifetime of the bus.
    pub hierarchy: Arc<TypeHierarchy>,

    /// Handler consulted when a listener panics.
    pub exception_handler: Option<Arc<dyn ListenerExceptionHandler>>,

    /// Creates the listener collection for each new event type.
    pub collection_factory: Arc<dyn ListenerCollectionFactory>,

    /// Discovery strategies; all are run, in order.
    pub discovery: Vec<Arc<dyn DiscoveryStrategy>>,

    /// Allows `attach`/`detach`.
    pub attachable: bool,
}

impl BusConfig {
    /// Creates the default configuration with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Dispatcher matching `exception_handler`.
    #[inline]
    pub fn dispatcher(&self) -> EventDispatcher {
        match &self.exception_handler {
            Some(handler) => EventDispatcher::Handling(Arc::clone(handler)),
            None => EventDispatcher::Fast,
        }
    }

    /// Configured discovery strategies, or [`DeclaredListeners`] if none were set.
    #[inline]
    pub fn discovery_strategies(&self) -> Vec<Arc<dyn DiscoveryStrategy>> {
        if self.discovery.is_empty() {
            vec![Arc::new(DeclaredListeners)]
        } else {
            self.discovery.clone()
        }
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `name = "default"`
    /// - `supertype_dispatch = false` (exact-type dispatch)
    /// - `hierarchy` empty
    /// - `exception_handler = DefaultExceptionHandler` (log, then resume the panic)
    /// - `collection_factory = CollectionStrategy::CopyOnWrite`
    /// - `discovery` empty (declared listeners)
    /// - `attachable = false`
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            supertype_dispatch: false,
            hierarchy: Arc::new(TypeHierarchy::new()),
            exception_handler: Some(Arc::new(DefaultExceptionHandler)),
            collection_factory: Arc::new(CollectionStrategy::default()),
            discovery: Vec::new(),
            attachable: false,
        }
    }
}

impl fmt::Debug for BusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusConfig")
            .field("name", &self.name)
            .field("supertype_dispatch", &self.supertype_dispatch)
            .field("hierarchy_edges", &self.hierarchy.edge_count())
            .field(
                "exception_handler",
                &self.exception_handler.as_ref().map(|h| h.name()),
            )
            .field("collection_factory", &self.collection_factory.name())
            .field(
                "discovery",
                &self.discovery.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("attachable", &self.attachable)
            .finish()
    }
}
