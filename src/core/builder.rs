use std::sync::Arc;

use crate::core::{BusConfig, EventBus};
use crate::dispatch::ListenerExceptionHandler;
use crate::events::TypeHierarchy;
use crate::listeners::{CollectionStrategy, ListenerCollectionFactory};
use crate::subscribers::DiscoveryStrategy;

/// Builder for an [`EventBus`].
///
/// ```rust
/// use typebus::{CollectionStrategy, EventBus, TypeHierarchy};
///
/// trait Shape {}
/// struct Circle;
///
/// let mut hierarchy = TypeHierarchy::new();
/// hierarchy.declare::<Circle, dyn Shape>()?;
///
/// let bus = EventBus::builder("shapes")
///     .with_supertype_dispatch(hierarchy)
///     .with_collection_strategy(CollectionStrategy::ReadWriteLock)
///     .attachable()
///     .build();
/// assert_eq!(bus.to_string(), "EventBus{name='shapes'}");
/// # Ok::<(), typebus::BusError>(())
/// ```
#[must_use]
pub struct EventBusBuilder {
    cfg: BusConfig,
}

impl EventBusBuilder {
    /// Creates a builder with default settings and the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(BusConfig::named(name))
    }

    /// Creates a builder starting from an existing configuration.
    pub fn from_config(cfg: BusConfig) -> Self {
        Self { cfg }
    }

    /// Enables supertype dispatch over `hierarchy`.
    ///
    /// Listeners registered for a type then also receive events of every declared subtype.
    pub fn with_supertype_dispatch(mut self, hierarchy: TypeHierarchy) -> Self {
        self.cfg.supertype_dispatch = true;
        self.cfg.hierarchy = Arc::new(hierarchy);
        self
    }

    /// Sets the hierarchy without enabling supertype dispatch.
    ///
    /// Declared views still let typed listeners read events; dispatch stays exact-type.
    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.cfg.hierarchy = Arc::new(hierarchy);
        self
    }

    /// Sets the handler consulted when a listener panics.
    pub fn with_exception_handler(
        mut self,
        handler: impl ListenerExceptionHandler + 'static,
    ) -> Self {
        self.cfg.exception_handler = Some(Arc::new(handler));
        self
    }

    /// Uses fast dispatch: listener panics unwind straight to the poster.
    pub fn without_exception_handler(mut self) -> Self {
        self.cfg.exception_handler = None;
        self
    }

    /// Sets a custom collection factory.
    pub fn with_collection_factory(
        mut self,
        factory: impl ListenerCollectionFactory + 'static,
    ) -> Self {
        self.cfg.collection_factory = Arc::new(factory);
        self
    }

    /// Selects one of the built-in collection strategies.
    pub fn with_collection_strategy(self, strategy: CollectionStrategy) -> Self {
        self.with_collection_factory(strategy)
    }

    /// Adds a discovery strategy.
    ///
    /// Configured strategies replace the default; add
    /// [`DeclaredListeners`](crate::DeclaredListeners) explicitly to keep it.
    pub fn with_discovery_strategy(mut self, strategy: impl DiscoveryStrategy + 'static) -> Self {
        self.cfg.discovery.push(Arc::new(strategy));
        self
    }

    /// Allows other buses to be attached to the built bus.
    pub fn attachable(mut self) -> Self {
        self.cfg.attachable = true;
        self
    }

    /// Builds the bus.
    pub fn build(self) -> EventBus {
        EventBus::from_config(self.cfg)
    }
}
