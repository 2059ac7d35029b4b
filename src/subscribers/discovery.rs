//! Pluggable listener discovery.
//!
//! A bus runs every configured [`DiscoveryStrategy`] against a subscriber and binds all
//! resulting descriptors. Any failure aborts the whole batch. The default strategy,
//! [`DeclaredListeners`], asks the subscriber itself via [`Subscriber::discover`].

use std::any::type_name;
use std::sync::Arc;

use crate::error::DiscoveryError;
use crate::events::TypeHierarchy;
use crate::listeners::ListenerRef;
use crate::subscribers::{ListenerDescriptor, Subscriber};

/// Produces listener descriptors for a subscriber.
///
/// Implemented for any
/// `Fn(&Arc<dyn Subscriber>) -> Result<Vec<ListenerDescriptor>, DiscoveryError> + Send + Sync`.
pub trait DiscoveryStrategy: Send + Sync {
    /// Returns the descriptors this strategy finds on `subscriber`.
    fn discover(
        &self,
        subscriber: &Arc<dyn Subscriber>,
    ) -> Result<Vec<ListenerDescriptor>, DiscoveryError>;

    /// Strategy name (for logs).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Calls [`Subscriber::discover`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredListeners;

impl DiscoveryStrategy for DeclaredListeners {
    fn discover(
        &self,
        subscriber: &Arc<dyn Subscriber>,
    ) -> Result<Vec<ListenerDescriptor>, DiscoveryError> {
        Arc::clone(subscriber).discover()
    }

    fn name(&self) -> &'static str {
        "declared"
    }
}

impl<F> DiscoveryStrategy for F
where
    F: Fn(&Arc<dyn Subscriber>) -> Result<Vec<ListenerDescriptor>, DiscoveryError> + Send + Sync,
{
    fn discover(
        &self,
        subscriber: &Arc<dyn Subscriber>,
    ) -> Result<Vec<ListenerDescriptor>, DiscoveryError> {
        self(subscriber)
    }
}

/// Runs every strategy and binds all descriptors; fails without side effects.
pub(crate) fn discover_all(
    strategies: &[Arc<dyn DiscoveryStrategy>],
    subscriber: &Arc<dyn Subscriber>,
    hierarchy: &TypeHierarchy,
) -> Result<Vec<ListenerRef>, DiscoveryError> {
    let mut descriptors = Vec::new();
    for strategy in strategies {
        descriptors.extend(strategy.discover(subscriber)?);
    }

    descriptors
        .into_iter()
        .map(|d| {
            d.bind(hierarchy).map_err(|e| DiscoveryError::Bind {
                subscriber: subscriber.name(),
                source: Box::new(e),
            })
        })
        .collect()
}
