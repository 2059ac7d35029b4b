//! Error types used by the event bus and the discovery layer.
//!
//! This module defines two error enums:
//!
//! - [`BusError`]: errors raised synchronously by the registry (type validation,
//!   target narrowing, hierarchy declaration, bus wiring).
//! - [`DiscoveryError`]: errors raised while turning a subscriber into listeners.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Panics escaping a listener callback are **not** represented here: they are handled
//! by the configured [`EventDispatcher`](crate::EventDispatcher) and either swallowed
//! or resumed on the posting thread.

use thiserror::Error;

/// # Errors produced by the event bus.
///
/// All of these propagate to the caller synchronously; none of them are retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The type cannot be used as an event type (primitive, array, tuple, reference,
    /// closure, generic-parameterised type).
    #[error("invalid event type `{type_name}`: {reason}")]
    InvalidEventType {
        /// Name of the rejected type.
        type_name: &'static str,
        /// Why the type was rejected.
        reason: &'static str,
    },

    /// A listener target was replaced by a type that is not a subtype of the current target.
    #[error("listener target `{current}` is not a supertype of requested target `{requested}`")]
    TargetMismatch {
        /// The listener's current target.
        current: &'static str,
        /// The target the caller tried to set.
        requested: &'static str,
    },

    /// Declaring `sub -> sup` would make the type hierarchy cyclic.
    #[error("declaring `{sub}` as a subtype of `{sup}` would create a cycle")]
    CyclicHierarchy {
        /// The declared subtype.
        sub: &'static str,
        /// The declared supertype.
        sup: &'static str,
    },

    /// `attach`/`detach` was called on a bus built without `attachable()`, or a bus
    /// was attached to itself.
    #[error("bus `{bus}` cannot attach: {reason}")]
    NotAttachable {
        /// Name of the bus the call was made on.
        bus: String,
        /// Why the attach was refused.
        reason: &'static str,
    },

    /// Listener discovery failed for a subscriber; nothing was registered.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::BusError;
    ///
    /// let err = BusError::InvalidEventType { type_name: "u32", reason: "primitive type" };
    /// assert_eq!(err.as_label(), "bus_invalid_event_type");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidEventType { .. } => "bus_invalid_event_type",
            BusError::TargetMismatch { .. } => "bus_target_mismatch",
            BusError::CyclicHierarchy { .. } => "bus_cyclic_hierarchy",
            BusError::NotAttachable { .. } => "bus_not_attachable",
            BusError::Discovery(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::InvalidEventType { type_name, reason } => {
                format!("rejected event type {type_name}: {reason}")
            }
            BusError::TargetMismatch { current, requested } => {
                format!("cannot narrow target {current} to {requested}")
            }
            BusError::CyclicHierarchy { sub, sup } => {
                format!("cyclic hierarchy: {sub} -> {sup}")
            }
            BusError::NotAttachable { bus, reason } => format!("bus {bus}: {reason}"),
            BusError::Discovery(e) => e.as_message(),
        }
    }

    /// Returns `true` if a type was rejected as an event type.
    ///
    /// Narrowing failures ([`BusError::TargetMismatch`]) are a separate category.
    pub fn is_type_rejection(&self) -> bool {
        matches!(self, BusError::InvalidEventType { .. })
    }
}

/// # Errors produced while discovering a subscriber's listeners.
///
/// A failed discovery aborts the whole `subscribe` call.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// A listener declaration is malformed.
    #[error("malformed listener in `{subscriber}`: {reason}")]
    Malformed {
        /// Name of the subscriber being discovered.
        subscriber: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// A filter declared for a listener could not be built.
    #[error("invalid filter in `{subscriber}`: {reason}")]
    Filter {
        /// Name of the subscriber being discovered.
        subscriber: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// A descriptor could not be bound into a listener.
    #[error("failed to bind listener of `{subscriber}`: {source}")]
    Bind {
        /// Name of the subscriber being discovered.
        subscriber: &'static str,
        /// The registry error that prevented binding.
        source: Box<BusError>,
    },
}

impl DiscoveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::DiscoveryError;
    ///
    /// let err = DiscoveryError::Malformed { subscriber: "audit", reason: "no target".into() };
    /// assert_eq!(err.as_label(), "discovery_malformed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DiscoveryError::Malformed { .. } => "discovery_malformed",
            DiscoveryError::Filter { .. } => "discovery_filter",
            DiscoveryError::Bind { .. } => "discovery_bind",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DiscoveryError::Malformed { subscriber, reason } => {
                format!("malformed: {subscriber}: {reason}")
            }
            DiscoveryError::Filter { subscriber, reason } => {
                format!("filter: {subscriber}: {reason}")
            }
            DiscoveryError::Bind { subscriber, source } => {
                format!("bind: {subscriber}: {}", source.as_message())
            }
        }
    }
}
