//! # Event type identity.
//!
//! [`EventType`] is the dispatch key of the bus: an opaque, comparable identity for
//! "the runtime type of a posted value". It wraps a [`TypeId`] together with the
//! type's name (for logs and error messages).
//!
//! Any `'static` type can be named, including trait objects (`dyn Shape`), which
//! is how supertypes of concrete events are usually expressed. Relationships
//! between event types are not derived from the type system; they are declared in a
//! [`TypeHierarchy`](crate::TypeHierarchy).
//!
//! ## Validation
//! [`EventType::validate`] rejects types that make poor dispatch keys:
//! ```text
//! u32, bool, str, ()         ─► primitive type
//! [u8; 4], [u8]              ─► array or slice
//! (A, B)                     ─► tuple
//! &T, *const T               ─► reference or pointer
//! fn(u8), {{closure}}        ─► function or closure
//! Vec<u8>, Wrapper<T>        ─► generic-parameterised type
//! ```
//! The root type ([`EventType::root`]) is always valid.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::BusError;

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
    "u64", "u128", "usize", "f32", "f64", "!",
];

/// Runtime identity of an event type.
///
/// Equality and hashing use the [`TypeId`] only; the name is informational.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the event type of `T`.
    ///
    /// # Example
    /// ```
    /// use typebus::EventType;
    ///
    /// struct Tick;
    /// trait Shape {}
    ///
    /// assert_eq!(EventType::of::<Tick>(), EventType::of::<Tick>());
    /// assert_ne!(EventType::of::<Tick>(), EventType::of::<dyn Shape>());
    /// ```
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The root event type: every event type is a subtype of it.
    #[inline]
    pub fn root() -> Self {
        Self::of::<dyn Any + Send + Sync>()
    }

    /// Returns `true` if this is [`EventType::root`].
    #[inline]
    pub fn is_root(&self) -> bool {
        self.id == TypeId::of::<dyn Any + Send + Sync>()
    }

    /// The underlying [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name (as reported by [`std::any::type_name`]).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Checks that this type may be used as a listener target or posted as an event.
    ///
    /// # Errors
    /// [`BusError::InvalidEventType`] if the type is a primitive, array, slice, tuple,
    /// reference, pointer, function, closure, or a generic-parameterised type.
    pub fn validate(&self) -> Result<(), BusError> {
        if self.is_root() {
            return Ok(());
        }
        match rejection_reason(self.name) {
            Some(reason) => Err(BusError::InvalidEventType {
                type_name: self.name,
                reason,
            }),
            None => Ok(()),
        }
    }
}

fn rejection_reason(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Some("unnamed type");
    }
    if PRIMITIVES.contains(&name) {
        return Some("primitive type");
    }
    if name.starts_with('(') {
        return Some("tuple type");
    }
    if name.starts_with('[') {
        return Some("array or slice type");
    }
    if name.starts_with('&') || name.starts_with('*') {
        return Some("reference or pointer type");
    }
    if name.starts_with("fn(") || name.starts_with("unsafe ") || name.starts_with("extern ") {
        return Some("function pointer type");
    }
    // Types declared inside a closure carry `{{closure}}` mid-path and stay valid.
    if name.rsplit("::").next() == Some("{{closure}}") {
        return Some("closure type");
    }
    if name.contains('<') {
        return Some("generic-parameterised type");
    }
    None
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
