//! # Declared type hierarchy.
//!
//! Rust has no runtime subtype query, so the relationships that drive supertype
//! dispatch are **declared** up front as configuration data. A [`TypeHierarchy`]
//! records direct `Sub -> Super` edges and answers [`TypeHierarchy::is_subtype_of`]
//! over their transitive closure.
//!
//! ```text
//!            root (dyn Any + Send + Sync)      ◄── implicit supertype of everything
//!                        │
//!                   dyn Shape                  ◄── declare::<dyn Polygon, dyn Shape>()
//!                  ╱          ╲
//!         dyn Polygon      dyn Rounded          ◄── declare_view::<Square, dyn Polygon>(..)
//!                  ╲          ╱
//!                   RoundedSquare              ◄── posted concrete event
//! ```
//!
//! ## Views
//! An edge may carry an *upcast view* (`declare_view`), which lets a listener targeting the
//! supertype receive a typed reference (`&dyn Shape`) instead of the raw event. Views are
//! looked up for the exact `(posted type, view type)` pair; declare one per concrete event
//! type that a typed supertype listener should understand. Relation edges, by contrast, are
//! transitive.
//!
//! ## Rules
//! - `is_subtype_of` is reflexive, and every type is a subtype of [`EventType::root`].
//! - Declaring an edge that would create a cycle fails with [`BusError::CyclicHierarchy`].
//! - The hierarchy is frozen once handed to the bus builder.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::BusError;
use crate::events::EventType;

type Upcast<S> = Box<dyn for<'a> Fn(&'a (dyn Any + Send + Sync)) -> Option<&'a S> + Send + Sync>;

/// Type-erased holder for an upcast from some concrete event type to `S`.
struct Caster<S: ?Sized + 'static> {
    upcast: Upcast<S>,
}

/// Pins the higher-ranked signature of an upcast closure.
fn erased_upcast<S, F>(f: F) -> F
where
    S: ?Sized + 'static,
    F: for<'a> Fn(&'a (dyn Any + Send + Sync)) -> Option<&'a S>,
{
    f
}

/// Declared subtype relationships between event types.
#[derive(Default)]
pub struct TypeHierarchy {
    parents: HashMap<EventType, Vec<EventType>>,
    views: HashMap<(TypeId, TypeId), Box<dyn Any + Send + Sync>>,
}

impl TypeHierarchy {
    /// Creates an empty hierarchy (only the implicit root relationship holds).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `Sub` as a direct subtype of `Super`.
    ///
    /// Declaring the same edge twice is a no-op.
    ///
    /// # Errors
    /// - [`BusError::CyclicHierarchy`] if `Super` is already a subtype of `Sub`.
    ///
    /// # Example
    /// ```
    /// use typebus::{EventType, TypeHierarchy};
    ///
    /// trait Shape {}
    /// struct Circle;
    ///
    /// let mut h = TypeHierarchy::new();
    /// h.declare::<Circle, dyn Shape>()?;
    /// assert!(h.is_subtype_of(EventType::of::<Circle>(), EventType::of::<dyn Shape>()));
    /// assert!(!h.is_subtype_of(EventType::of::<dyn Shape>(), EventType::of::<Circle>()));
    /// # Ok::<(), typebus::BusError>(())
    /// ```
    pub fn declare<Sub, Super>(&mut self) -> Result<&mut Self, BusError>
    where
        Sub: ?Sized + 'static,
        Super: ?Sized + 'static,
    {
        self.declare_types(EventType::of::<Sub>(), EventType::of::<Super>())
    }

    /// Declares `Sub` as a direct subtype of `Super` and registers a typed view, so that
    /// listeners built with [`Listener::view`](crate::Listener::view) or
    /// [`Listener::new`](crate::Listener::new) for `Super` can read a posted `Sub`.
    ///
    /// # Example
    /// ```
    /// use typebus::TypeHierarchy;
    ///
    /// trait Shape { fn area(&self) -> f64; }
    /// struct Square(f64);
    /// impl Shape for Square { fn area(&self) -> f64 { self.0 * self.0 } }
    ///
    /// let mut h = TypeHierarchy::new();
    /// h.declare_view::<Square, dyn Shape>(|s| s)?;
    /// # Ok::<(), typebus::BusError>(())
    /// ```
    pub fn declare_view<Sub, Super>(
        &mut self,
        upcast: fn(&Sub) -> &Super,
    ) -> Result<&mut Self, BusError>
    where
        Sub: Any + Send + Sync,
        Super: ?Sized + 'static,
    {
        self.declare::<Sub, Super>()?;
        let caster = Caster::<Super> {
            upcast: Box::new(erased_upcast(move |value| {
                value.downcast_ref::<Sub>().map(upcast)
            })),
        };
        self.views
            .insert((TypeId::of::<Sub>(), TypeId::of::<Super>()), Box::new(caster));
        Ok(self)
    }

    /// Declares a direct edge between two already-built event types.
    ///
    /// # Errors
    /// - [`BusError::CyclicHierarchy`] if `sup` is already a subtype of `sub`.
    pub fn declare_types(&mut self, sub: EventType, sup: EventType) -> Result<&mut Self, BusError> {
        if sub.is_root() || self.is_subtype_of(sup, sub) {
            return Err(BusError::CyclicHierarchy {
                sub: sub.name(),
                sup: sup.name(),
            });
        }
        if sup.is_root() {
            return Ok(self);
        }
        let parents = self.parents.entry(sub).or_default();
        if !parents.contains(&sup) {
            parents.push(sup);
        }
        Ok(self)
    }

    /// Returns `true` if `sub` is `sup`, `sup` is the root type, or `sub` reaches `sup`
    /// through declared edges.
    pub fn is_subtype_of(&self, sub: EventType, sup: EventType) -> bool {
        if sub == sup || sup.is_root() {
            return true;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![sub];
        while let Some(ty) = stack.pop() {
            let Some(parents) = self.parents.get(&ty) else {
                continue;
            };
            for parent in parents {
                if *parent == sup {
                    return true;
                }
                if seen.insert(*parent) {
                    stack.push(*parent);
                }
            }
        }
        false
    }

    /// Returns `true` if `sub` is a subtype of `sup` and the two types differ.
    #[inline]
    pub fn is_strict_subtype_of(&self, sub: EventType, sup: EventType) -> bool {
        sub != sup && self.is_subtype_of(sub, sup)
    }

    /// Direct supertypes declared for `ty` (the implicit root is not listed).
    pub fn parents_of(&self, ty: EventType) -> &[EventType] {
        self.parents.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Views `value` (whose concrete type is `source`) as `S` using a declared view.
    pub(crate) fn view<'a, S: ?Sized + 'static>(
        &self,
        source: TypeId,
        value: &'a (dyn Any + Send + Sync),
    ) -> Option<&'a S> {
        let caster = self
            .views
            .get(&(source, TypeId::of::<S>()))?
            .downcast_ref::<Caster<S>>()?;
        (caster.upcast)(value)
    }

    /// Number of declared direct edges.
    pub fn edge_count(&self) -> usize {
        self.parents.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for TypeHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHierarchy")
            .field("parents", &self.parents)
            .field("views", &self.views.len())
            .finish()
    }
}
