//! # TypeNode: one vertex of the type lattice.
//!
//! A node owns the listener collection for exactly one [`EventType`] plus a flat list of
//! links to the nodes of its registered **supertypes**.
//!
//! ```text
//!  post(A) ─► node(A) ─► A.own            (exact-type listeners)
//!                    ├─► links[0].own     (e.g. dyn B)
//!                    ├─► links[1].own     (e.g. dyn C)
//!                    └─► links[2].own     (e.g. dyn D, reached once, never via B or C)
//! ```
//!
//! ## Rules
//! - Links point from subtype to supertype only, so the `Arc` graph stays acyclic.
//! - Dispatch is one hop: a linked node's `own` collection runs, its links never do.
//! - Links are appended only while the registry's structural lock is held.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::dispatch::EventDispatcher;
use crate::events::{EventRef, EventType};
use crate::listeners::{ListenerCollection, SharedCollection};

pub(crate) struct TypeNode {
    event_type: EventType,
    own: SharedCollection,
    links: ArcSwap<Vec<Arc<TypeNode>>>,
}

impl TypeNode {
    pub(crate) fn new(event_type: EventType, own: SharedCollection) -> Self {
        Self {
            event_type,
            own,
            links: ArcSwap::from_pointee(Vec::new()),
        }
    }

    #[inline]
    pub(crate) fn event_type(&self) -> EventType {
        self.event_type
    }

    #[inline]
    pub(crate) fn own(&self) -> &(dyn ListenerCollection + Send + Sync) {
        self.own.as_ref()
    }

    /// Appends a link. Caller must hold the registry's structural lock.
    pub(crate) fn link(&self, supertype: Arc<TypeNode>) {
        let mut next = Vec::clone(&self.links.load());
        next.push(supertype);
        self.links.store(Arc::new(next));
    }

    pub(crate) fn linked_types(&self) -> Vec<EventType> {
        self.links.load().iter().map(|n| n.event_type).collect()
    }

    /// Dispatches to the own collection, then to every linked node's own collection.
    pub(crate) fn post(&self, event: &EventRef<'_>, dispatcher: &EventDispatcher) {
        self.own.post(event, dispatcher);

        let links = self.links.load_full();
        match links.as_slice() {
            [] => {}
            [a] => a.own.post(event, dispatcher),
            [a, b] => {
                a.own.post(event, dispatcher);
                b.own.post(event, dispatcher);
            }
            [a, b, c] => {
                a.own.post(event, dispatcher);
                b.own.post(event, dispatcher);
                c.own.post(event, dispatcher);
            }
            many => {
                for node in many {
                    node.own.post(event, dispatcher);
                }
            }
        }
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNode")
            .field("event_type", &self.event_type)
            .field("listeners", &self.own.len())
            .field("links", &self.linked_types())
            .finish()
    }
}
