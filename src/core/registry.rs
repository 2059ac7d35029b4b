//! # Registry: the append-only map from event type to lattice node.
//!
//! ```text
//! get_or_create(t)
//!   ├─ nodes.load().get(t) ── hit ──► node                  (lock-free fast path)
//!   └─ miss
//!        ├─ t.validate()?                                   (type rejection)
//!        ├─ lock(structural)
//!        ├─ re-check ── hit ──► node                        (another thread won)
//!        ├─ node = TypeNode::new(t, factory.create(t))
//!        ├─ for (u, n) in nodes:                            (only with supertype dispatch)
//!        │     t <: u  ─► node.link(n)
//!        │     u <: t  ─► n.link(node)                      (retroactive)
//!        └─ nodes.store(clone + insert)
//! ```
//!
//! ## Rules
//! - At most one node per event type; nodes are never removed.
//! - Only one thread ever runs the linking scan for a given type.
//! - Readers see either the old or the new map, never a partially built one.
//! - The map keeps creation order, which fixes the order links are visited in.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::core::node::TypeNode;
use crate::error::BusError;
use crate::events::{EventType, TypeHierarchy};
use crate::listeners::ListenerCollectionFactory;

type NodeMap = IndexMap<EventType, Arc<TypeNode>>;

pub(crate) struct Registry {
    nodes: ArcSwap<NodeMap>,
    structural: Mutex<()>,
    factory: Arc<dyn ListenerCollectionFactory>,
    hierarchy: Arc<TypeHierarchy>,
    link_supertypes: bool,
}

impl Registry {
    pub(crate) fn new(
        factory: Arc<dyn ListenerCollectionFactory>,
        hierarchy: Arc<TypeHierarchy>,
        link_supertypes: bool,
    ) -> Self {
        Self {
            nodes: ArcSwap::from_pointee(NodeMap::new()),
            structural: Mutex::new(()),
            factory,
            hierarchy,
            link_supertypes,
        }
    }

    /// Looks up an existing node without creating one.
    #[inline]
    pub(crate) fn get(&self, event_type: EventType) -> Option<Arc<TypeNode>> {
        self.nodes.load().get(&event_type).cloned()
    }

    /// Returns the node for `event_type`, creating and linking it on first use.
    pub(crate) fn get_or_create(&self, event_type: EventType) -> Result<Arc<TypeNode>, BusError> {
        if let Some(node) = self.get(event_type) {
            return Ok(node);
        }
        event_type.validate()?;

        let _structural = self.structural.lock();
        let current = self.nodes.load_full();
        if let Some(node) = current.get(&event_type) {
            return Ok(Arc::clone(node));
        }

        let node = Arc::new(TypeNode::new(event_type, self.factory.create(event_type)));
        if self.link_supertypes {
            self.link(&node, &current);
        }

        let mut next = NodeMap::clone(&current);
        next.insert(event_type, Arc::clone(&node));
        self.nodes.store(Arc::new(next));

        debug!(
            event_type = event_type.name(),
            collection = node.own().name(),
            links = node.linked_types().len(),
            nodes = current.len() + 1,
            "registered event type"
        );
        Ok(node)
    }

    fn link(&self, node: &Arc<TypeNode>, existing: &NodeMap) {
        let t = node.event_type();
        for (other_type, other) in existing {
            if self.hierarchy.is_strict_subtype_of(t, *other_type) {
                node.link(Arc::clone(other));
                debug!(sub = t.name(), sup = other_type.name(), "linked to supertype");
            } else if self.hierarchy.is_strict_subtype_of(*other_type, t) {
                other.link(Arc::clone(node));
                debug!(sub = other_type.name(), sup = t.name(), "linked existing subtype");
            }
        }
    }

    /// Registered event types, in creation order.
    pub(crate) fn event_types(&self) -> Vec<EventType> {
        self.nodes.load().keys().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.load().len()
    }

    #[inline]
    pub(crate) fn hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.hierarchy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::CollectionStrategy;

    trait Top {}
    trait Left {}
    trait Right {}
    struct Bottom;
    struct Unrelated;

    fn diamond() -> TypeHierarchy {
        let mut h = TypeHierarchy::new();
        h.declare::<dyn Left, dyn Top>().unwrap();
        h.declare::<dyn Right, dyn Top>().unwrap();
        h.declare::<Bottom, dyn Left>().unwrap();
        h.declare::<Bottom, dyn Right>().unwrap();
        h
    }

    fn registry(link: bool) -> Registry {
        Registry::new(Arc::new(CollectionStrategy::default()), Arc::new(diamond()), link)
    }

    #[test]
    fn test_one_node_per_type() {
        let r = registry(true);
        let a = r.get_or_create(EventType::of::<Bottom>()).unwrap();
        let b = r.get_or_create(EventType::of::<Bottom>()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(r.len(), 1);
        assert!(r.get(EventType::of::<Unrelated>()).is_none());
    }

    #[test]
    fn test_links_point_to_supertypes_once() {
        let r = registry(true);
        let top = EventType::of::<dyn Top>();
        let left = EventType::of::<dyn Left>();
        let right = EventType::of::<dyn Right>();
        let bottom = EventType::of::<Bottom>();

        r.get_or_create(top).unwrap();
        r.get_or_create(left).unwrap();
        r.get_or_create(right).unwrap();
        let node = r.get_or_create(bottom).unwrap();

        assert_eq!(node.linked_types(), vec![top, left, right]);
        assert_eq!(r.get(left).unwrap().linked_types(), vec![top]);
        assert!(r.get(top).unwrap().linked_types().is_empty());
    }

    #[test]
    fn test_retroactive_links() {
        let r = registry(true);
        let bottom = r.get_or_create(EventType::of::<Bottom>()).unwrap();
        assert!(bottom.linked_types().is_empty());

        r.get_or_create(EventType::of::<dyn Top>()).unwrap();
        r.get_or_create(EventType::root()).unwrap();
        assert_eq!(
            bottom.linked_types(),
            vec![EventType::of::<dyn Top>(), EventType::root()]
        );
    }

    #[test]
    fn test_unrelated_and_disabled_produce_no_links() {
        let r = registry(true);
        let node = r.get_or_create(EventType::of::<Unrelated>()).unwrap();
        r.get_or_create(EventType::of::<Bottom>()).unwrap();
        assert!(node.linked_types().is_empty());

        let flat = registry(false);
        flat.get_or_create(EventType::of::<dyn Top>()).unwrap();
        let node = flat.get_or_create(EventType::of::<Bottom>()).unwrap();
        assert!(node.linked_types().is_empty());
    }

    #[test]
    fn test_invalid_types_never_get_nodes() {
        let r = registry(true);
        let err = r.get_or_create(EventType::of::<u32>()).unwrap_err();
        assert!(err.is_type_rejection());
        assert_eq!(r.len(), 0);
    }

    #[test]
    fn test_concurrent_creation_yields_single_node() {
        let r = Arc::new(registry(true));
        let nodes: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let r = Arc::clone(&r);
                    s.spawn(move || r.get_or_create(EventType::of::<Bottom>()).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(nodes.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(r.len(), 1);
    }
}
