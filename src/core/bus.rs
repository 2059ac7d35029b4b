//! # EventBus: the public subscribe / post surface.
//!
//! [`EventBus`] ties together the registry (event type → lattice node), the dispatcher
//! (panic policy), the subscriber binding cache and, optionally, a list of attached buses.
//!
//! ## Architecture
//! ```text
//! subscribe_listener(l) ──► registry.get_or_create(l.target()) ──► node.own.add(l)
//!
//! subscribe(&sub) ──► cache.get_or_bind(sub, discover_all) ──► subscribe_listener(each)
//!
//! post(&e) ──► registry.get_or_create(type_of(e))        (validates on first sight)
//!          ├─► node.post(EventRef, dispatcher)           (own, then linked supertypes)
//!          └─► attached[i].post(&e)                      (attachable buses only)
//! ```
//!
//! ## Rules
//! - Every operation runs on the calling thread; `post` never spawns or suspends.
//! - Any number of threads may subscribe, unsubscribe and post concurrently.
//! - Registry errors (type rejection, narrowing, discovery) are returned synchronously.
//! - Listener panics follow the configured [`EventDispatcher`].
//! - A failed `subscribe(subscriber)` registers nothing.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//! use typebus::{priority, EventBus, Listener};
//!
//! struct Deposit { cents: u64 }
//!
//! let bus = EventBus::new("ledger");
//! let total = Arc::new(AtomicU64::new(0));
//!
//! let sum = Arc::clone(&total);
//! let listener = Listener::new(move |d: &Deposit| {
//!     sum.fetch_add(d.cents, Ordering::Relaxed);
//! })
//! .with_priority(priority::HIGH)
//! .into_ref();
//!
//! assert!(bus.subscribe_listener(&listener)?);
//! bus.post(&Deposit { cents: 250 })?;
//! assert_eq!(total.load(Ordering::Relaxed), 250);
//!
//! assert!(bus.unsubscribe_listener(&listener));
//! bus.post(&Deposit { cents: 250 })?;
//! assert_eq!(total.load(Ordering::Relaxed), 250);
//! # Ok::<(), typebus::BusError>(())
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::core::registry::Registry;
use crate::core::{BusConfig, EventBusBuilder};
use crate::dispatch::EventDispatcher;
use crate::error::BusError;
use crate::events::{Cancellable, EventRef, EventType, TypeHierarchy};
use crate::listeners::ListenerRef;
use crate::subscribers::{discover_all, DiscoveryStrategy, Subscriber, SubscriberBindingCache};

/// Serializes attach/detach across all buses so cycle checks cannot race.
static TOPOLOGY: Mutex<()> = Mutex::new(());

/// In-process, synchronous, type-keyed event bus.
pub struct EventBus {
    name: String,
    registry: Registry,
    dispatcher: EventDispatcher,
    bindings: SubscriberBindingCache,
    discovery: Vec<Arc<dyn DiscoveryStrategy>>,
    supertype_dispatch: bool,
    attachable: bool,
    attached: ArcSwap<Vec<Arc<EventBus>>>,
}

impl EventBus {
    /// Creates a bus with default settings: exact-type dispatch, default exception handler,
    /// copy-on-write collections.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Starts building a bus.
    pub fn builder(name: impl Into<String>) -> EventBusBuilder {
        EventBusBuilder::new(name)
    }

    /// Builds a bus from a configuration.
    pub fn from_config(cfg: BusConfig) -> Self {
        let dispatcher = cfg.dispatcher();
        let discovery = cfg.discovery_strategies();
        let registry = Registry::new(
            cfg.collection_factory,
            cfg.hierarchy,
            cfg.supertype_dispatch,
        );
        debug!(
            bus = %cfg.name,
            supertype_dispatch = cfg.supertype_dispatch,
            dispatcher = ?dispatcher,
            attachable = cfg.attachable,
            "event bus created"
        );
        Self {
            name: cfg.name,
            registry,
            dispatcher,
            bindings: SubscriberBindingCache::new(),
            discovery,
            supertype_dispatch: cfg.supertype_dispatch,
            attachable: cfg.attachable,
            attached: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// The bus name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether listeners also receive events of declared subtypes.
    #[inline]
    pub fn is_supertype_dispatch(&self) -> bool {
        self.supertype_dispatch
    }

    /// The frozen type hierarchy.
    #[inline]
    pub fn hierarchy(&self) -> &TypeHierarchy {
        self.registry.hierarchy()
    }

    // ---- listeners -------------------------------------------------------------------

    /// Registers one listener under its target type.
    ///
    /// Returns `false` if that exact listener was already registered.
    ///
    /// # Errors
    /// [`BusError::InvalidEventType`] if the target type is rejected.
    pub fn subscribe_listener(&self, listener: &ListenerRef) -> Result<bool, BusError> {
        let node = self.registry.get_or_create(listener.target())?;
        let added = node.own().add(Arc::clone(listener));
        trace!(bus = %self.name, listener = %listener, added, "subscribe listener");
        Ok(added)
    }

    /// Removes one listener. Returns `false` if it was not registered.
    ///
    /// Never creates a node for an unseen type.
    pub fn unsubscribe_listener(&self, listener: &ListenerRef) -> bool {
        let removed = self
            .registry
            .get(listener.target())
            .is_some_and(|node| node.own().remove(listener));
        trace!(bus = %self.name, listener = %listener, removed, "unsubscribe listener");
        removed
    }

    /// Registers every listener in order. Returns how many were newly added.
    ///
    /// # Errors
    /// Stops at the first rejected target; earlier listeners stay registered.
    pub fn subscribe_all(&self, listeners: &[ListenerRef]) -> Result<usize, BusError> {
        let mut added = 0;
        for listener in listeners {
            added += usize::from(self.subscribe_listener(listener)?);
        }
        Ok(added)
    }

    /// Removes every listener. Returns how many were present.
    pub fn unsubscribe_all(&self, listeners: &[ListenerRef]) -> usize {
        listeners
            .iter()
            .filter(|l| self.unsubscribe_listener(l))
            .count()
    }

    // ---- subscribers -----------------------------------------------------------------

    /// Discovers (once per instance) and registers a subscriber's listeners.
    ///
    /// # Errors
    /// [`BusError::Discovery`] if any strategy fails or any descriptor cannot be bound;
    /// nothing is registered in that case.
    pub fn subscribe<S: Subscriber>(&self, subscriber: &Arc<S>) -> Result<(), BusError> {
        let subscriber: Arc<dyn Subscriber> = Arc::clone(subscriber) as Arc<dyn Subscriber>;
        let listeners = self.bindings.get_or_bind(&subscriber, |s| {
            discover_all(&self.discovery, s, self.registry.hierarchy())
        })?;

        for listener in listeners.iter() {
            self.subscribe_listener(listener)?;
        }
        trace!(
            bus = %self.name,
            subscriber = subscriber.name(),
            listeners = listeners.len(),
            "subscribed"
        );
        Ok(())
    }

    /// Removes a subscriber's cached listeners. Unknown subscribers are ignored.
    ///
    /// The binding stays cached, so subscribing the same instance again reuses it.
    pub fn unsubscribe<S: Subscriber>(&self, subscriber: &Arc<S>) {
        let subscriber: Arc<dyn Subscriber> = Arc::clone(subscriber) as Arc<dyn Subscriber>;
        let Some(listeners) = self.bindings.get(&subscriber) else {
            trace!(bus = %self.name, subscriber = subscriber.name(), "unsubscribe: not bound");
            return;
        };
        let removed = self.unsubscribe_all(&listeners);
        trace!(bus = %self.name, subscriber = subscriber.name(), removed, "unsubscribed");
    }

    /// Unsubscribes a subscriber and drops its cached binding.
    ///
    /// Listeners usually hold the subscriber alive; forgetting releases them.
    /// Returns `false` if the subscriber was never bound.
    pub fn forget<S: Subscriber>(&self, subscriber: &Arc<S>) -> bool {
        let subscriber: Arc<dyn Subscriber> = Arc::clone(subscriber) as Arc<dyn Subscriber>;
        match self.bindings.remove(&subscriber) {
            Some(listeners) => {
                self.unsubscribe_all(&listeners);
                true
            }
            None => false,
        }
    }

    // ---- posting ---------------------------------------------------------------------

    /// Dispatches `event` to every listener of its type (and, with supertype dispatch, of
    /// its registered supertypes), then re-posts it to attached buses.
    ///
    /// # Errors
    /// [`BusError::InvalidEventType`] the first time a rejected type is posted (and every
    /// time after; rejected types never get a node).
    ///
    /// # Panics
    /// Resumes a listener panic if the dispatcher is fast or the handler asks for it.
    pub fn post<E: Any + Send + Sync>(&self, event: &E) -> Result<(), BusError> {
        let node = self.registry.get_or_create(EventType::of::<E>())?;
        node.post(&EventRef::new(event, self.registry.hierarchy()), &self.dispatcher);

        if self.attachable {
            for bus in self.attached.load_full().iter() {
                bus.post(event)?;
            }
        }
        Ok(())
    }

    /// Posts a cancellable event and returns whether it ended up cancelled.
    ///
    /// Cancellation never stops dispatch; every listener still sees the event.
    ///
    /// # Errors
    /// Same as [`EventBus::post`].
    pub fn post_cancellable<E>(&self, event: &E) -> Result<bool, BusError>
    where
        E: Any + Send + Sync + Cancellable,
    {
        self.post(event)?;
        Ok(event.is_cancelled())
    }

    // ---- introspection ---------------------------------------------------------------

    /// Listeners registered exactly under `event_type` (linked supertypes not counted).
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.registry
            .get(event_type)
            .map_or(0, |node| node.own().len())
    }

    /// Event types seen so far, in registration order.
    ///
    /// Nodes are never removed: a type that was once subscribed to stays listed for the
    /// lifetime of the bus, even after its last listener is gone.
    pub fn event_types(&self) -> Vec<EventType> {
        self.registry.event_types()
    }

    /// Listeners registered exactly under `event_type`, in dispatch order.
    pub fn listeners_of(&self, event_type: EventType) -> Vec<ListenerRef> {
        self.registry
            .get(event_type)
            .map(|node| node.own().snapshot())
            .unwrap_or_default()
    }

    // ---- attached buses --------------------------------------------------------------

    /// Attaches `bus`: every event posted here is re-posted to it after local dispatch.
    ///
    /// Returns `false` if `bus` was already attached.
    ///
    /// # Errors
    /// [`BusError::NotAttachable`] if this bus was not built `attachable()`, or if the
    /// attachment would make a bus reach itself.
    pub fn attach(&self, bus: Arc<EventBus>) -> Result<bool, BusError> {
        self.ensure_attachable()?;
        let _topology = TOPOLOGY.lock();
        if bus.reaches(self) {
            return Err(BusError::NotAttachable {
                bus: self.name.clone(),
                reason: "attachment would create a cycle",
            });
        }

        let current = self.attached.load_full();
        if current.iter().any(|b| Arc::ptr_eq(b, &bus)) {
            return Ok(false);
        }
        let mut next = Vec::clone(&current);
        debug!(bus = %self.name, attached = %bus.name, "bus attached");
        next.push(bus);
        self.attached.store(Arc::new(next));
        Ok(true)
    }

    /// Detaches `bus`. Returns `false` if it was not attached.
    ///
    /// # Errors
    /// [`BusError::NotAttachable`] if this bus was not built `attachable()`.
    pub fn detach(&self, bus: &Arc<EventBus>) -> Result<bool, BusError> {
        self.ensure_attachable()?;
        let _topology = TOPOLOGY.lock();

        let current = self.attached.load_full();
        let mut next = Vec::clone(&current);
        next.retain(|b| !Arc::ptr_eq(b, bus));
        if next.len() == current.len() {
            return Ok(false);
        }
        self.attached.store(Arc::new(next));
        debug!(bus = %self.name, detached = %bus.name, "bus detached");
        Ok(true)
    }

    /// Buses currently attached, in attach order.
    pub fn attached(&self) -> Vec<Arc<EventBus>> {
        self.attached.load().to_vec()
    }

    fn ensure_attachable(&self) -> Result<(), BusError> {
        if self.attachable {
            Ok(())
        } else {
            Err(BusError::NotAttachable {
                bus: self.name.clone(),
                reason: "bus was not built attachable",
            })
        }
    }

    /// Whether `target` is this bus or reachable through attachments.
    fn reaches(&self, target: &EventBus) -> bool {
        std::ptr::eq(self, target) || self.attached.load().iter().any(|b| b.reaches(target))
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventBus{{name='{}'}}", self.name)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("supertype_dispatch", &self.supertype_dispatch)
            .field("dispatcher", &self.dispatcher)
            .field("event_types", &self.registry.len())
            .field("subscribers", &self.bindings.len())
            .field("attached", &self.attached.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ListenerPanic;
    use crate::events::CancellableEvent;
    use crate::error::DiscoveryError;
    use crate::listeners::{priority, Listener};
    use crate::subscribers::ListenerDescriptor;
    use rand::seq::SliceRandom;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    // Diamond: Top <- Left, Right <- Bottom.
    trait Top {}
    trait Left {}
    trait Right {}
    struct Bottom;
    struct Unrelated;
    impl Left for Bottom {}

    trait Shape: Send + Sync {
        fn area(&self) -> f64;
    }
    struct Square(f64);
    impl Shape for Square {
        fn area(&self) -> f64 {
            self.0 * self.0
        }
    }

    fn diamond() -> TypeHierarchy {
        let mut h = TypeHierarchy::new();
        h.declare::<dyn Left, dyn Top>().unwrap();
        h.declare::<dyn Right, dyn Top>().unwrap();
        h.declare::<Bottom, dyn Left>().unwrap();
        h.declare::<Bottom, dyn Right>().unwrap();
        h
    }

    fn counting(target: EventType) -> (Arc<AtomicUsize>, ListenerRef) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let listener = Listener::erased(target, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .into_ref();
        (hits, listener)
    }

    type Log = Arc<StdMutex<Vec<&'static str>>>;

    fn tagging(log: &Log, target: EventType, tag: &'static str) -> Listener {
        let sink = Arc::clone(log);
        Listener::erased(target, move |_| sink.lock().unwrap().push(tag))
    }

    #[test]
    fn test_display_and_name() {
        let bus = EventBus::new("main");
        assert_eq!(bus.name(), "main");
        assert_eq!(bus.to_string(), "EventBus{name='main'}");
        assert!(!bus.is_supertype_dispatch());
    }

    #[test]
    fn test_exact_type_isolation_without_supertype_dispatch() {
        let bus = EventBus::builder("flat").with_hierarchy(diamond()).build();
        let (top_hits, top) = counting(EventType::of::<dyn Top>());
        let (other_hits, other) = counting(EventType::of::<Unrelated>());
        let (root_hits, root) = counting(EventType::root());
        let (exact_hits, exact) = counting(EventType::of::<Bottom>());
        bus.subscribe_all(&[top, other, root, exact]).unwrap();

        bus.post(&Bottom).unwrap();
        assert_eq!(exact_hits.load(Ordering::SeqCst), 1);
        assert_eq!(top_hits.load(Ordering::SeqCst), 0);
        assert_eq!(other_hits.load(Ordering::SeqCst), 0);
        assert_eq!(root_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_root_listener_receives_every_event_once() {
        let bus = EventBus::builder("root")
            .with_supertype_dispatch(TypeHierarchy::new())
            .build();
        let (hits, root) = counting(EventType::root());
        bus.subscribe_listener(&root).unwrap();

        struct LocalEvent;
        bus.post(&LocalEvent).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        bus.post(&Unrelated).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_diamond_exactly_once_in_any_order() {
        let mut rng = rand::thread_rng();
        let targets = [
            EventType::of::<dyn Top>(),
            EventType::of::<dyn Left>(),
            EventType::of::<dyn Right>(),
            EventType::of::<Bottom>(),
            EventType::root(),
        ];

        for round in 0..20 {
            let bus = EventBus::builder("diamond")
                .with_supertype_dispatch(diamond())
                .build();
            let mut order = targets.to_vec();
            order.shuffle(&mut rng);
            if round % 2 == 0 {
                // Create the concrete node before any supertype node.
                bus.post(&Bottom).unwrap();
            }

            let counters: Vec<_> = order
                .iter()
                .map(|t| {
                    let (hits, l) = counting(*t);
                    bus.subscribe_listener(&l).unwrap();
                    hits
                })
                .collect();

            bus.post(&Bottom).unwrap();
            for (t, hits) in order.iter().zip(&counters) {
                assert_eq!(hits.load(Ordering::SeqCst), 1, "{t} in {order:?}");
            }
        }
    }

    #[test]
    fn test_supertype_listener_does_not_see_supertype_siblings() {
        let bus = EventBus::builder("siblings")
            .with_supertype_dispatch(diamond())
            .build();
        let (left_hits, left) = counting(EventType::of::<dyn Left>());
        bus.subscribe_listener(&left).unwrap();

        bus.post(&Unrelated).unwrap();
        assert_eq!(left_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_retroactive_linking() {
        let bus = EventBus::builder("late")
            .with_supertype_dispatch(diamond())
            .build();
        let (sub_hits, sub) = counting(EventType::of::<Bottom>());
        bus.subscribe_listener(&sub).unwrap();

        let (sup_hits, sup) = counting(EventType::of::<dyn Top>());
        bus.subscribe_listener(&sup).unwrap();

        bus.post(&Bottom).unwrap();
        assert_eq!(sub_hits.load(Ordering::SeqCst), 1);
        assert_eq!(sup_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_own_listeners_run_before_linked() {
        let bus = EventBus::builder("order")
            .with_supertype_dispatch(diamond())
            .build();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let sup = tagging(&log, EventType::of::<dyn Top>(), "top")
            .with_priority(priority::HIGHEST)
            .into_ref();
        let own = tagging(&log, EventType::of::<Bottom>(), "bottom")
            .with_priority(priority::LOWEST)
            .into_ref();
        bus.subscribe_all(&[sup, own]).unwrap();

        bus.post(&Bottom).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["bottom", "top"]);
    }

    #[test]
    fn test_typed_view_listener() {
        let mut h = TypeHierarchy::new();
        h.declare_view::<Square, dyn Shape>(|s| s).unwrap();
        let bus = EventBus::builder("shapes").with_supertype_dispatch(h).build();

        let areas = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&areas);
        let l = Listener::view::<dyn Shape, _>(move |s| sink.lock().unwrap().push(s.area()))
            .into_ref();
        bus.subscribe_listener(&l).unwrap();

        bus.post(&Square(3.0)).unwrap();
        assert_eq!(*areas.lock().unwrap(), vec![9.0]);
    }

    #[test]
    fn test_view_listener_needs_a_view_per_concrete_type() {
        let mut h = TypeHierarchy::new();
        h.declare::<dyn Left, dyn Top>().unwrap();
        h.declare_view::<Bottom, dyn Left>(|b| b).unwrap();
        assert!(h.is_subtype_of(EventType::of::<Bottom>(), EventType::of::<dyn Top>()));
        let bus = EventBus::builder("views").with_supertype_dispatch(h).build();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let top = Listener::view::<dyn Top, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .into_ref();
        bus.subscribe_listener(&top).unwrap();

        bus.post(&Bottom).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0, "no Bottom -> dyn Top view declared");
        assert_eq!(bus.listeners_of(EventType::of::<dyn Top>()).len(), 1);
    }

    #[test]
    fn test_struct_declared_inside_closure_can_be_posted() {
        let bus = EventBus::new("local");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let run = move || {
            struct Local;
            let l = Listener::new(move |_: &Local| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .into_ref();
            bus.subscribe_listener(&l)?;
            bus.post(&Local)
        };
        run().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_type_rejection_on_post_and_subscribe() {
        let bus = EventBus::new("strict");
        assert!(bus.post(&7_u32).unwrap_err().is_type_rejection());
        assert!(bus.post(&(1_u8, 2_u8)).unwrap_err().is_type_rejection());
        assert!(bus.post(&[0_u8; 4]).unwrap_err().is_type_rejection());
        assert!(bus.post(&vec![1_u8]).unwrap_err().is_type_rejection());

        let l = Listener::erased(EventType::of::<String>(), |_| {}).into_ref();
        assert!(bus.subscribe_listener(&l).is_ok());
        let bad = Listener::erased(EventType::of::<bool>(), |_| {}).into_ref();
        assert!(bus.subscribe_listener(&bad).unwrap_err().is_type_rejection());
        assert_eq!(bus.event_types(), vec![EventType::of::<String>()]);
    }

    #[test]
    fn test_listener_registration_bookkeeping() {
        let bus = EventBus::new("book");
        let (_, l) = counting(EventType::of::<Unrelated>());

        assert!(!bus.unsubscribe_listener(&l));
        assert!(bus.event_types().is_empty(), "unsubscribe must not create nodes");

        assert!(bus.subscribe_listener(&l).unwrap());
        assert!(!bus.subscribe_listener(&l).unwrap());
        assert_eq!(bus.listener_count(EventType::of::<Unrelated>()), 1);

        assert!(bus.unsubscribe_listener(&l));
        assert!(!bus.unsubscribe_listener(&l));
        assert_eq!(bus.listener_count(EventType::of::<Unrelated>()), 0);
        assert_eq!(bus.event_types().len(), 1, "nodes are never removed");
    }

    #[test]
    fn test_listeners_of_is_priority_ordered() {
        let bus = EventBus::new("ordered");
        let t = EventType::of::<Unrelated>();
        for p in [priority::LOW, priority::HIGHEST, priority::MEDIUM] {
            bus.subscribe_listener(&Listener::erased(t, |_| {}).with_priority(p).into_ref())
                .unwrap();
        }
        let got: Vec<_> = bus.listeners_of(t).iter().map(|l| l.priority()).collect();
        assert_eq!(got, vec![200, 0, -100]);
    }

    fn three_on_bottom(bus: &EventBus) -> Log {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let t = EventType::of::<Bottom>();
        let before = tagging(&log, t, "before").with_priority(priority::HIGH).into_ref();
        let throwing = Listener::erased(t, |_| panic!("listener failed")).into_ref();
        let after = tagging(&log, t, "after").with_priority(priority::LOW).into_ref();
        bus.subscribe_all(&[after, throwing, before]).unwrap();
        log
    }

    #[test]
    fn test_default_handler_rethrows_to_poster() {
        let bus = EventBus::new("default");
        let log = three_on_bottom(&bus);
        let outcome = catch_unwind(AssertUnwindSafe(|| bus.post(&Bottom)));
        assert!(outcome.is_err());
        assert_eq!(*log.lock().unwrap(), vec!["before"]);
    }

    #[test]
    fn test_fast_dispatch_rethrows_to_poster() {
        let bus = EventBus::builder("fast").without_exception_handler().build();
        let log = three_on_bottom(&bus);
        assert!(catch_unwind(AssertUnwindSafe(|| bus.post(&Bottom))).is_err());
        assert_eq!(*log.lock().unwrap(), vec!["before"]);
    }

    #[test]
    fn test_rethrown_panic_skips_linked_supertypes() {
        let fast = EventBus::builder("fast-diamond")
            .with_supertype_dispatch(diamond())
            .without_exception_handler()
            .build();
        let default = EventBus::builder("default-diamond")
            .with_supertype_dispatch(diamond())
            .build();

        for bus in [&default, &fast] {
            let log = three_on_bottom(bus);
            let (top_hits, top) = counting(EventType::of::<dyn Top>());
            bus.subscribe_listener(&top).unwrap();

            assert!(catch_unwind(AssertUnwindSafe(|| bus.post(&Bottom))).is_err());
            assert_eq!(*log.lock().unwrap(), vec!["before"], "{bus}");
            assert_eq!(top_hits.load(Ordering::SeqCst), 0, "{bus}");
        }
    }

    #[test]
    fn test_swallowing_handler_skips_rest_of_collection_only() {
        let swallowed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&swallowed);
        let bus = EventBus::builder("swallow")
            .with_supertype_dispatch(diamond())
            .with_exception_handler(move |_: &EventRef<'_>, _: &Listener, p: &ListenerPanic| {
                assert_eq!(p.message(), "listener failed");
                seen.fetch_add(1, Ordering::SeqCst);
                false
            })
            .build();
        let log = three_on_bottom(&bus);
        let (top_hits, top) = counting(EventType::of::<dyn Top>());
        bus.subscribe_listener(&top).unwrap();

        bus.post(&Bottom).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["before"]);
        assert_eq!(swallowed.load(Ordering::SeqCst), 1);
        assert_eq!(top_hits.load(Ordering::SeqCst), 1, "linked nodes still dispatched");
    }

    #[test]
    fn test_post_cancellable() {
        struct Shutdown {
            flag: CancellableEvent,
        }
        impl Cancellable for Shutdown {
            fn set_cancelled(&self, cancelled: bool) {
                self.flag.set_cancelled(cancelled);
            }
            fn is_cancelled(&self) -> bool {
                self.flag.is_cancelled()
            }
        }

        let bus = EventBus::new("cancel");
        let ev = Shutdown { flag: CancellableEvent::new() };
        assert!(!bus.post_cancellable(&ev).unwrap());

        let late_hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&late_hits);
        let late = Listener::new(move |_: &Shutdown| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .with_priority(priority::LOWEST)
        .into_ref();
        let veto = Listener::new(|s: &Shutdown| s.cancel()).into_ref();
        bus.subscribe_all(&[veto, late]).unwrap();

        let ev = Shutdown { flag: CancellableEvent::new() };
        assert!(bus.post_cancellable(&ev).unwrap());
        assert_eq!(late_hits.load(Ordering::SeqCst), 1, "cancellation does not stop dispatch");
    }

    // ---- subscribers ----

    struct Auditor {
        discoveries: AtomicUsize,
        seen: AtomicUsize,
        broken: bool,
    }

    impl Auditor {
        fn new(broken: bool) -> Arc<Self> {
            Arc::new(Self {
                discoveries: AtomicUsize::new(0),
                seen: AtomicUsize::new(0),
                broken,
            })
        }
    }

    impl Subscriber for Auditor {
        fn discover(self: Arc<Self>) -> Result<Vec<ListenerDescriptor>, DiscoveryError> {
            self.discoveries.fetch_add(1, Ordering::SeqCst);
            let me = Arc::clone(&self);
            let mut out = vec![ListenerDescriptor::from(Listener::new(move |_: &Unrelated| {
                me.seen.fetch_add(1, Ordering::SeqCst);
            }))];
            if self.broken {
                out.push(Listener::erased(EventType::of::<[u8; 2]>(), |_| {}).into());
            }
            Ok(out)
        }

        fn name(&self) -> &'static str {
            "auditor"
        }
    }

    #[test]
    fn test_subscriber_lifecycle_reuses_binding() {
        let bus = EventBus::new("subs");
        let auditor = Auditor::new(false);

        bus.subscribe(&auditor).unwrap();
        bus.post(&Unrelated).unwrap();
        bus.unsubscribe(&auditor);
        bus.post(&Unrelated).unwrap();
        bus.subscribe(&auditor).unwrap();
        bus.subscribe(&auditor).unwrap();
        bus.post(&Unrelated).unwrap();

        assert_eq!(auditor.seen.load(Ordering::SeqCst), 2);
        assert_eq!(auditor.discoveries.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(EventType::of::<Unrelated>()), 1);

        assert!(bus.forget(&auditor));
        assert!(!bus.forget(&auditor));
        assert_eq!(bus.listener_count(EventType::of::<Unrelated>()), 0);
    }

    #[test]
    fn test_subscriber_stays_bound_until_forgotten() {
        let bus = EventBus::new("held");
        let auditor = Auditor::new(false);
        let weak = Arc::downgrade(&auditor);
        bus.subscribe(&auditor).unwrap();
        drop(auditor);

        bus.post(&Unrelated).unwrap();
        let auditor = weak.upgrade().expect("bus holds bound subscribers");
        assert_eq!(auditor.seen.load(Ordering::SeqCst), 1);

        assert!(bus.forget(&auditor));
        drop(auditor);
        assert!(weak.upgrade().is_none(), "forget releases the subscriber");
        assert_eq!(bus.listener_count(EventType::of::<Unrelated>()), 0);
    }

    #[test]
    fn test_failed_discovery_registers_nothing() {
        let bus = EventBus::new("atomic");
        let auditor = Auditor::new(true);

        let err = bus.subscribe(&auditor).unwrap_err();
        assert_eq!(err.as_label(), "discovery_bind");
        assert!(err.to_string().contains("auditor"), "{err}");
        assert!(bus.event_types().is_empty());

        bus.post(&Unrelated).unwrap();
        assert_eq!(auditor.seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_subscriber_is_noop() {
        let bus = EventBus::new("noop");
        bus.unsubscribe(&Auditor::new(false));
        assert!(bus.event_types().is_empty());
    }

    #[test]
    fn test_custom_discovery_strategy_replaces_default() {
        let bus = EventBus::builder("custom")
            .with_discovery_strategy(|_: &Arc<dyn Subscriber>| {
                Ok::<_, DiscoveryError>(vec![ListenerDescriptor::new(Listener::any(|_| {}))])
            })
            .build();
        let auditor = Auditor::new(false);
        bus.subscribe(&auditor).unwrap();

        assert_eq!(auditor.discoveries.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count(EventType::root()), 1);
    }

    // ---- attach ----

    #[test]
    fn test_attach_and_detach() {
        let parent = EventBus::builder("parent").attachable().build();
        let child = Arc::new(EventBus::new("child"));
        let (hits, l) = counting(EventType::of::<Unrelated>());
        child.subscribe_listener(&l).unwrap();

        assert!(parent.attach(Arc::clone(&child)).unwrap());
        assert!(!parent.attach(Arc::clone(&child)).unwrap());
        assert_eq!(parent.attached().len(), 1);

        parent.post(&Unrelated).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(parent.detach(&child).unwrap());
        assert!(!parent.detach(&child).unwrap());
        parent.post(&Unrelated).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_attach_rejections() {
        let plain = EventBus::new("plain");
        let err = plain.attach(Arc::new(EventBus::new("x"))).unwrap_err();
        assert_eq!(err.as_label(), "bus_not_attachable");

        let a = Arc::new(EventBus::builder("a").attachable().build());
        let b = Arc::new(EventBus::builder("b").attachable().build());
        assert!(a.attach(Arc::clone(&a)).is_err(), "self attach");
        a.attach(Arc::clone(&b)).unwrap();
        assert!(b.attach(Arc::clone(&a)).is_err(), "cycle");
    }

    // ---- concurrency ----

    #[derive(Default)]
    struct Chan0;
    #[derive(Default)]
    struct Chan1;
    #[derive(Default)]
    struct Chan2;
    #[derive(Default)]
    struct Chan3;

    /// Subscribes to `E`, posts it 200 times, then adds a root listener.
    fn hammer<E: Any + Send + Sync + Default>(bus: &EventBus) -> usize {
        let (hits, l) = counting(EventType::of::<E>());
        bus.subscribe_listener(&l).unwrap();
        for _ in 0..200 {
            bus.post(&E::default()).unwrap();
        }
        let (_, extra) = counting(EventType::root());
        bus.subscribe_listener(&extra).unwrap();
        hits.load(Ordering::SeqCst)
    }

    #[test]
    fn test_concurrent_subscribe_and_post() {
        let bus = EventBus::builder("threads")
            .with_supertype_dispatch(TypeHierarchy::new())
            .build();
        let (root_hits, root) = counting(EventType::root());
        bus.subscribe_listener(&root).unwrap();

        let counts = std::thread::scope(|s| {
            let h0 = s.spawn(|| hammer::<Chan0>(&bus));
            let h1 = s.spawn(|| hammer::<Chan1>(&bus));
            let h2 = s.spawn(|| hammer::<Chan2>(&bus));
            let h3 = s.spawn(|| hammer::<Chan3>(&bus));
            [h0, h1, h2, h3].map(|h| h.join().unwrap())
        });

        assert_eq!(counts, [200; 4]);
        assert_eq!(root_hits.load(Ordering::SeqCst), 800);
        assert_eq!(bus.listener_count(EventType::root()), 5);
        assert_eq!(bus.event_types().len(), 5);
    }

    #[test]
    fn test_listener_may_use_bus_while_posting() {
        let bus = Arc::new(
            EventBus::builder("reentrant")
                .with_supertype_dispatch(TypeHierarchy::new())
                .build(),
        );
        let (inner_hits, inner) = counting(EventType::of::<Chan1>());

        let weak = Arc::downgrade(&bus);
        let outer = Listener::new(move |_: &Chan0| {
            if let Some(bus) = weak.upgrade() {
                bus.subscribe_listener(&inner).unwrap();
                bus.post(&Chan1).unwrap();
            }
        })
        .into_ref();
        bus.subscribe_listener(&outer).unwrap();

        bus.post(&Chan0).unwrap();
        assert_eq!(inner_hits.load(Ordering::SeqCst), 1);
    }
}
