//! # Example: Supertype dispatch
//!
//! Trait objects as event supertypes, declared views, a diamond hierarchy delivered
//! exactly once, and an attached child bus.

use std::sync::Arc;

use typebus::{EventBus, EventType, Listener, TypeHierarchy};

trait Notice: Send + Sync {
    fn summary(&self) -> String;
}

trait Security {}
trait Billing {}

/// Both a security and a billing notice.
struct CardLocked {
    card: &'static str,
}

impl Notice for CardLocked {
    fn summary(&self) -> String {
        format!("card {} locked", self.card)
    }
}

struct Heartbeat;

fn hierarchy() -> anyhow::Result<TypeHierarchy> {
    let mut h = TypeHierarchy::new();
    h.declare::<dyn Security, dyn Notice>()?;
    h.declare::<dyn Billing, dyn Notice>()?;
    h.declare::<CardLocked, dyn Security>()?;
    h.declare::<CardLocked, dyn Billing>()?;
    h.declare_view::<CardLocked, dyn Notice>(|c| c)?;
    Ok(h)
}

fn main() -> anyhow::Result<()> {
    let bus = EventBus::builder("notices")
        .with_supertype_dispatch(hierarchy()?)
        .attachable()
        .build();

    let notice = Listener::view::<dyn Notice, _>(|n| println!("[notice] {}", n.summary()));
    let security = Listener::erased(EventType::of::<dyn Security>(), |ev| {
        println!("[security] {}", ev.event_type());
    });
    let billing = Listener::erased(EventType::of::<dyn Billing>(), |ev| {
        println!("[billing] {}", ev.event_type());
    });
    let everything = Listener::any(|ev| println!("[root] {}", ev.event_type()));

    bus.subscribe_all(&[
        notice.into_ref(),
        security.into_ref(),
        billing.into_ref(),
        everything.into_ref(),
    ])?;

    // dyn Notice is reachable through two paths, but its listener runs once.
    bus.post(&CardLocked { card: "4242" })?;
    bus.post(&Heartbeat)?;

    let archive = Arc::new(EventBus::new("archive"));
    archive.subscribe_listener(
        &Listener::new(|c: &CardLocked| println!("[archive] stored {}", c.card)).into_ref(),
    )?;
    bus.attach(Arc::clone(&archive))?;
    bus.post(&CardLocked { card: "1337" })?;

    println!("[main] {bus} knows {} event types", bus.event_types().len());
    Ok(())
}
