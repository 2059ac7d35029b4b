//! # Example: Basic bus
//!
//! Priority-ordered listeners, filters, a subscriber object, cancellation and a
//! swallowing exception handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use typebus::{
    priority, Cancellable, CancellableEvent, DiscoveryError, EventBus, EventRef, Listener,
    ListenerDescriptor, ListenerPanic, Subscriber,
};

struct Withdrawal {
    account: &'static str,
    cents: u64,
    veto: CancellableEvent,
}

impl Withdrawal {
    fn new(account: &'static str, cents: u64) -> Self {
        Self {
            account,
            cents,
            veto: CancellableEvent::new(),
        }
    }
}

impl Cancellable for Withdrawal {
    fn set_cancelled(&self, cancelled: bool) {
        self.veto.set_cancelled(cancelled);
    }

    fn is_cancelled(&self) -> bool {
        self.veto.is_cancelled()
    }
}

/// Subscriber that keeps a running total of approved withdrawals.
#[derive(Default)]
struct Ledger {
    total: AtomicU64,
}

impl Subscriber for Ledger {
    fn discover(self: Arc<Self>) -> Result<Vec<ListenerDescriptor>, DiscoveryError> {
        let me = Arc::clone(&self);
        let record = Listener::new(move |w: &Withdrawal| {
            if !w.is_cancelled() {
                me.total.fetch_add(w.cents, Ordering::Relaxed);
                println!("[ledger] booked {} from {}", w.cents, w.account);
            }
        })
        .with_priority(priority::LOW)
        .with_name("ledger");
        Ok(vec![record.into()])
    }

    fn name(&self) -> &'static str {
        "ledger"
    }
}

fn main() -> anyhow::Result<()> {
    let bus = EventBus::builder("bank")
        .with_exception_handler(|ev: &EventRef<'_>, l: &Listener, p: &ListenerPanic| {
            println!("[bus] {l} failed on {}: {p} (swallowed)", ev.event_type());
            false
        })
        .build();

    let limit = Listener::new(|w: &Withdrawal| {
        println!("[limit] vetoing {} from {}", w.cents, w.account);
        w.cancel();
    })
    .with_priority(priority::HIGHEST)
    .filter(|w: &Withdrawal| w.cents > 10_000)
    .with_name("limit")
    .into_ref();

    let audit = Listener::new(|w: &Withdrawal| {
        println!("[audit] {} requested {}", w.account, w.cents);
    })
    .with_priority(priority::HIGH)
    .into_ref();

    bus.subscribe_all(&[limit, audit])?;

    let ledger = Arc::new(Ledger::default());
    bus.subscribe(&ledger)?;

    for (account, cents) in [("alice", 2_500), ("bob", 50_000), ("carol", 700)] {
        let cancelled = bus.post_cancellable(&Withdrawal::new(account, cents))?;
        println!("[main] {account}: cancelled={cancelled}");
    }
    println!("[main] total booked: {}", ledger.total.load(Ordering::Relaxed));

    // A panicking listener is reported to the handler; later listeners of that type are skipped.
    let flaky = Listener::new(|_: &Withdrawal| panic!("ledger offline"))
        .with_priority(priority::MEDIUM)
        .with_name("flaky")
        .into_ref();
    bus.subscribe_listener(&flaky)?;
    bus.post(&Withdrawal::new("dave", 100))?;
    bus.unsubscribe_listener(&flaky);

    bus.unsubscribe(&ledger);
    bus.post(&Withdrawal::new("erin", 100))?;
    println!("[main] total after unsubscribe: {}", ledger.total.load(Ordering::Relaxed));

    // Rejected event types are reported, not ignored.
    if let Err(err) = bus.post(&42_u32) {
        println!("[main] {}: {}", err.as_label(), err);
    }
    Ok(())
}
