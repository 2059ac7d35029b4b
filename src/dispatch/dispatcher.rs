//! # EventDispatcher: invokes an ordered listener slice for one event.
//!
//! Two variants, chosen once per bus:
//!
//! | Variant      | On listener panic                                                    |
//! |--------------|----------------------------------------------------------------------|
//! | `Fast`       | unwinds straight to the poster; later listeners are not invoked      |
//! | `Handling`   | caught, given to the handler; resumed or swallowed per its answer    |
//!
//! In both variants the listeners after a panicking one are skipped. `Handling` only
//! changes whether `post` returns normally.

use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::trace;

use crate::dispatch::{ListenerExceptionHandler, ListenerPanic};
use crate::events::EventRef;
use crate::listeners::ListenerRef;

/// Dispatch policy applied to every collection of a bus.
#[derive(Clone)]
pub enum EventDispatcher {
    /// Invoke listeners in order; panics propagate untouched.
    Fast,
    /// Invoke listeners in order inside `catch_unwind`, consulting the handler on panic.
    Handling(Arc<dyn ListenerExceptionHandler>),
}

impl EventDispatcher {
    /// Builds a [`EventDispatcher::Handling`] around `handler`.
    pub fn handling(handler: impl ListenerExceptionHandler + 'static) -> Self {
        EventDispatcher::Handling(Arc::new(handler))
    }

    /// Invokes `listeners` in order with `event`.
    pub fn dispatch(&self, event: &EventRef<'_>, listeners: &[ListenerRef]) {
        match self {
            EventDispatcher::Fast => {
                for listener in listeners {
                    listener.accept(event);
                }
            }
            EventDispatcher::Handling(handler) => {
                let mut current = 0;
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    for (idx, listener) in listeners.iter().enumerate() {
                        current = idx;
                        listener.accept(event);
                    }
                }));
                let Err(payload) = outcome else {
                    return;
                };

                let panic = ListenerPanic::new(payload);
                let Some(listener) = listeners.get(current) else {
                    resume_unwind(panic.into_payload());
                };
                if handler.handle(event, listener, &panic) {
                    resume_unwind(panic.into_payload());
                }
                trace!(
                    event_type = event.event_type().name(),
                    skipped = listeners.len() - current - 1,
                    "listener panic swallowed"
                );
            }
        }
    }

    /// Returns `true` for the handling variant.
    #[inline]
    pub fn is_handling(&self) -> bool {
        matches!(self, EventDispatcher::Handling(_))
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDispatcher::Fast => f.write_str("Fast"),
            EventDispatcher::Handling(h) => f.debug_tuple("Handling").field(&h.name()).finish(),
        }
    }
}
