//! # Listener panic handling.
//!
//! A panic escaping a listener callback is the only listener invocation error. When the bus
//! dispatches through [`EventDispatcher::Handling`](crate::EventDispatcher::Handling), the
//! panic is caught and handed to a [`ListenerExceptionHandler`], which decides whether to
//! resume it on the posting thread.
//!
//! ```text
//! listener panics ──► catch_unwind ──► handler.handle(event, listener, &panic)
//!                                              │
//!                              true ◄──────────┴──────────► false
//!                     resume_unwind(payload)           swallowed, post returns
//! ```
//!
//! Either way the listeners after the panicking one (in the same collection) are skipped.

use std::any::{type_name, Any};
use std::fmt;

use tracing::error;

use crate::events::EventRef;
use crate::listeners::Listener;

/// A caught listener panic.
pub struct ListenerPanic {
    payload: Box<dyn Any + Send + 'static>,
}

impl ListenerPanic {
    pub(crate) fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self { payload }
    }

    /// The panic message, if the payload is a `&str` or `String`; otherwise `"unknown panic"`.
    pub fn message(&self) -> &str {
        if let Some(msg) = self.payload.downcast_ref::<&'static str>() {
            *msg
        } else if let Some(msg) = self.payload.downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        }
    }

    /// The raw payload.
    pub fn payload(&self) -> &(dyn Any + Send) {
        self.payload.as_ref()
    }

    /// Consumes the panic, returning the payload (for `resume_unwind`).
    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }
}

impl fmt::Debug for ListenerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerPanic")
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for ListenerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Decides what happens to a panic caught during dispatch.
///
/// Return `true` to resume the panic on the posting thread, `false` to swallow it.
/// The handler runs on the posting thread, inside `post`.
///
/// Implemented for any `Fn(&EventRef, &Listener, &ListenerPanic) -> bool + Send + Sync`.
pub trait ListenerExceptionHandler: Send + Sync {
    /// Handles a panic raised by `listener` while receiving `event`.
    fn handle(&self, event: &EventRef<'_>, listener: &Listener, panic: &ListenerPanic) -> bool;

    /// Handler name (for logs).
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<F> ListenerExceptionHandler for F
where
    F: Fn(&EventRef<'_>, &Listener, &ListenerPanic) -> bool + Send + Sync,
{
    fn handle(&self, event: &EventRef<'_>, listener: &Listener, panic: &ListenerPanic) -> bool {
        self(event, listener, panic)
    }
}

/// Logs the panic at `error` level and resumes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionHandler;

impl ListenerExceptionHandler for DefaultExceptionHandler {
    fn handle(&self, event: &EventRef<'_>, listener: &Listener, panic: &ListenerPanic) -> bool {
        error!(
            event_type = event.event_type().name(),
            listener = %listener,
            priority = listener.priority(),
            panic = panic.message(),
            "listener panicked while handling event"
        );
        true
    }

    fn name(&self) -> &'static str {
        "default"
    }
}
