//! Listener invocation and panic policy.
//!
//! - [`EventDispatcher`] runs an ordered listener slice (`Fast` or `Handling`)
//! - [`ListenerExceptionHandler`] decides whether a caught panic is resumed
//! - [`DefaultExceptionHandler`] logs and resumes (used unless the bus opts out)
//! - [`ListenerPanic`] the caught payload with message extraction

mod dispatcher;
mod handler;

pub use dispatcher::EventDispatcher;
pub use handler::{DefaultExceptionHandler, ListenerExceptionHandler, ListenerPanic};
