//! Well-known listener priorities.
//!
//! Higher values run first. Any `i64` is a valid priority; these constants just
//! give the common levels names.

/// Runs before everything else at the default levels.
pub const HIGHEST: i64 = 200;
/// Runs before the default level.
pub const HIGH: i64 = 100;
/// The middle level.
pub const MEDIUM: i64 = 0;
/// Runs after the default level.
pub const LOW: i64 = -100;
/// Runs after everything else at the default levels.
pub const LOWEST: i64 = -200;

/// Priority assigned by [`Listener`](crate::Listener) constructors.
pub const DEFAULT: i64 = MEDIUM;
