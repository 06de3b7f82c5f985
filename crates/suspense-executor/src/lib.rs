//! Eager, per-section streaming fetch coordination.
//!
//! This crate lets independent sections resolve into a partially
//! streamed page:
//! - `StreamingFetchCoordinator` - Launches every producer at session start
//! - `SessionHandle` - Per-section status, subscriptions and manual retry
//! - `Transition` - One Pending -> Ready/Failed event

mod coordinator;
mod section;
mod session;

pub use coordinator::*;
pub use section::*;
pub use session::*;
