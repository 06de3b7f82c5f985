//! Shell-first streaming of suspense boundaries.
//!
//! This crate turns a running session into a progressively rendered page:
//! - `StreamingSink` - Shell-first byte sink with explicit flushing
//! - `Shell` - Shell template abstraction
//! - `Boundary` - Placeholder, content and error view for one section
//! - `PageStreamer` - Streams a session's transitions as swap chunks
//! - `FlushPolicy` - Explicit flush control

mod boundary;
mod flush;
mod page;
mod shell;
mod sink;
mod swap;

pub use boundary::*;
pub use flush::*;
pub use page::*;
pub use shell::*;
pub use sink::*;
pub use swap::*;
