//! Section producers and a no-cache JSON fetch client.
//!
//! This crate provides:
//! - `Producer` - The opaque async operation behind a section
//! - `producer_fn` / `Constant` / `Scripted` - Producer adapters
//! - `Delayed` - Simulated network latency
//! - `FetchClient` - JSON GET with no-cache semantics

mod client;
mod delay;
mod producer;

pub use client::*;
pub use delay::*;
pub use producer::*;
