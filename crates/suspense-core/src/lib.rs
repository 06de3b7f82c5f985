//! Core types for streamed suspense sessions.
//!
//! This crate provides the vocabulary shared by every other crate:
//! - `SectionId` / `SessionId` - Identifiers
//! - `SectionStatus` - Pending, Ready or Failed
//! - `ProducerError` / `CoordinatorError` / `StreamError` - Error taxonomy
//! - `LifecyclePhase` / `TimingContext` - Session lifecycle tracking

mod error;
mod ids;
mod lifecycle;
mod status;

pub use error::*;
pub use ids::*;
pub use lifecycle::*;
pub use status::*;
