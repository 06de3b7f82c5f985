//! Public SDK for streamed suspense pages.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use suspense_sdk::prelude::*;
//!
//! let coordinator = StreamingFetchCoordinator::new()?;
//! let session = coordinator.start_session(vec![
//!     SectionSpec::new("profile", ready_after(Duration::from_secs(1), profile)),
//!     SectionSpec::new("posts", ready_after(Duration::from_secs(2), posts)),
//! ])?;
//!
//! session.subscribe(|t| println!("{} -> {}", t.section, t.status()));
//!
//! let page = PageStreamer::new("profile", shell)
//!     .with_boundary(Boundary::new("profile", spinner("Loading profile..."), render_profile))
//!     .with_boundary(Boundary::new("posts", spinner("Loading posts..."), render_posts));
//! let report = page.stream(&session, &mut sink).await?;
//! eprintln!("{}", report.metrics.to_summary());
//! ```

pub use suspense_core;
pub use suspense_data;
pub use suspense_executor;
pub use suspense_observability;
pub use suspense_streaming;

/// Prelude for convenient imports.
pub mod prelude {
    pub use suspense_core::*;
    pub use suspense_data::*;
    pub use suspense_executor::*;
    pub use suspense_observability::*;
    pub use suspense_streaming::*;
}
