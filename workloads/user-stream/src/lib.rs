//! User profile streaming pages - Reference workload.
//!
//! Demonstrates shell-first streaming with:
//! - Sections launched eagerly and streamed in the order they settle
//! - Per-section placeholders (spinner or skeleton)
//! - Per-section error views with a manual retry
//! - A page controller that starts a fresh session per selected user

mod data;
mod pages;
mod sections;

pub use data::*;
pub use pages::*;
pub use sections::*;

/// Placeholder API used by the live feed.
pub const API_BASE: &str = "https://jsonplaceholder.typicode.com";

/// CSS styles for the user pages.
pub const PAGE_STYLES: &str = r#"
* { box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 2rem 1rem; background: #f3f4f6; color: #1f2937; }
.page { max-width: 56rem; margin: 0 auto; }
h1 { font-size: 1.875rem; text-align: center; margin-bottom: 2rem; }
.intro { color: #4b5563; }
.sections { display: grid; gap: 1.5rem; }
.page--live-feed .sections { grid-template-columns: repeat(auto-fit, minmax(20rem, 1fr)); }

/* Cards */
.card { background: white; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); padding: 1.5rem; }
.profile-card { display: flex; align-items: center; gap: 1rem; }
.avatar { width: 4rem; height: 4rem; border-radius: 50%; }
.profile-name { margin: 0; font-size: 1.25rem; }
.profile-email, .profile-joined { margin: 0.25rem 0 0 0; color: #4b5563; }
.profile-joined { font-size: 0.875rem; color: #6b7280; }
.post { border-bottom: 1px solid #e5e7eb; padding-bottom: 1rem; margin-bottom: 1rem; }
.post:last-child { border-bottom: none; margin-bottom: 0; }
.post time { font-size: 0.75rem; color: #6b7280; }
.comment { background: #f9fafb; padding: 0.75rem; border-radius: 4px; margin-bottom: 0.75rem; }
.comment-author { color: #6b7280; font-size: 0.875rem; }

/* User switcher */
.user-buttons { display: flex; gap: 0.5rem; justify-content: center; margin: 1rem 0; }
.user-button { padding: 0.5rem 1rem; border-radius: 4px; background: #e5e7eb; color: #374151; text-decoration: none; }
.user-button--active { background: #2563eb; color: white; }

/* Loading states */
.loading { display: flex; align-items: center; justify-content: center; padding: 2rem; color: #4b5563; }
.spinner { width: 2rem; height: 2rem; border-radius: 50%; border-bottom: 2px solid #2563eb; animation: spin 1s linear infinite; margin-right: 0.75rem; }
@keyframes spin { to { transform: rotate(360deg); } }
.skeleton { background: #e5e7eb; border-radius: 8px; padding: 1.5rem; animation: pulse 2s ease-in-out infinite; }
.skeleton-head { display: flex; gap: 1rem; align-items: center; margin-bottom: 1rem; }
.skeleton .circle { width: 4rem; height: 4rem; border-radius: 50%; background: #d1d5db; }
.skeleton .bar { height: 0.75rem; background: #d1d5db; border-radius: 4px; margin-bottom: 0.5rem; }
.w-24 { width: 6rem; } .w-3-4 { width: 75%; } .w-full { width: 100%; } .w-1-4 { width: 25%; }
@keyframes pulse { 50% { opacity: 0.5; } }

/* Error state */
.card--error { background: #fef2f2; border: 1px solid #fecaca; }
.card--error h3 { color: #991b1b; margin-top: 0; }
.error-message { color: #dc2626; }
.btn-retry { margin-top: 0.75rem; padding: 0.5rem 1rem; background: #dc2626; color: white; border: none; border-radius: 4px; cursor: pointer; }

/* Notes */
.notes { margin-top: 2rem; background: #eff6ff; border: 1px solid #bfdbfe; border-radius: 8px; padding: 1.5rem; color: #1d4ed8; font-size: 0.875rem; }
.notes h3 { color: #1e40af; margin-top: 0; }
"#;
