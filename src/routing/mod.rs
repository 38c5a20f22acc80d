//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → route.rs (registry lookup: host filter, then first template match)
//!     → template.rs (anchored-prefix evaluation)
//!     → Return: matched Route or no-match
//!
//! Route Compilation (at startup):
//!     RouteEntry[]
//!     → Compile templates and capability chains
//!     → Sort by descending template length
//!     → Freeze as immutable RouteRegistry
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in the hot path
//! - Deterministic: same input always matches the same route
//! - First match wins within the host-filtered, specificity-ordered list

pub mod route;
pub mod template;

pub use route::{Route, RouteRegistry};
pub use template::{clean_path, PathTemplate};
