//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Credential (token | api key | Authorization header value)
//!     → authenticator.rs (scheme split, length disambiguation)
//!     → cache.rs (token→id / key→id / id→identity TTL caches)
//!     → store.rs (find-by-query on miss)
//!     → AuthenticatedUser or None
//!
//! Registration / key issuance:
//!     create_user / issue_api_key
//!     → store.rs (upsert, partial field update)
//!     → cache invalidation for the affected user
//! ```
//!
//! # Design Decisions
//! - Resolution failure is a null identity, never an error
//! - Caches are per-Authenticator state with its lifecycle
//! - The user store is a trait; the document driver stays external

pub mod authenticator;
pub mod cache;
pub mod store;
pub mod user;

pub use authenticator::{Authenticator, API_KEY_LEN};
pub use store::{JsonUserStore, MemoryUserStore, SharedUserStore, StoreError, UserStore};
pub use user::{AuthenticatedUser, UserRecord};
