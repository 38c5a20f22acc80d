//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware, shutdown)
//!     → handlers.rs (/register, /authenticate)
//!     → dispatch (everything else: the catch-all proxy)
//!     → response.rs (envelope for non-proxied answers)
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::ApiResponse;
pub use server::{AppState, GatewayServer};
