//! Gatewarden: an HTTP reverse-proxy gateway with credential resolution.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  GATEWAY                     │
//!                         │                                              │
//!   Client Request        │  ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!   ──────────────────────┼─▶│  http  │──▶│ routing  │──▶│ capability│  │
//!                         │  │ server │   │ registry │   │   chain   │  │
//!                         │  └────────┘   └──────────┘   └─────┬─────┘  │
//!                         │                                    │        │
//!                         │                                    ▼        │
//!   Client Response       │  ┌────────┐                 ┌───────────┐   │
//!   ◀─────────────────────┼──│envelope│◀────────────────│ dispatch  │◀──┼── Backend
//!                         │  └────────┘                 │ (forward) │   │
//!                         │                             └───────────┘   │
//!                         │                                              │
//!                         │  ┌────────────────────────────────────────┐  │
//!                         │  │          Cross-Cutting Concerns        │  │
//!                         │  │  ┌────────┐ ┌──────┐ ┌──────────────┐  │  │
//!                         │  │  │ config │ │ auth │ │observability │  │  │
//!                         │  │  └────────┘ └──────┘ └──────────────┘  │  │
//!                         │  └────────────────────────────────────────┘  │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! Inbound requests are matched against the immutable route registry
//! (hostname filter first, then the most specific path template), run
//! through each route's ordered capability chain, and forwarded to a
//! randomly chosen backend. The auth subsystem resolves bearer tokens
//! and API keys to user identities through layered TTL caches.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod routing;

// Route behavior
pub mod capability;

// Cross-cutting concerns
pub mod auth;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
