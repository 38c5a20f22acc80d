//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; request IDs flow through the
//!   middleware stack
//! - Metrics are cheap counter increments, exported via an optional
//!   Prometheus endpoint

pub mod logging;
pub mod metrics;
