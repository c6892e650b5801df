//! Observability setup.
//!
//! Provides structured logging through `tracing`; the library emits events
//! and binaries or tests install a subscriber.

pub mod tracing;
