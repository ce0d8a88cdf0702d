//! Observability setup for Nebulus.
//!
//! Logging is the only diagnostic channel of the memory subsystem; this
//! crate owns the subscriber so binaries and test harnesses initialize it
//! the same way.

pub mod tracing_setup;
