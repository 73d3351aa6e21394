//! Nullable infrastructure for deterministic testing.
//!
//! The Registry is abstracted behind the `VoterRegistry` and `AuthService`
//! traits. This crate provides an implementation that:
//! - Keeps the voter table in memory and answers deterministically
//! - Records every call for assertions
//! - Fails on demand, per operation, with any `ApiError`
//! - Never touches the network
//!
//! Usage: swap `HttpRegistry` for `NullRegistry` in tests. `NullSink`
//! stands in for an import destination the same way.

pub mod clock;
pub mod registry;
pub mod sink;

pub use clock::NullClock;
pub use registry::{Call, NullRegistry, Op};
pub use sink::NullSink;
