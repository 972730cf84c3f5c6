//! Observability for autoscan.
//! `tracing` with an `EnvFilter`, configured level overridable per subsystem.

pub mod metrics;
pub mod setup;

pub use setup::init_tracing;
