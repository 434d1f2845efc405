//! The broadcast orchestrator, worker pool, configuration loading, and
//! inbound HTTP handler that sit on top of the `broadcast-*` crates.

pub mod config;
pub mod handler;
pub mod orchestrator;
pub mod pool;

pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
