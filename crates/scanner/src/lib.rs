//! # Scanner Service
//!
//! Orchestration: the periodic scan loop and the sinks it publishes to.

/// Module for the scan loop.
pub mod service;

/// Module for opportunity sinks.
pub mod sinks;

pub use service::ScanService;
pub use sinks::LogSink;
