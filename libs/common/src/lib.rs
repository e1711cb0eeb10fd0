//! Common utilities for the provisioning orchestrator
//!
//! Provides shared configuration loading, error handling, and telemetry
//! initialization used by every binary and most library crates.

pub mod config;
pub mod runtime;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use runtime::{build_stage_runtime, BootstrapError};
pub use telemetry::init_tracing;
