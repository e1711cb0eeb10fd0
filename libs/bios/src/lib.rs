//! BIOS configuration adapter (C7 §4.7).
//!
//! Drives Supermicro targets through their `sum` vendor tool over SSH;
//! every other vendor takes a no-op placeholder path that reports the gap
//! instead of failing the workflow.

pub mod document;
pub mod engine;
pub mod errors;
pub mod vendor_tool;

pub use document::{overlay_settings, BiosDocument, SettingDiff};
pub use engine::{run, BiosRunResult};
pub use errors::BiosConfigurationError;
pub use vendor_tool::VendorToolConfig;
