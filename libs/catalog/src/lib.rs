//! Unified device catalog (C2).
//!
//! A tree-structured document rooted at `device_configuration -> vendors ->
//! motherboards -> device_types`, hot-reloaded on mtime change and
//! memoized between accesses. [`legacy`] projects the same snapshot into
//! two backward-compatible shapes consumed by older tooling.

pub mod document;
pub mod errors;
pub mod legacy;
pub mod loader;
pub mod snapshot;

pub use errors::CatalogLoadError;
pub use legacy::{DeviceMapping, DeviceMappingsView, FirmwareRepositoryView};
pub use loader::Catalog;
pub use snapshot::CatalogSnapshot;
