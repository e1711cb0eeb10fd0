//! Catalog loading/lookup errors (C2).

use thiserror::Error;

/// Raised when loading the catalog document fails outright. Per spec §4.2,
/// a missing file is tolerated by the legacy adapters (they return empty
/// views), but a malformed document always raises so the caller can decide
/// whether to halt startup.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog file at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog document at {path} is malformed")]
    Malformed {
        path: String,
        #[source]
        source: serde_yml::Error,
    },
    #[error("device type '{device_type}' in {vendor}/{motherboard} has an invalid CPU model regex")]
    InvalidRegex {
        vendor: String,
        motherboard: String,
        device_type: String,
        #[source]
        source: regex::Error,
    },
    #[error("device type id '{0}' is declared more than once across (vendor, motherboard) pairs")]
    DuplicateDeviceTypeId(String),
}
