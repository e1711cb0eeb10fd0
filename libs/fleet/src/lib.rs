//! Fleet-controller adapter (C5).
//!
//! Signed HTTP client for the external bare-metal-as-a-service controller:
//! machine listing, commissioning, deployment, release, and status polling.

pub mod client;
pub mod errors;
pub mod models;
pub mod oauth1;

pub use client::{FleetClient, FleetClientConfig};
pub use errors::{CommissioningError, FleetAdapterError};
pub use models::{InterfaceEntry, InterfaceLink, MachineRecord, MachineStatus};
pub use oauth1::OAuth1Credentials;
