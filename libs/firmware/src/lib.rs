//! Firmware manager (C8 §4.8).
//!
//! Computes per-component firmware state, orders a batch update plan
//! (BMC → BIOS → UEFI → NIC → STORAGE → CPLD, then by priority), and walks
//! it through a [`FirmwareComponentHandler`] — real by default, with an
//! explicit simulated handler for dry-run mode and tests.

pub mod errors;
pub mod handler;
pub mod manager;
pub mod plan;
pub mod state;

pub use errors::FirmwareError;
pub use handler::{FirmwareComponentHandler, RealFirmwareHandler, SimulatedFirmwareHandler};
pub use manager::{compute_states, default_estimated_time, default_priority, execute_plan, requires_reboot, FirmwareBatchResult};
pub use plan::{build_plan, failure_aborts_batch};
pub use state::{FirmwareComponentState, FirmwareUpdateResult};
