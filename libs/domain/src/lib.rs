//! Provisioner domain - core domain models and types
//!
//! Shared entity types, enums, and identifiers used throughout the
//! bare-metal provisioning orchestrator: the store (C1), catalog (C2),
//! workflow engine (C9/C10/C11), and boarding validator (C12) all build
//! on these types rather than defining their own.

pub mod cancellation;
pub mod device_type;
pub mod enums;
pub mod ids;
pub mod server;
pub mod validation;
pub mod workflow;

pub use cancellation::CancellationToken;
pub use device_type::*;
pub use enums::*;
pub use ids::*;
pub use server::*;
pub use validation::*;
pub use workflow::*;
