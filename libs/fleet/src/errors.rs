//! Fleet-controller adapter errors (spec §7 `CommissioningError` plus the
//! adapter-level transport taxonomy that feeds it).

use thiserror::Error;

/// Adapter-level failure. Per spec §4.5, network errors never raise into
/// the engine directly — callers translate this into a `StepExecutionResult`
/// or a `CommissioningError` at the step boundary.
#[derive(Debug, Error)]
pub enum FleetAdapterError {
    #[error("request to fleet controller failed")]
    Network(#[source] reqwest::Error),

    #[error("fleet controller returned {status} for {operation}: {body}")]
    Api { operation: String, status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum CommissioningError {
    #[error("commissioning timeout for {server_id}")]
    Timeout { server_id: String },

    #[error("commissioning failed for {server_id}: {reason}")]
    Failed { server_id: String, reason: String },

    /// The wait was cancelled rather than having failed or timed out.
    /// Per spec §7 "cancellation is not an error" — callers must not
    /// record this as a workflow failure, only stop waiting.
    #[error("commissioning wait for {server_id} was cancelled")]
    Cancelled { server_id: String },

    #[error(transparent)]
    Adapter(#[from] FleetAdapterError),
}

impl CommissioningError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
