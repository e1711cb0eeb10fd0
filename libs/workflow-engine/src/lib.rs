//! Workflow context and engine (C9/C10): the generic step-execution
//! framework that the provisioning strategy crate builds stages on top of.

pub mod context;
pub mod engine;
pub mod errors;
pub mod step;

pub use context::{data_map, IpmiSnapshot, ProgressCallback, WorkflowContext};
pub use provisioner_domain::CancellationToken;
pub use engine::{WorkflowEngine, WorkflowOutcome};
pub use errors::WorkflowError;
pub use step::{ConditionalStep, RetryPolicy, RetryableStep, Step, StepExecutionResult, StepOutcome};
