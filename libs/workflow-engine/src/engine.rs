//! The workflow engine (C10 §4.10): drives an ordered list of [`Step`]s
//! over one [`WorkflowContext`], persisting progress through
//! [`provisioner_store::Store`] as it goes.

use std::time::Duration;

use provisioner_domain::{StepStatus, WorkflowStatus};
use provisioner_store::Store;
use tracing::{info, warn};

use crate::context::WorkflowContext;
use crate::errors::WorkflowError;
use crate::step::{Step, StepOutcome};

/// Outcome of a full `execute` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// An ordered, named list of steps executed by [`WorkflowEngine::execute`].
/// Step names must be unique — `next_step` jumps address a step by name.
pub struct WorkflowEngine {
    steps: Vec<Box<dyn Step>>,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name() == name)
    }

    /// Run every step in order, persisting start/progress/end through
    /// `store`. Mirrors C10 step-by-step:
    /// (a) record start, (b) advance pointer + emit progress,
    /// (c) validate prerequisites, (d) invoke with timeout (and retry, via
    /// the step's own composition), merge data, honor `next_step` as a
    /// forward-only jump, (e) stop on `should_continue == false`,
    /// (f) always run cleanup, (g) persist progress after every step,
    /// (h) set terminal status and record the end once the loop exits.
    pub async fn execute(&self, store: &Store, context: &mut WorkflowContext) -> Result<WorkflowOutcome, WorkflowError> {
        let total_steps = self.steps.len() as u32;

        if let Err(err) = store
            .record_workflow_start(&context.workflow_id, &context.server_id, &context.device_type, total_steps)
            .await
        {
            warn!(workflow_id = %context.workflow_id, error = %err, "failed to record workflow start");
        }

        let mut cursor = 0usize;
        let mut steps_completed = 0u32;
        let mut outcome = WorkflowOutcome::Completed;
        let mut failure_message: Option<String> = None;

        while cursor < self.steps.len() {
            if context.is_cancelled() {
                outcome = WorkflowOutcome::Cancelled;
                failure_message = Some("workflow cancelled".to_string());
                break;
            }

            let step = &self.steps[cursor];
            let name = step.name();
            context.set_position(cursor as u32, name);
            context.emit_transition(StepStatus::Running);

            if !step.validate_prerequisites(context).await {
                let err = WorkflowError::PrerequisitesNotMet { step: name.to_string() };
                context.push_error(err.as_message());
                step.cleanup(context).await;
                outcome = WorkflowOutcome::Failed;
                failure_message = Some(err.as_message());
                break;
            }

            let step_result = tokio::time::timeout(step.timeout(), step.execute(context)).await;

            let result = match step_result {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => {
                    context.push_error(err.as_message());
                    step.cleanup(context).await;
                    outcome = WorkflowOutcome::Failed;
                    failure_message = Some(err.as_message());
                    break;
                }
                Err(_elapsed) => {
                    let err = WorkflowError::StepTimeout { step: name.to_string(), timeout_secs: step.timeout().as_secs() };
                    context.push_error(err.as_message());
                    step.cleanup(context).await;
                    outcome = WorkflowOutcome::Failed;
                    failure_message = Some(err.as_message());
                    break;
                }
            };

            step.cleanup(context).await;

            let status = result.outcome.unwrap_or(StepOutcome::Success).as_step_status();
            context.emit_transition(status);
            context.merge_data(result.data);
            steps_completed += 1;

            if let Err(err) = store
                .update_workflow_progress_with_metadata(&context.workflow_id, steps_completed, &context.metadata())
                .await
            {
                warn!(workflow_id = %context.workflow_id, error = %err, "failed to persist workflow progress");
            }

            if !result.should_continue {
                outcome = WorkflowOutcome::Failed;
                failure_message = result.message;
                break;
            }

            cursor = match result.next_step {
                Some(target) => {
                    let Some(target_index) = self.index_of(&target) else {
                        let err = WorkflowError::ConfigurationValidation(format!("unknown next_step target '{target}'"));
                        context.push_error(err.as_message());
                        outcome = WorkflowOutcome::Failed;
                        failure_message = Some(err.as_message());
                        break;
                    };
                    if target_index <= cursor {
                        // Backward (or self) jumps are ignored, not fatal (spec.md §8
                        // boundary behavior: "a step that sets `next_step` to a past
                        // step name is ignored (no backward jumps)").
                        warn!(step = name, target = %target, "ignoring non-forward next_step jump");
                        cursor + 1
                    } else {
                        target_index
                    }
                }
                None => cursor + 1,
            };
        }

        let terminal_status = match outcome {
            WorkflowOutcome::Completed => WorkflowStatus::Success,
            WorkflowOutcome::Failed => WorkflowStatus::Failed,
            WorkflowOutcome::Cancelled => WorkflowStatus::Cancelled,
        };

        if let Err(err) = store
            .record_workflow_end(&context.workflow_id, terminal_status, failure_message.as_deref())
            .await
        {
            warn!(workflow_id = %context.workflow_id, error = %err, "failed to record workflow end");
        }

        context.close_ssh().await;

        info!(
            workflow_id = %context.workflow_id,
            server_id = %context.server_id,
            status = %terminal_status,
            steps_completed,
            total_steps,
            "workflow finished"
        );

        Ok(outcome)
    }
}

/// Default per-category step timeout used by steps that do not override
/// [`Step::timeout`] (kept here rather than hardcoded per-step so callers
/// configuring a custom step list have one place to look).
#[must_use]
pub fn default_step_timeout() -> Duration {
    Duration::from_secs(300)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use provisioner_domain::{ServerId, WorkflowId};
    use provisioner_store::pool;

    use crate::step::StepExecutionResult;

    use super::*;

    struct Succeeds(&'static str);

    #[async_trait]
    impl Step for Succeeds {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn execute(&self, _context: &mut WorkflowContext) -> Result<StepExecutionResult, WorkflowError> {
            Ok(StepExecutionResult::success())
        }
    }

    struct FailsOutright;

    #[async_trait]
    impl Step for FailsOutright {
        fn name(&self) -> &'static str {
            "fails"
        }

        async fn execute(&self, _context: &mut WorkflowContext) -> Result<StepExecutionResult, WorkflowError> {
            Ok(StepExecutionResult::failure("synthetic failure"))
        }
    }

    struct JumpsTo(&'static str, &'static str);

    #[async_trait]
    impl Step for JumpsTo {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn execute(&self, _context: &mut WorkflowContext) -> Result<StepExecutionResult, WorkflowError> {
            Ok(StepExecutionResult::success().jump_to(self.1))
        }
    }

    async fn test_store() -> Store {
        let pool = pool::open(":memory:").await.expect("open in-memory store");
        Store::new(pool)
    }

    #[tokio::test]
    async fn runs_all_steps_to_completion() {
        let store = test_store().await;
        let server_id = ServerId::new("srv-1");
        store.ensure_server(&server_id).await.expect("ensure server");

        let engine = WorkflowEngine::new(vec![Box::new(Succeeds("one")), Box::new(Succeeds("two"))]);
        let mut ctx = WorkflowContext::new(WorkflowId::new(), server_id, "s2.c2.large", 2);

        let outcome = engine.execute(&store, &mut ctx).await.unwrap();
        assert_eq!(outcome, WorkflowOutcome::Completed);
    }

    #[tokio::test]
    async fn halts_on_step_failure() {
        let store = test_store().await;
        let server_id = ServerId::new("srv-2");
        store.ensure_server(&server_id).await.expect("ensure server");

        let engine = WorkflowEngine::new(vec![Box::new(Succeeds("one")), Box::new(FailsOutright), Box::new(Succeeds("three"))]);
        let mut ctx = WorkflowContext::new(WorkflowId::new(), server_id, "s2.c2.large", 3);

        let outcome = engine.execute(&store, &mut ctx).await.unwrap();
        assert_eq!(outcome, WorkflowOutcome::Failed);
        assert!(ctx.errors().iter().any(|e| e.contains("synthetic failure")));
    }

    #[tokio::test]
    async fn cancellation_before_a_step_halts_the_run() {
        let store = test_store().await;
        let server_id = ServerId::new("srv-3");
        store.ensure_server(&server_id).await.expect("ensure server");

        let engine = WorkflowEngine::new(vec![Box::new(Succeeds("one")), Box::new(Succeeds("two"))]);
        let mut ctx = WorkflowContext::new(WorkflowId::new(), server_id, "s2.c2.large", 2);
        ctx.cancellation_token().cancel();

        let outcome = engine.execute(&store, &mut ctx).await.unwrap();
        assert_eq!(outcome, WorkflowOutcome::Cancelled);
    }

    #[tokio::test]
    async fn backward_next_step_jump_is_ignored_not_fatal() {
        let store = test_store().await;
        let server_id = ServerId::new("srv-4");
        store.ensure_server(&server_id).await.expect("ensure server");

        // "two" requests a jump back to "one", which has already run; the
        // engine must ignore the jump and continue to "three" rather than
        // fail the workflow (spec.md §8: "A step that sets `next_step` to a
        // past step name is ignored (no backward jumps).").
        let engine = WorkflowEngine::new(vec![
            Box::new(Succeeds("one")),
            Box::new(JumpsTo("two", "one")),
            Box::new(Succeeds("three")),
        ]);
        let mut ctx = WorkflowContext::new(WorkflowId::new(), server_id, "s2.c2.large", 3);

        let outcome = engine.execute(&store, &mut ctx).await.unwrap();
        assert_eq!(outcome, WorkflowOutcome::Completed);
        assert!(ctx.errors().is_empty());
    }
}
