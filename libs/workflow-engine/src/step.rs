//! The step contract (C9 §4.9 "Step framework").
//!
//! A workflow is an ordered list of `Box<dyn Step>`. Every step sees the
//! same three framework hooks in the same order — `validate_prerequisites`,
//! `execute`, `cleanup` — regardless of whether it happens to retry or be
//! conditionally skippable, which is why those two variations are modeled
//! as composition (`RetryableStep`, `ConditionalStep`) over the one `Step`
//! trait rather than as three unrelated traits.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Map;

use provisioner_domain::StepStatus;

use crate::context::WorkflowContext;
use crate::errors::WorkflowError;

/// Outcome of one `Step::execute` call. `status` is restricted to the
/// subset of [`StepStatus`] that makes sense mid-step — `Pending` and
/// `Retrying` are engine-internal bookkeeping states, not something a step
/// reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure,
    Retry,
    Skip,
}

impl StepOutcome {
    #[must_use]
    pub fn as_step_status(self) -> StepStatus {
        match self {
            StepOutcome::Success => StepStatus::Success,
            StepOutcome::Failure | StepOutcome::Retry => StepStatus::Failed,
            StepOutcome::Skip => StepStatus::Skipped,
        }
    }
}

/// The result of running one step. `next_step` is an optional forward jump
/// to a step name other than "the next one in the list" (spec invariant 7:
/// "step transitions only ever move forward"); the engine enforces the
/// forward-only constraint, this type just carries the request.
#[derive(Debug, Clone, Default)]
pub struct StepExecutionResult {
    pub outcome: Option<StepOutcome>,
    pub message: Option<String>,
    pub data: Map<String, serde_json::Value>,
    pub should_continue: bool,
    pub next_step: Option<String>,
}

impl StepExecutionResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            outcome: Some(StepOutcome::Success),
            should_continue: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn success_with_data(data: Map<String, serde_json::Value>) -> Self {
        Self {
            outcome: Some(StepOutcome::Success),
            should_continue: true,
            data,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            outcome: Some(StepOutcome::Failure),
            message: Some(message.into()),
            should_continue: false,
            ..Default::default()
        }
    }

    /// A failure that still lets the engine proceed to the next step
    /// (e.g. a best-effort boarding pre-check), as opposed to [`Self::failure`]
    /// which halts the workflow.
    #[must_use]
    pub fn non_fatal_failure(message: impl Into<String>) -> Self {
        Self {
            outcome: Some(StepOutcome::Failure),
            message: Some(message.into()),
            should_continue: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn skip(message: impl Into<String>) -> Self {
        Self {
            outcome: Some(StepOutcome::Skip),
            message: Some(message.into()),
            should_continue: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn jump_to(mut self, step_name: impl Into<String>) -> Self {
        self.next_step = Some(step_name.into());
        self
    }
}

/// One unit of workflow work. Implementors are free to hold their own
/// collaborator handles (an `IpmiAdapter`, a `FleetClient`) — the context
/// only carries data that crosses step boundaries.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// Per-step timeout, enforced by the engine around `execute`.
    fn timeout(&self) -> Duration {
        Duration::from_secs(300)
    }

    /// Checked by the engine before `execute`; a `false` return becomes
    /// [`WorkflowError::PrerequisitesNotMet`].
    async fn validate_prerequisites(&self, _context: &WorkflowContext) -> bool {
        true
    }

    async fn execute(&self, context: &mut WorkflowContext) -> Result<StepExecutionResult, WorkflowError>;

    /// Always invoked by the engine after `execute`, on every outcome
    /// including timeout and cancellation. Cleanup errors are logged, not
    /// promoted to workflow failures (spec §5 "cleanup never masks or
    /// replaces the original outcome").
    async fn cleanup(&self, _context: &mut WorkflowContext) {}
}

/// Retry policy attached to a step (C9 "Retryable step").
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    /// Exponential backoff: `base_delay * 2^(attempt - 1)`, attempt is
    /// 1-indexed.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// A step that retries its own `execute` on [`StepOutcome::Retry`] up to
/// `retry_policy().max_attempts` times, sleeping
/// `retry_policy().delay_for_attempt(n)` between attempts. Implemented as a
/// thin wrapper so the engine can treat every step uniformly while still
/// letting individual steps opt into retry behavior.
#[async_trait]
pub trait RetryableStep: Send + Sync {
    fn inner(&self) -> &dyn Step;

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

#[async_trait]
impl<T: RetryableStep> Step for T {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn timeout(&self) -> Duration {
        self.inner().timeout()
    }

    async fn validate_prerequisites(&self, context: &WorkflowContext) -> bool {
        self.inner().validate_prerequisites(context).await
    }

    async fn execute(&self, context: &mut WorkflowContext) -> Result<StepExecutionResult, WorkflowError> {
        let policy = self.retry_policy();
        let mut attempt = 1;
        loop {
            let result = self.inner().execute(context).await?;
            let is_retry = result.outcome == Some(StepOutcome::Retry);
            if !is_retry || attempt >= policy.max_attempts {
                return Ok(result);
            }
            context.push_sub_task(format!(
                "{} retry {}/{}: {}",
                self.inner().name(),
                attempt,
                policy.max_attempts,
                result.message.as_deref().unwrap_or("no detail")
            ));
            if context.cancellable_sleep(policy.delay_for_attempt(attempt)).await {
                return Ok(result);
            }
            attempt += 1;
        }
    }

    async fn cleanup(&self, context: &mut WorkflowContext) {
        self.inner().cleanup(context).await;
    }
}

/// A step that is skipped outright when a predicate over the context does
/// not hold, without ever invoking the wrapped step's `execute` (C11
/// "stage skip" — e.g. "skip IPMI configuration when no target BMC IP is
/// known").
pub struct ConditionalStep<P> {
    inner: Box<dyn Step>,
    predicate: P,
    skip_message: &'static str,
}

impl<P> ConditionalStep<P>
where
    P: Fn(&WorkflowContext) -> bool + Send + Sync,
{
    pub fn new(inner: Box<dyn Step>, skip_message: &'static str, predicate: P) -> Self {
        Self { inner, predicate, skip_message }
    }
}

#[async_trait]
impl<P> Step for ConditionalStep<P>
where
    P: Fn(&WorkflowContext) -> bool + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    async fn validate_prerequisites(&self, context: &WorkflowContext) -> bool {
        self.inner.validate_prerequisites(context).await
    }

    async fn execute(&self, context: &mut WorkflowContext) -> Result<StepExecutionResult, WorkflowError> {
        if !(self.predicate)(context) {
            return Ok(StepExecutionResult::skip(self.skip_message));
        }
        self.inner.execute(context).await
    }

    async fn cleanup(&self, context: &mut WorkflowContext) {
        self.inner.cleanup(context).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_backs_off_exponentially() {
        let policy = RetryPolicy::new(4, Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn retry_policy_floors_max_attempts_at_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl Step for AlwaysSucceeds {
        fn name(&self) -> &'static str {
            "always-succeeds"
        }

        async fn execute(&self, _context: &mut WorkflowContext) -> Result<StepExecutionResult, WorkflowError> {
            Ok(StepExecutionResult::success())
        }
    }

    #[tokio::test]
    async fn conditional_step_skips_when_predicate_false() {
        let step = ConditionalStep::new(Box::new(AlwaysSucceeds), "no target BMC IP", |ctx: &WorkflowContext| ctx.target_bmc_ip.is_some());
        let mut ctx = WorkflowContext::new(
            provisioner_domain::WorkflowId::new(),
            provisioner_domain::ServerId::new("abc12"),
            "s2.c2.large",
            1,
        );
        let result = step.execute(&mut ctx).await.unwrap();
        assert_eq!(result.outcome, Some(StepOutcome::Skip));
        assert_eq!(result.message.as_deref(), Some("no target BMC IP"));
    }

    #[tokio::test]
    async fn conditional_step_runs_when_predicate_true() {
        let step = ConditionalStep::new(Box::new(AlwaysSucceeds), "no target BMC IP", |ctx: &WorkflowContext| ctx.target_bmc_ip.is_some());
        let mut ctx = WorkflowContext::new(
            provisioner_domain::WorkflowId::new(),
            provisioner_domain::ServerId::new("abc12"),
            "s2.c2.large",
            1,
        );
        ctx.target_bmc_ip = Some("10.0.0.5".to_string());
        let result = step.execute(&mut ctx).await.unwrap();
        assert_eq!(result.outcome, Some(StepOutcome::Success));
    }
}
