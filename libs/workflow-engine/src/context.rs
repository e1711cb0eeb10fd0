//! The workflow context (C9 §4.9): the single mutable envelope passed to
//! every step. Owned exclusively by the engine for the duration of
//! `execute` (spec invariant 3/ownership) — steps only ever see it through
//! `&mut WorkflowContext`, never a clone, so "the context is owned by
//! exactly one workflow at a time" is a property of the borrow checker
//! rather than a runtime check.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use provisioner_domain::{CancellationToken, ServerId, StepStatus, WorkflowId};
use provisioner_ipmi::BmcVendor;
use provisioner_ssh::{HardwareFacts, SshSession};

/// Discovered IPMI/BMC facts, populated by the IPMI-configuration stage
/// (C4/C11) once the BMC is reachable.
#[derive(Debug, Clone, Default)]
pub struct IpmiSnapshot {
    pub vendor: Option<BmcVendor>,
    pub reachable: bool,
    pub power_state: Option<String>,
}

/// A progress record delivered to the caller-supplied callback at every
/// step transition and sub-task append (spec §6 "Progress callback").
pub type ProgressCallback = Arc<dyn Fn(provisioner_domain::ProgressEvent) + Send + Sync>;

/// The shared mutable envelope passed to every step (C9 §3 "Workflow
/// context").
pub struct WorkflowContext {
    pub workflow_id: WorkflowId,
    pub server_id: ServerId,
    pub device_type: String,
    pub target_bmc_ip: Option<String>,
    pub gateway: Option<String>,
    pub hardware_facts: Option<HardwareFacts>,
    pub ipmi_snapshot: Option<IpmiSnapshot>,

    ssh: Option<SshSession>,
    data: Map<String, Value>,
    sub_tasks: Vec<String>,
    errors: Vec<String>,

    cancellation: CancellationToken,
    progress: Option<ProgressCallback>,

    total_steps: u32,
    step_index: u32,
    current_step_name: String,
}

impl WorkflowContext {
    #[must_use]
    pub fn new(workflow_id: WorkflowId, server_id: ServerId, device_type: impl Into<String>, total_steps: u32) -> Self {
        Self {
            workflow_id,
            server_id,
            device_type: device_type.into(),
            target_bmc_ip: None,
            gateway: None,
            hardware_facts: None,
            ipmi_snapshot: None,
            ssh: None,
            data: Map::new(),
            sub_tasks: Vec::new(),
            errors: Vec::new(),
            cancellation: CancellationToken::new(),
            progress: None,
            total_steps,
            step_index: 0,
            current_step_name: String::new(),
        }
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub async fn cancellable_sleep(&self, duration: Duration) -> bool {
        self.cancellation.cancellable_sleep(duration).await
    }

    /// Used by [`crate::engine::WorkflowEngine`] to update the position
    /// used in progress events; not a step-facing API.
    pub(crate) fn set_position(&mut self, step_index: u32, step_name: impl Into<String>) {
        self.step_index = step_index;
        self.current_step_name = step_name.into();
    }

    /// Append a sub-task line and notify the progress callback. Sub-tasks
    /// are append-only for the lifetime of the context (spec invariant 6).
    pub fn push_sub_task(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.sub_tasks.push(message.clone());
        self.emit(StepStatus::Running, Some(message), None);
    }

    /// Append an error line. Also append-only; the engine drains this list
    /// into `workflow_history.error_message` at the end of the run.
    pub fn push_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.errors.push(message.clone());
        self.emit(StepStatus::Failed, None, Some(message));
    }

    #[must_use]
    pub fn sub_tasks(&self) -> &[String] {
        &self.sub_tasks
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Merge `data` returned by a successful step into the context's
    /// generic key-value map, per C10 step (d) ("merge `result.data` into
    /// context").
    pub fn merge_data(&mut self, data: Map<String, Value>) {
        self.data.extend(data);
    }

    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    #[must_use]
    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Take ownership of the SSH handle, e.g. so a step can move it into a
    /// helper that needs `&mut SshSession` across an `.await`.
    pub fn take_ssh(&mut self) -> Option<SshSession> {
        self.ssh.take()
    }

    pub fn set_ssh(&mut self, session: SshSession) {
        self.ssh = Some(session);
    }

    pub fn ssh_mut(&mut self) -> Option<&mut SshSession> {
        self.ssh.as_mut()
    }

    /// Release any open SSH session. Always called by the framework's
    /// `cleanup` hook on every exit path (spec §5 "Scoped acquisition is
    /// mandatory").
    pub async fn close_ssh(&mut self) {
        if let Some(session) = self.ssh.take() {
            session.close().await;
        }
    }

    /// Serialize the append-only logs and generic data map into the
    /// canonical `workflow_history.metadata` shape (spec §9 open question:
    /// "the canonical schema for that blob is not enforced").
    #[must_use]
    pub fn metadata(&self) -> Value {
        let metadata = provisioner_domain::WorkflowMetadata {
            sub_tasks: self.sub_tasks.clone(),
            errors: self.errors.clone(),
            data: self.data.clone(),
        };
        metadata.to_value()
    }

    fn emit(&self, status: StepStatus, sub_task: Option<String>, error: Option<String>) {
        if let Some(callback) = &self.progress {
            callback(provisioner_domain::ProgressEvent {
                workflow_id: self.workflow_id,
                step_index: self.step_index,
                total_steps: self.total_steps,
                step_name: self.current_step_name.clone(),
                status,
                sub_task,
                error,
            });
        }
    }

    /// Emitted by the engine itself at every step transition (running /
    /// success / failed / skipped), distinct from the sub-task/error
    /// variants above which steps raise directly.
    pub(crate) fn emit_transition(&self, status: StepStatus) {
        self.emit(status, None, None);
    }
}

/// Convenience used by steps building a `StepExecutionResult`'s data map
/// from several typed values at once.
#[must_use]
pub fn data_map(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Map<String, Value> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_tasks_and_errors_are_append_only() {
        let mut ctx = WorkflowContext::new(WorkflowId::new(), ServerId::new("abc12"), "s2.c2.large", 5);
        ctx.push_sub_task("starting");
        ctx.push_sub_task("still going");
        ctx.push_error("transient warning");
        assert_eq!(ctx.sub_tasks(), &["starting".to_string(), "still going".to_string()]);
        assert_eq!(ctx.errors(), &["transient warning".to_string()]);
    }

    #[test]
    fn merge_data_accumulates_across_steps() {
        let mut ctx = WorkflowContext::new(WorkflowId::new(), ServerId::new("abc12"), "s2.c2.large", 5);
        ctx.merge_data(data_map([("vendor", Value::String("supermicro".into()))]));
        ctx.merge_data(data_map([("confidence", Value::from(0.9))]));
        assert_eq!(ctx.get_data("vendor"), Some(&Value::String("supermicro".into())));
        assert_eq!(ctx.get_data("confidence"), Some(&Value::from(0.9)));
    }

    #[tokio::test]
    async fn cancellation_interrupts_sleep_immediately() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancellable_sleep(Duration::from_secs(60)).await });
        tokio::task::yield_now().await;
        token.cancel();
        let cancelled = handle.await.unwrap();
        assert!(cancelled);
    }

    #[tokio::test]
    async fn uncancelled_sleep_runs_to_completion() {
        let token = CancellationToken::new();
        let cancelled = token.cancellable_sleep(Duration::from_millis(5)).await;
        assert!(!cancelled);
    }
}
