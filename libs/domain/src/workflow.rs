//! Workflow record domain type (C1/C9/C10).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::WorkflowStatus;
use crate::ids::{ServerId, WorkflowId};

/// A row of `workflow_history`, the durable record of one commissioning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: i64,
    pub workflow_id: WorkflowId,
    pub server_id: ServerId,
    pub device_type: String,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps_completed: u32,
    pub total_steps: u32,
    pub error_message: Option<String>,
    /// Canonical shape: `{ "sub_tasks": [...], "errors": [...], "data": {...} }`.
    pub metadata: Value,
}

/// Progress metadata blob shape, serialized into [`WorkflowRecord::metadata`]
/// at every step boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    #[serde(default)]
    pub sub_tasks: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
}

impl WorkflowMetadata {
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// A progress event emitted to the caller-supplied callback on every
/// step transition (C10 §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub workflow_id: WorkflowId,
    pub step_index: u32,
    pub total_steps: u32,
    pub step_name: String,
    pub status: crate::enums::StepStatus,
    pub sub_task: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_roundtrips_through_json() {
        let mut meta = WorkflowMetadata::default();
        meta.sub_tasks.push("commissioning started".to_string());
        meta.errors.push("timeout on step 2".to_string());
        let value = meta.to_value();
        let restored = WorkflowMetadata::from_value(&value);
        assert_eq!(meta, restored);
    }

    #[test]
    fn metadata_defaults_on_empty_object() {
        let restored = WorkflowMetadata::from_value(&Value::Object(serde_json::Map::new()));
        assert!(restored.sub_tasks.is_empty());
        assert!(restored.errors.is_empty());
    }
}
