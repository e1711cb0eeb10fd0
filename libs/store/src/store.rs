//! The persistent store (C1): servers, power-state history, and workflow
//! history, backed by a single SQLite file.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use provisioner_domain::{ServerField, ServerId, ServerRecord, WorkflowId, WorkflowRecord, WorkflowStatus};

use crate::errors::{
    EnsureServerError, GetServerError, ListServersError, RecordWorkflowEndError,
    RecordWorkflowStartError, UpdateServerError, UpdateWorkflowProgressError,
};

/// Handle to the orchestrator's persistent store. Cheap to clone: wraps a
/// connection pool, which is itself an `Arc` internally.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent row creation. Returns the (possibly pre-existing) record.
    pub async fn ensure_server(&self, id: &ServerId) -> Result<ServerRecord, EnsureServerError> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO servers (server_id, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(server_id) DO NOTHING",
        )
        .bind(id.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(EnsureServerError::Database)?;

        self.get_server(id)
            .await
            .map_err(|e| match e {
                GetServerError::Database(source) => EnsureServerError::Database(source),
            })?
            .ok_or_else(|| {
                // ensure_server just inserted (or found) the row; a missing
                // record here means a concurrent deletion raced us, which
                // the engine never performs, so this branch is unreachable
                // in practice. Surface it as a database error rather than
                // panicking.
                EnsureServerError::Database(sqlx::Error::RowNotFound)
            })
    }

    /// Single-field update. Unknown field names are tolerated and ignored
    /// for forward compatibility with newer step code.
    pub async fn update_server(
        &self,
        id: &ServerId,
        field: &str,
        value: &Value,
    ) -> Result<(), UpdateServerError> {
        let Some(field) = ServerField::parse(field) else {
            warn!(server_id = %id, field, "ignoring update to unknown server field");
            return Ok(());
        };

        let column = field.column_name();
        let sql = format!("UPDATE servers SET {column} = ?1 WHERE server_id = ?2");

        let query = sqlx::query(&sql).bind(value_to_sql(value)).bind(id.as_str());

        let result = query.execute(&self.pool).await.map_err(UpdateServerError::Database)?;

        if result.rows_affected() == 0 {
            return Err(UpdateServerError::NotFound(id.clone()));
        }

        Ok(())
    }

    pub async fn get_server(&self, id: &ServerId) -> Result<Option<ServerRecord>, GetServerError> {
        let row = sqlx::query(
            "SELECT server_id, status_name, is_ready, server_model, ip_address, ip_address_works,
                    ipmi_address, ipmi_address_works, kcs_status, host_interface_status,
                    ipmi_username, ipmi_password_set, bios_password_set, redfish_available,
                    created_at, updated_at, last_seen, cpu_model, memory_gb, storage_info,
                    network_interfaces, firmware_version, rack_location, tags, power_state,
                    last_power_change, device_type, server_type, commissioning_status,
                    workflow_id, workflow_status, last_workflow_run, bios_config_applied,
                    bios_config_version, ipmi_configured, ssh_accessible, hardware_validated,
                    provisioning_target, assigned_role, deployment_status, notes
             FROM servers WHERE server_id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(GetServerError::Database)?;

        Ok(row.map(|r| row_to_server(&r)))
    }

    /// Used by batch tooling to find servers whose in-band IP currently
    /// responds.
    pub async fn list_servers_with_working_ip(&self) -> Result<Vec<ServerRecord>, ListServersError> {
        let rows = sqlx::query(
            "SELECT server_id, status_name, is_ready, server_model, ip_address, ip_address_works,
                    ipmi_address, ipmi_address_works, kcs_status, host_interface_status,
                    ipmi_username, ipmi_password_set, bios_password_set, redfish_available,
                    created_at, updated_at, last_seen, cpu_model, memory_gb, storage_info,
                    network_interfaces, firmware_version, rack_location, tags, power_state,
                    last_power_change, device_type, server_type, commissioning_status,
                    workflow_id, workflow_status, last_workflow_run, bios_config_applied,
                    bios_config_version, ipmi_configured, ssh_accessible, hardware_validated,
                    provisioning_target, assigned_role, deployment_status, notes
             FROM servers WHERE ip_address_works = 1",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ListServersError::Database)?;

        Ok(rows.iter().map(row_to_server).collect())
    }

    /// Used by the background worker to pick up provisioning work. A server
    /// is queued once an operator sets `provisioning_target` and
    /// `device_type`; it drops out of the queue the moment a workflow is
    /// running against it or has already finished, so the worker never has
    /// to deduplicate in-memory (§5: "operators are expected to schedule at
    /// most one provisioning per server").
    pub async fn list_servers_queued_for_provisioning(&self) -> Result<Vec<ServerRecord>, ListServersError> {
        let rows = sqlx::query(
            "SELECT server_id, status_name, is_ready, server_model, ip_address, ip_address_works,
                    ipmi_address, ipmi_address_works, kcs_status, host_interface_status,
                    ipmi_username, ipmi_password_set, bios_password_set, redfish_available,
                    created_at, updated_at, last_seen, cpu_model, memory_gb, storage_info,
                    network_interfaces, firmware_version, rack_location, tags, power_state,
                    last_power_change, device_type, server_type, commissioning_status,
                    workflow_id, workflow_status, last_workflow_run, bios_config_applied,
                    bios_config_version, ipmi_configured, ssh_accessible, hardware_validated,
                    provisioning_target, assigned_role, deployment_status, notes
             FROM servers
             WHERE provisioning_target IS NOT NULL
               AND device_type IS NOT NULL
               AND workflow_status IS NULL
             ORDER BY updated_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ListServersError::Database)?;

        Ok(rows.iter().map(row_to_server).collect())
    }

    pub async fn record_workflow_start(
        &self,
        workflow_id: &WorkflowId,
        server_id: &ServerId,
        device_type: &str,
        total_steps: u32,
    ) -> Result<(), RecordWorkflowStartError> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO workflow_history
                (workflow_id, server_id, device_type, status, started_at, total_steps, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(workflow_id.to_string())
        .bind(server_id.as_str())
        .bind(device_type)
        .bind(WorkflowStatus::Running.to_string())
        .bind(now.to_rfc3339())
        .bind(total_steps)
        .bind("{}")
        .execute(&self.pool)
        .await
        .map_err(RecordWorkflowStartError::Database)?;

        sqlx::query("UPDATE servers SET workflow_id = ?1, workflow_status = ?2 WHERE server_id = ?3")
            .bind(workflow_id.to_string())
            .bind(WorkflowStatus::Running.to_string())
            .bind(server_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(RecordWorkflowStartError::Database)?;

        Ok(())
    }

    pub async fn update_workflow_progress(
        &self,
        workflow_id: &WorkflowId,
        steps_completed: u32,
    ) -> Result<(), UpdateWorkflowProgressError> {
        let result = sqlx::query(
            "UPDATE workflow_history SET steps_completed = ?1 WHERE workflow_id = ?2",
        )
        .bind(steps_completed)
        .bind(workflow_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(UpdateWorkflowProgressError::Database)?;

        if result.rows_affected() == 0 {
            return Err(UpdateWorkflowProgressError::NotFound(workflow_id.to_string()));
        }

        Ok(())
    }

    /// Persist `steps_completed` and the `{sub_tasks, errors, data}`
    /// metadata blob together, at every step boundary (C10 §4.10 step h).
    pub async fn update_workflow_progress_with_metadata(
        &self,
        workflow_id: &WorkflowId,
        steps_completed: u32,
        metadata: &Value,
    ) -> Result<(), UpdateWorkflowProgressError> {
        let metadata_str = serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string());

        let result = sqlx::query(
            "UPDATE workflow_history SET steps_completed = ?1, metadata = ?2 WHERE workflow_id = ?3",
        )
        .bind(steps_completed)
        .bind(metadata_str)
        .bind(workflow_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(UpdateWorkflowProgressError::Database)?;

        if result.rows_affected() == 0 {
            return Err(UpdateWorkflowProgressError::NotFound(workflow_id.to_string()));
        }

        Ok(())
    }

    pub async fn record_workflow_end(
        &self,
        workflow_id: &WorkflowId,
        status: WorkflowStatus,
        error: Option<&str>,
    ) -> Result<(), RecordWorkflowEndError> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE workflow_history
             SET status = ?1, completed_at = ?2, error_message = ?3
             WHERE workflow_id = ?4",
        )
        .bind(status.to_string())
        .bind(now.to_rfc3339())
        .bind(error)
        .bind(workflow_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(RecordWorkflowEndError::Database)?;

        if result.rows_affected() == 0 {
            return Err(RecordWorkflowEndError::NotFound(workflow_id.to_string()));
        }

        sqlx::query("UPDATE servers SET workflow_status = ?1, last_workflow_run = ?2 WHERE workflow_id = ?3")
            .bind(status.to_string())
            .bind(now.to_rfc3339())
            .bind(workflow_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(RecordWorkflowEndError::Database)?;

        Ok(())
    }

    /// Append a power-state transition. Logged and swallowed on failure by
    /// callers per the non-fatal persistence policy (§4.1); the method
    /// itself still reports the error so callers can choose.
    pub async fn record_power_state_change(
        &self,
        server_id: &ServerId,
        old_state: Option<&str>,
        new_state: &str,
        changed_by: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO power_state_history (server_id, old_state, new_state, changed_at, changed_by)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(server_id.as_str())
        .bind(old_state)
        .bind(new_state)
        .bind(now.to_rfc3339())
        .bind(changed_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch workflow history rows for a server, most recent first. Used
    /// by boarding validation and operator tooling; not part of the core
    /// step-mutation path.
    pub async fn workflow_history_for_server(
        &self,
        server_id: &ServerId,
    ) -> Result<Vec<WorkflowRecord>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, workflow_id, server_id, device_type, status, started_at, completed_at,
                    steps_completed, total_steps, error_message, metadata
             FROM workflow_history WHERE server_id = ?1 ORDER BY started_at DESC",
        )
        .bind(server_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_workflow).collect())
    }
}

fn value_to_sql(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn row_to_server(row: &sqlx::sqlite::SqliteRow) -> ServerRecord {
    ServerRecord {
        server_id: ServerId::new(row.get::<String, _>("server_id")),
        status_name: row.get("status_name"),
        is_ready: row.get("is_ready"),
        server_model: row.get("server_model"),
        ip_address: row.get("ip_address"),
        ip_address_works: row.get("ip_address_works"),
        ipmi_address: row.get("ipmi_address"),
        ipmi_address_works: row.get("ipmi_address_works"),
        kcs_status: row.get("kcs_status"),
        host_interface_status: row.get("host_interface_status"),
        ipmi_username: row.get("ipmi_username"),
        ipmi_password_set: row.get("ipmi_password_set"),
        bios_password_set: row.get("bios_password_set"),
        redfish_available: row.get("redfish_available"),
        created_at: parse_timestamp(row.get("created_at")),
        updated_at: parse_timestamp(row.get("updated_at")),
        last_seen: row.get::<Option<String>, _>("last_seen").map(|s| parse_timestamp(s)),
        cpu_model: row.get("cpu_model"),
        memory_gb: row.get("memory_gb"),
        storage_info: row.get("storage_info"),
        network_interfaces: row.get("network_interfaces"),
        firmware_version: row.get("firmware_version"),
        rack_location: row.get("rack_location"),
        tags: row.get("tags"),
        power_state: row.get("power_state"),
        last_power_change: row
            .get::<Option<String>, _>("last_power_change")
            .map(|s| parse_timestamp(s)),
        device_type: row.get("device_type"),
        server_type: row.get("server_type"),
        commissioning_status: row.get("commissioning_status"),
        workflow_id: row.get("workflow_id"),
        workflow_status: row.get("workflow_status"),
        last_workflow_run: row
            .get::<Option<String>, _>("last_workflow_run")
            .map(|s| parse_timestamp(s)),
        bios_config_applied: row.get("bios_config_applied"),
        bios_config_version: row.get("bios_config_version"),
        ipmi_configured: row.get("ipmi_configured"),
        ssh_accessible: row.get("ssh_accessible"),
        hardware_validated: row.get("hardware_validated"),
        provisioning_target: row.get("provisioning_target"),
        assigned_role: row.get("assigned_role"),
        deployment_status: row.get("deployment_status"),
        notes: row.get("notes"),
    }
}

fn row_to_workflow(row: &sqlx::sqlite::SqliteRow) -> WorkflowRecord {
    let status_str: String = row.get("status");
    let status = match status_str.as_str() {
        "pending" => WorkflowStatus::Pending,
        "running" => WorkflowStatus::Running,
        "success" => WorkflowStatus::Success,
        "failed" => WorkflowStatus::Failed,
        _ => WorkflowStatus::Cancelled,
    };

    let metadata_str: String = row.get("metadata");
    let metadata = serde_json::from_str(&metadata_str).unwrap_or(Value::Null);

    WorkflowRecord {
        id: row.get("id"),
        workflow_id: row
            .get::<String, _>("workflow_id")
            .parse()
            .unwrap_or_else(|_| WorkflowId::new()),
        server_id: ServerId::new(row.get::<String, _>("server_id")),
        device_type: row.get("device_type"),
        status,
        started_at: parse_timestamp(row.get("started_at")),
        completed_at: row
            .get::<Option<String>, _>("completed_at")
            .map(|s| parse_timestamp(s)),
        steps_completed: row.get::<i64, _>("steps_completed") as u32,
        total_steps: row.get::<i64, _>("total_steps") as u32,
        error_message: row.get("error_message"),
        metadata,
    }
}

fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> Store {
        let pool = crate::pool::open(":memory:").await.expect("open in-memory store");
        Store::new(pool)
    }

    #[tokio::test]
    async fn ensure_server_is_idempotent() {
        let store = test_store().await;
        let id = ServerId::new("abc12");

        let first = store.ensure_server(&id).await.unwrap();
        let second = store.ensure_server(&id).await.unwrap();

        assert_eq!(first.server_id, second.server_id);
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn update_unknown_field_is_ignored() {
        let store = test_store().await;
        let id = ServerId::new("abc12");
        store.ensure_server(&id).await.unwrap();

        let result = store
            .update_server(&id, "not_a_real_field", &Value::String("x".into()))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn update_unknown_server_errors() {
        let store = test_store().await;
        let result = store
            .update_server(&ServerId::new("missing"), "ip_address", &Value::String("10.0.0.1".into()))
            .await;
        assert!(matches!(result, Err(UpdateServerError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_server_roundtrips_value() {
        let store = test_store().await;
        let id = ServerId::new("abc12");
        store.ensure_server(&id).await.unwrap();

        store
            .update_server(&id, "ip_address", &Value::String("10.0.0.5".into()))
            .await
            .unwrap();
        store
            .update_server(&id, "ip_address_works", &Value::Bool(true))
            .await
            .unwrap();

        let record = store.get_server(&id).await.unwrap().unwrap();
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.5"));
        assert!(record.ip_address_works);
    }

    #[tokio::test]
    async fn list_servers_with_working_ip_filters() {
        let store = test_store().await;
        let ready = ServerId::new("ready1");
        let unready = ServerId::new("unready1");
        store.ensure_server(&ready).await.unwrap();
        store.ensure_server(&unready).await.unwrap();
        store
            .update_server(&ready, "ip_address_works", &Value::Bool(true))
            .await
            .unwrap();

        let working = store.list_servers_with_working_ip().await.unwrap();
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].server_id, ready);
    }

    #[tokio::test]
    async fn workflow_lifecycle_round_trips() {
        let store = test_store().await;
        let server_id = ServerId::new("abc12");
        store.ensure_server(&server_id).await.unwrap();

        let workflow_id = WorkflowId::new();
        store
            .record_workflow_start(&workflow_id, &server_id, "s2.c2.large", 7)
            .await
            .unwrap();

        store.update_workflow_progress(&workflow_id, 3).await.unwrap();
        store
            .record_workflow_end(&workflow_id, WorkflowStatus::Success, None)
            .await
            .unwrap();

        let history = store.workflow_history_for_server(&server_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, WorkflowStatus::Success);
        assert_eq!(history[0].steps_completed, 3);

        let server = store.get_server(&server_id).await.unwrap().unwrap();
        assert_eq!(server.workflow_status.as_deref(), Some("success"));
    }

    #[tokio::test]
    async fn update_progress_on_missing_workflow_errors() {
        let store = test_store().await;
        let result = store.update_workflow_progress(&WorkflowId::new(), 1).await;
        assert!(matches!(result, Err(UpdateWorkflowProgressError::NotFound(_))));
    }
}
