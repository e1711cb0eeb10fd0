//! Per-operation store errors.

use provisioner_domain::ServerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenStoreError {
    #[error("failed to connect to store at {path}")]
    Connect {
        path: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("migration failed")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum EnsureServerError {
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum UpdateServerError {
    #[error("server not found: {0}")]
    NotFound(ServerId),
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum GetServerError {
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum ListServersError {
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum RecordWorkflowStartError {
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum UpdateWorkflowProgressError {
    #[error("workflow not found: {0}")]
    NotFound(String),
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum RecordWorkflowEndError {
    #[error("workflow not found: {0}")]
    NotFound(String),
    #[error("database error")]
    Database(#[source] sqlx::Error),
}
