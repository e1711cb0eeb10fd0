//! Store connection bootstrap.
//!
//! Opening the store runs any pending migrations inside a single
//! transaction each, courtesy of `sqlx::migrate!`; a failure here is fatal
//! at startup (per spec, migration failure must abort the process rather
//! than run against a half-migrated schema).

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::errors::OpenStoreError;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("migrations");

/// Open (creating if absent) the SQLite store at `path` and run pending
/// migrations. The returned pool is safe to share across worker
/// threads/tasks; callers never hold a lock across external I/O, since
/// each query checks out and returns a connection per call.
pub async fn open(path: &str) -> Result<SqlitePool, OpenStoreError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
        .map_err(|source| OpenStoreError::Connect {
            path: path.to_string(),
            source,
        })?
        .create_if_missing(true);

    // A private in-memory database only exists for the lifetime of a single
    // connection, so pooling more than one would make every other
    // connection see an empty schema. Cap the pool at one in that case;
    // real deployments always pass a file path.
    let max_connections = if path == ":memory:" { 1 } else { 8 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|source| OpenStoreError::Connect {
            path: path.to_string(),
            source,
        })?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}
