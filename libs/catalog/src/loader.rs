//! Hot-reloading catalog handle (C2).
//!
//! Memoizes a parsed [`CatalogSnapshot`] alongside the source file's mtime.
//! Reads take a read lock over an `Arc<CatalogSnapshot>` pointer (cheap);
//! a reload takes the write lock only long enough to swap the pointer, so
//! concurrent readers always observe either the old or the new snapshot in
//! full, never a torn mix (spec invariant 4/5).

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use tracing::{info, warn};

use crate::document::CatalogDocument;
use crate::errors::CatalogLoadError;
use crate::snapshot::CatalogSnapshot;

struct Loaded {
    snapshot: Arc<CatalogSnapshot>,
    mtime: SystemTime,
}

/// Shared, thread-safe handle to the device catalog. Cheap to clone.
#[derive(Clone)]
pub struct Catalog {
    path: PathBuf,
    inner: Arc<RwLock<Option<Loaded>>>,
}

impl Catalog {
    /// Build a handle without loading anything yet; the first call to
    /// [`Self::snapshot`] performs the initial load.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Return the current snapshot, loading or reloading it if the file's
    /// mtime has advanced since the last load.
    pub fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
        let current_mtime = file_mtime(&self.path)?;

        {
            let guard = self.inner.read().expect("catalog lock poisoned");
            if let Some(loaded) = guard.as_ref() {
                if loaded.mtime >= current_mtime {
                    return Ok(Arc::clone(&loaded.snapshot));
                }
            }
        }

        self.reload(current_mtime)
    }

    /// Force a reload regardless of mtime, used by tests and by operator
    /// tooling that just wrote a new catalog file and wants it picked up
    /// immediately rather than waiting for the next natural access.
    pub fn force_reload(&self) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
        let mtime = file_mtime(&self.path)?;
        self.reload(mtime)
    }

    fn reload(&self, mtime: SystemTime) -> Result<Arc<CatalogSnapshot>, CatalogLoadError> {
        let mut guard = self.inner.write().expect("catalog lock poisoned");

        // Another writer may have already reloaded to at least this mtime
        // while we waited for the write lock; skip the redundant parse.
        if let Some(loaded) = guard.as_ref() {
            if loaded.mtime >= mtime {
                return Ok(Arc::clone(&loaded.snapshot));
            }
        }

        let snapshot = Arc::new(load_snapshot(&self.path)?);
        info!(path = %self.path.display(), version = %snapshot.version, "reloaded device catalog");
        *guard = Some(Loaded {
            snapshot: Arc::clone(&snapshot),
            mtime,
        });
        Ok(snapshot)
    }
}

fn file_mtime(path: &Path) -> Result<SystemTime, CatalogLoadError> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| CatalogLoadError::Io {
            path: path.display().to_string(),
            source,
        })
}

fn load_snapshot(path: &Path) -> Result<CatalogSnapshot, CatalogLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let doc: CatalogDocument = serde_yml::from_str(&raw).map_err(|source| CatalogLoadError::Malformed {
        path: path.display().to_string(),
        source,
    })?;

    CatalogSnapshot::from_document(doc)
}

/// Returns `true` when the underlying file is missing, which legacy
/// adapters treat as "return empty views and log" rather than an error.
pub fn catalog_file_missing(path: &Path) -> bool {
    if path.exists() {
        return false;
    }
    warn!(path = %path.display(), "device catalog file not found");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_catalog(dir: &tempfile::TempDir, version: &str) -> PathBuf {
        let path = dir.path().join("catalog.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"
device_configuration:
  version: "{version}"
  last_updated: "2026-01-01"
  vendors:
    supermicro:
      motherboards:
        X11DPi-N:
          device_types:
            s2.c2.large:
              preferred_bios_method: vendor_tool
              hardware_specs: {{}}
"#
        )
        .unwrap();
        path
    }

    #[test]
    fn loads_and_memoizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(&dir, "1.0.0");
        let catalog = Catalog::new(&path);

        let first = catalog.snapshot().unwrap();
        let second = catalog.snapshot().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.version, "1.0.0");
    }

    #[test]
    fn reloads_on_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(&dir, "1.0.0");
        let catalog = Catalog::new(&path);
        let first = catalog.snapshot().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(1100));
        write_catalog(&dir, "2.0.0");

        let second = catalog.snapshot().unwrap();
        assert_eq!(second.version, "2.0.0");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_file_reports_true() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(catalog_file_missing(&missing));
    }
}
