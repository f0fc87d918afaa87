//! Instance lock (§5): prevents two runner processes from operating
//! against the same journal and wallet. Uses exclusive-create semantics on
//! a marker file in the runtime directory, matching the same pattern the
//! idempotency-key marker directory uses for duplicate detection.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceAlreadyRunning {
    pub lock_path: PathBuf,
}

impl std::fmt::Display for InstanceAlreadyRunning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "another runner instance holds the lock at {}", self.lock_path.display())
    }
}

impl std::error::Error for InstanceAlreadyRunning {}

impl InstanceLock {
    /// Acquires the lock by exclusively creating `path`. Fails if the file
    /// already exists — i.e. another runner is already holding it.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, InstanceAlreadyRunning> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(_) => return Err(InstanceAlreadyRunning { lock_path: path }),
        };
        let _ = writeln!(file, "{}", std::process::id());
        Ok(Self { path })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub fn default_lock_path(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join("runner.lock")
}
