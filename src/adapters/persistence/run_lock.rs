//! Single-instance guard for the browser profile. Concurrent runs against
//! the same profile corrupt the session, so the second one must be rejected
//! before any browser launches.

use crate::domain::DomainError;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOCK_FILE: &str = "wa-bulk.lock";

/// Held for the whole run; the lock file is removed on drop.
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(profile_dir: &Path) -> Result<Self, DomainError> {
        std::fs::create_dir_all(profile_dir)
            .map_err(|e| DomainError::Lock(format!("create profile dir: {e}")))?;
        let path = profile_dir.join(LOCK_FILE);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut f) => {
                let _ = write!(f, "{}", std::process::id());
                debug!(path = %path.display(), "profile lock acquired");
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(DomainError::Lock(format!(
                "{} exists; another run owns this profile (delete the file if it is stale)",
                path.display()
            ))),
            Err(e) => Err(DomainError::Lock(format!(
                "cannot create {}: {e}",
                path.display()
            ))),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "lock file removal failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let dir = tempfile::tempdir().unwrap();

        let first = RunLock::acquire(dir.path()).unwrap();
        let second = RunLock::acquire(dir.path());
        assert!(matches!(second, Err(DomainError::Lock(_))));

        drop(first);
        let third = RunLock::acquire(dir.path());
        assert!(third.is_ok());
    }
}
