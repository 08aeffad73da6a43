use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use dashmap::DashMap;
use fs2::FileExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use crate::errors::HnpError;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Serializes work on the same target, both inside this process (async
/// mutex per target id) and across processes (advisory file lock).
#[derive(Default)]
pub struct TargetLocks {
    local: DashMap<String, Arc<Mutex<()>>>,
}

/// Held for as long as a target's artifacts are being produced.
pub struct TargetGuard {
    _file: File,
    _local: OwnedMutexGuard<()>,
}

impl TargetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the target's lock. Waiting on another worker in this process is
    /// unbounded; waiting on another process gives up after `wait`.
    pub async fn acquire(&self, target: &str, lock_path: &Path, wait: Duration) -> Result<TargetGuard, HnpError> {
        let mutex = self.local.entry(target.to_string()).or_default().clone();
        let local = mutex.lock_owned().await;

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .await?
            .into_std()
            .await;

        let deadline = Instant::now() + wait;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(TargetGuard { _file: file, _local: local }),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(HnpError::Timeout(format!(
                            "{} is held by another process; gave up after {:?}",
                            lock_path.display(),
                            wait
                        )));
                    }
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_same_target_is_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let locks = Arc::new(TargetLocks::new());
        let lock_path = dir.path().join("app.lock");

        let guard = locks.acquire("app", &lock_path, WAIT).await.unwrap();

        let locks2 = locks.clone();
        let path2 = lock_path.clone();
        let waiter = tokio::spawn(async move { locks2.acquire("app", &path2, WAIT).await.map(|_| ()) });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_targets_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let locks = TargetLocks::new();
        let _a = locks.acquire("a", &dir.path().join("a.lock"), WAIT).await.unwrap();
        let b = tokio::time::timeout(
            Duration::from_secs(5),
            locks.acquire("b", &dir.path().join("b.lock"), WAIT),
        )
        .await;
        assert!(b.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_lock_held_elsewhere_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("app.lock");
        let other = OpenOptions::new().create(true).write(true).truncate(false).open(&lock_path).unwrap();
        other.lock_exclusive().unwrap();

        let locks = TargetLocks::new();
        let err = locks
            .acquire("app", &lock_path, Duration::from_millis(250))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, HnpError::Timeout(ref m) if m.contains("app.lock")));

        // Released once the other holder lets go
        other.unlock().unwrap();
        assert!(locks.acquire("app", &lock_path, WAIT).await.is_ok());
    }
}
