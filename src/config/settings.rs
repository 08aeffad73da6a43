use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::errors::HnpError;
use crate::models::Language;
use tracing::debug;

/// Everything the orchestrator needs, resolved from CLI flags and the config file.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub engine_binary: PathBuf,
    pub query_file: PathBuf,
    /// Directory whose immediate children are candidate projects.
    pub data_root: PathBuf,
    pub output_root: PathBuf,
    /// Database cache, persisted across runs.
    pub database_root: PathBuf,
    /// `None` auto-detects the language per target.
    pub language: Option<Language>,
    pub stage_timeout: Duration,
    pub concurrency: usize,
}

impl ScanSettings {
    pub fn results_dir(&self) -> PathBuf {
        self.output_root.join("results")
    }

    pub fn audit_dir(&self) -> PathBuf {
        self.output_root.join("audit")
    }

    /// Pre-flight checks. Any failure here is fatal and happens before a
    /// single target is touched. Resolves the engine binary in place.
    pub async fn validate(&mut self) -> Result<(), HnpError> {
        if self.concurrency == 0 {
            return Err(HnpError::Config("Concurrency must be at least 1".into()));
        }
        if self.stage_timeout.is_zero() {
            return Err(HnpError::Config("Stage timeout must be at least 1s".into()));
        }

        self.engine_binary = resolve_binary(&self.engine_binary).ok_or_else(|| {
            HnpError::Config(format!(
                "Analysis engine binary not found: {}",
                self.engine_binary.display()
            ))
        })?;
        debug!(engine = %self.engine_binary.display(), "Resolved engine binary");

        if !self.query_file.is_file() {
            return Err(HnpError::Config(format!(
                "Query file not found: {}",
                self.query_file.display()
            )));
        }

        if !self.data_root.is_dir() {
            return Err(HnpError::Config(format!(
                "Data root is not a directory: {}",
                self.data_root.display()
            )));
        }

        for dir in [self.results_dir(), self.audit_dir(), self.database_root.clone()] {
            ensure_writable_dir(&dir).await?;
        }

        // Engine is run from other working directories; pin paths down
        self.query_file = absolutize(&self.query_file)?;
        self.data_root = absolutize(&self.data_root)?;
        self.output_root = absolutize(&self.output_root)?;
        self.database_root = absolutize(&self.database_root)?;

        Ok(())
    }
}

/// Create `dir` if needed and prove it accepts writes.
pub async fn ensure_writable_dir(dir: &Path) -> Result<(), HnpError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        HnpError::Config(format!("Cannot create directory {}: {}", dir.display(), e))
    })?;

    let check = dir.join(format!(".hnpscan-write-check-{}", std::process::id()));
    tokio::fs::write(&check, b"ok").await.map_err(|e| {
        HnpError::Config(format!("Directory is not writable {}: {}", dir.display(), e))
    })?;
    let _ = tokio::fs::remove_file(&check).await;
    Ok(())
}

/// Resolve an executable: paths with a separator are checked directly,
/// bare names are searched on PATH.
pub fn resolve_binary(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 || binary.is_absolute() {
        return binary.is_file().then(|| binary.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| candidate_names(binary).into_iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

#[cfg(windows)]
fn candidate_names(binary: &Path) -> Vec<PathBuf> {
    vec![binary.to_path_buf(), binary.with_extension("exe"), binary.with_extension("cmd")]
}

#[cfg(not(windows))]
fn candidate_names(binary: &Path) -> Vec<PathBuf> {
    vec![binary.to_path_buf()]
}

fn absolutize(path: &Path) -> Result<PathBuf, HnpError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &Path) -> ScanSettings {
        let query = dir.join("hnp.ql");
        std::fs::write(&query, "select 1").unwrap();
        let data = dir.join("data");
        std::fs::create_dir_all(&data).unwrap();
        let engine = dir.join("codeql");
        std::fs::write(&engine, "").unwrap();

        ScanSettings {
            engine_binary: engine,
            query_file: query,
            data_root: data,
            output_root: dir.join("out"),
            database_root: dir.join("out").join("databases"),
            language: None,
            stage_timeout: Duration::from_secs(5),
            concurrency: 2,
        }
    }

    #[tokio::test]
    async fn test_validate_accepts_complete_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.validate().await.unwrap();
        assert!(settings.results_dir().is_dir());
        assert!(settings.audit_dir().is_dir());
        assert!(settings.database_root.is_dir());
    }

    #[tokio::test]
    async fn test_validate_missing_query_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.query_file = dir.path().join("missing.ql");
        let err = settings.validate().await.unwrap_err();
        assert!(matches!(err, HnpError::Config(ref m) if m.contains("Query file")));
    }

    #[tokio::test]
    async fn test_validate_missing_engine_binary() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.engine_binary = dir.path().join("bin").join("no-such-engine");
        let err = settings.validate().await.unwrap_err();
        assert!(matches!(err, HnpError::Config(ref m) if m.contains("engine binary")));
    }

    #[tokio::test]
    async fn test_validate_rejects_zero_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.concurrency = 0;
        assert!(settings.validate().await.is_err());
    }

    #[test]
    fn test_resolve_binary_bare_name_not_on_path() {
        assert!(resolve_binary(Path::new("hnpscan-definitely-not-installed")).is_none());
    }
}
