use std::path::Path;
use async_trait::async_trait;
use crate::errors::HnpError;
use crate::models::Language;

/// Captured result of one engine invocation.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// One-line failure description for outcomes and logs.
    pub fn failure_detail(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

/// The external static-analysis engine, treated as a black box.
///
/// Implementations return `Ok` whenever the process ran to completion, even
/// with a non-zero status; `Err` is reserved for spawn failures and timeouts.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Build an analysis database. The engine refuses to overwrite, so callers
    /// check for an existing database first.
    async fn create_database(
        &self,
        database: &Path,
        language: Language,
        source_root: &Path,
    ) -> Result<EngineOutput, HnpError>;

    /// Run the detection query, writing an intermediate result artifact.
    async fn run_query(
        &self,
        query: &Path,
        database: &Path,
        output: &Path,
    ) -> Result<EngineOutput, HnpError>;

    /// Decode the intermediate artifact to tabular text.
    async fn decode_results(
        &self,
        results: &Path,
        output: &Path,
    ) -> Result<EngineOutput, HnpError>;

    /// Engine name for logging
    fn engine_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_detail_includes_stderr() {
        let out = EngineOutput {
            exit_code: Some(2),
            stderr: "A fatal error occurred: database exists\n".into(),
            ..Default::default()
        };
        assert!(!out.success());
        assert_eq!(out.failure_detail(), "exit status 2: A fatal error occurred: database exists");
    }

    #[test]
    fn test_failure_detail_for_signal() {
        let out = EngineOutput::default();
        assert!(!out.success());
        assert_eq!(out.failure_detail(), "terminated by signal");
    }
}
