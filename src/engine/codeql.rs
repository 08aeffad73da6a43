use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;
use crate::errors::HnpError;
use crate::models::Language;
use super::process::run_command;
use super::provider::{AnalysisEngine, EngineOutput};
use tracing::info;

/// Drives the CodeQL command-line tool.
pub struct CodeqlCli {
    binary: PathBuf,
    timeout: Duration,
}

impl CodeqlCli {
    pub fn new(binary: &Path, timeout: Duration) -> Self {
        Self {
            binary: binary.to_path_buf(),
            timeout,
        }
    }

    fn create_database_args(database: &Path, language: Language, source_root: &Path) -> Vec<OsString> {
        vec![
            "database".into(),
            "create".into(),
            database.into(),
            format!("--language={}", language.as_str()).into(),
            "--source-root".into(),
            source_root.into(),
        ]
    }

    fn run_query_args(query: &Path, database: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "query".into(),
            "run".into(),
            query.into(),
            "--database".into(),
            database.into(),
            "--output".into(),
            output.into(),
        ]
    }

    fn decode_args(results: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "bqrs".into(),
            "decode".into(),
            results.into(),
            "--format=text".into(),
            "--output".into(),
            output.into(),
        ]
    }
}

#[async_trait]
impl AnalysisEngine for CodeqlCli {
    async fn create_database(
        &self,
        database: &Path,
        language: Language,
        source_root: &Path,
    ) -> Result<EngineOutput, HnpError> {
        info!(database = %database.display(), language = %language, "codeql database create");
        let args = Self::create_database_args(database, language, source_root);
        run_command(&self.binary, args, self.timeout).await
    }

    async fn run_query(
        &self,
        query: &Path,
        database: &Path,
        output: &Path,
    ) -> Result<EngineOutput, HnpError> {
        info!(database = %database.display(), "codeql query run");
        run_command(&self.binary, Self::run_query_args(query, database, output), self.timeout).await
    }

    async fn decode_results(
        &self,
        results: &Path,
        output: &Path,
    ) -> Result<EngineOutput, HnpError> {
        info!(results = %results.display(), "codeql bqrs decode");
        run_command(&self.binary, Self::decode_args(results, output), self.timeout).await
    }

    fn engine_name(&self) -> &str {
        "codeql"
    }
}
