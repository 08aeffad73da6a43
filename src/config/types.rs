use serde::{Deserialize, Serialize};
use crate::models::Language;

pub const DEFAULT_ENGINE_BINARY: &str = "codeql";
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 1800;
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_OUTPUT_DIR: &str = "./results";

/// On-disk configuration file. Every field is optional; CLI flags win.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HnpConfig {
    pub engine: Option<EngineConfig>,
    pub scan: Option<ScanConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EngineConfig {
    /// Engine executable, a bare name is looked up on PATH.
    pub binary: Option<String>,
    pub query: Option<String>,
    /// Restrict discovery to one language; auto-detect when absent.
    pub language: Option<Language>,
    pub stage_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScanConfig {
    pub data_root: Option<String>,
    pub database_dir: Option<String>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    pub directory: Option<String>,
}
