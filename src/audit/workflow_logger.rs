use std::path::{Path, PathBuf};
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use crate::errors::HnpError;

pub struct WorkflowLogger {
    path: PathBuf,
}

impl WorkflowLogger {
    pub fn new(base_dir: &Path) -> Self {
        Self { path: base_dir.join("workflow.log") }
    }

    pub async fn initialize(&self, run_id: &str) -> Result<(), HnpError> {
        let header = format!(
            "# HNP Scan Workflow Log\n# Run: {}\n# Started: {}\n\n",
            run_id,
            Utc::now().to_rfc3339()
        );
        tokio::fs::write(&self.path, &header).await?;
        Ok(())
    }

    pub async fn log_event(&self, message: &str) -> Result<(), HnpError> {
        let line = format!("[{}] {}\n", Utc::now().format("%H:%M:%S"), message);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true).append(true).open(&self.path).await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
