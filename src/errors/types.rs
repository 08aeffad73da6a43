use thiserror::Error;
use crate::models::Stage;

#[derive(Debug, Error)]
pub enum HnpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Target discovery error: {0}")]
    TargetDiscovery(String),

    #[error("Stage {stage} failed: {detail}")]
    Stage {
        stage: Stage,
        detail: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HnpError {
    pub fn stage(stage: Stage, detail: impl Into<String>) -> Self {
        Self::Stage { stage, detail: detail.into() }
    }
}
