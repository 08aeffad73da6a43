use super::types::HnpError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Fatal errors abort the run before any target is touched.
    pub fatal: bool,
}

impl HnpError {
    /// Classify this error to determine its type and whether it ends the run.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            HnpError::Config(_) => ErrorClassification {
                error_type: "ConfigurationError",
                fatal: true,
            },

            // Per-target errors: recorded, never propagated past the orchestrator
            HnpError::TargetDiscovery(_) => ErrorClassification {
                error_type: "TargetDiscoveryError",
                fatal: false,
            },
            HnpError::Stage { .. } => ErrorClassification {
                error_type: "StageFailure",
                fatal: false,
            },
            HnpError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                fatal: false,
            },
            HnpError::Engine(_) => ErrorClassification {
                error_type: "EngineError",
                fatal: false,
            },

            HnpError::Io(_) => ErrorClassification {
                error_type: "IoError",
                fatal: true,
            },
            HnpError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                fatal: true,
            },
            HnpError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                fatal: true,
            },
            HnpError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                fatal: true,
            },
        }
    }

    /// Process exit code for an error that reached `main`.
    pub fn exit_code(&self) -> i32 {
        match self {
            HnpError::Config(_) | HnpError::Yaml(_) => 2,
            _ => 1,
        }
    }
}
