use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// The three engine invocations run for every target, in order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    DatabaseCreate,
    QueryRun,
    Decode,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseCreate => write!(f, "database-create"),
            Self::QueryRun => write!(f, "query-run"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

/// On-disk artifacts owned by one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisArtifact {
    pub target: String,
    pub database_path: PathBuf,
    /// Intermediate (binary) query result.
    pub result_path: PathBuf,
    /// Decoded text output.
    pub text_path: PathBuf,
    pub lock_path: PathBuf,
    /// Set when a database already existed before this run touched it.
    pub database_cached: bool,
}

impl AnalysisArtifact {
    /// Resolve artifact paths deterministically from the target identifier.
    pub fn resolve(target: &str, database_root: &Path, output_root: &Path) -> Self {
        let database_path = database_root.join(format!("{}-db", target));
        Self {
            target: target.to_string(),
            database_cached: database_path.exists(),
            database_path,
            result_path: database_root.join(format!("{}-hnp.bqrs", target)),
            text_path: output_root.join("results").join(format!("hnp-report-{}.txt", target)),
            lock_path: database_root.join(format!("{}.lock", target)),
        }
    }
}

/// Result of running the pipeline for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Succeeded {
        target: String,
        result_path: PathBuf,
    },
    Failed {
        target: String,
        stage: Stage,
        error: String,
    },
}

impl ScanOutcome {
    pub fn target(&self) -> &str {
        match self {
            Self::Succeeded { target, .. } | Self::Failed { target, .. } => target,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [Stage::DatabaseCreate, Stage::QueryRun, Stage::Decode] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_artifact_paths_derive_from_target_id() {
        let art = AnalysisArtifact::resolve(
            "flask_app",
            Path::new("/tmp/nonexistent-hnp/dbs"),
            Path::new("/tmp/nonexistent-hnp/out"),
        );
        assert_eq!(art.database_path, PathBuf::from("/tmp/nonexistent-hnp/dbs/flask_app-db"));
        assert_eq!(art.result_path, PathBuf::from("/tmp/nonexistent-hnp/dbs/flask_app-hnp.bqrs"));
        assert_eq!(
            art.text_path,
            PathBuf::from("/tmp/nonexistent-hnp/out/results/hnp-report-flask_app.txt")
        );
        assert!(!art.database_cached);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = ScanOutcome::Succeeded {
            target: "a".into(),
            result_path: PathBuf::from("a.txt"),
        };
        let failed = ScanOutcome::Failed {
            target: "b".into(),
            stage: Stage::QueryRun,
            error: "exit 1".into(),
        };
        assert_eq!(ok.target(), "a");
        assert!(ok.is_success());
        assert_eq!(failed.target(), "b");
        assert!(!failed.is_success());
    }
}
