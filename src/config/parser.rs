use std::path::Path;
use crate::errors::HnpError;
use super::types::HnpConfig;
use super::security::validate_shell_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<HnpConfig, HnpError> {
    if !path.exists() {
        return Err(HnpError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(HnpError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;

    validate_shell_patterns(&yaml)?;

    validate_schema(&yaml)?;

    let config: HnpConfig = serde_yaml::from_value(yaml)?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), HnpError> {
    let json_str = serde_json::to_string(yaml)
        .map_err(|e| HnpError::Config(format!("Config conversion error: {}", e)))?;
    let json_value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| HnpError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| HnpError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only: typed parsing and semantic checks below are authoritative
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Semantic checks serde cannot express.
fn validate_conflicts(config: &HnpConfig) -> Result<(), HnpError> {
    if let Some(scan) = &config.scan {
        if scan.concurrency == Some(0) {
            return Err(HnpError::Config("scan.concurrency must be at least 1".into()));
        }
    }

    if let Some(engine) = &config.engine {
        if engine.stage_timeout_secs == Some(0) {
            return Err(HnpError::Config("engine.stage_timeout_secs must be at least 1".into()));
        }
        if engine.binary.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(HnpError::Config("engine.binary must not be empty".into()));
        }
    }

    if let (Some(scan), Some(output)) = (&config.scan, &config.output) {
        if let (Some(data), Some(out)) = (&scan.data_root, &output.directory) {
            if Path::new(data) == Path::new(out) {
                warn!(path = %data, "Output directory equals the data root; it is excluded from discovery");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, ScanConfig};

    #[test]
    fn test_validate_conflicts_zero_concurrency() {
        let config = HnpConfig {
            scan: Some(ScanConfig {
                concurrency: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_zero_timeout() {
        let config = HnpConfig {
            engine: Some(EngineConfig {
                stage_timeout_secs: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_empty_config() {
        let config = HnpConfig::default();
        assert!(validate_conflicts(&config).is_ok());
    }

    #[tokio::test]
    async fn test_parse_config_missing_file() {
        let err = parse_config(Path::new("/nonexistent/hnpscan.yaml")).await.unwrap_err();
        assert!(matches!(err, HnpError::Config(_)));
    }

    #[tokio::test]
    async fn test_parse_config_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hnpscan.yaml");
        std::fs::write(
            &path,
            "engine:\n  binary: codeql\n  query: queries/hnp_detector.ql\n  language: python\n\
             scan:\n  data_root: data\n  concurrency: 4\n\
             output:\n  directory: results\n",
        )
        .unwrap();

        let config = parse_config(&path).await.unwrap();
        let engine = config.engine.unwrap();
        assert_eq!(engine.query.as_deref(), Some("queries/hnp_detector.ql"));
        assert_eq!(config.scan.unwrap().concurrency, Some(4));
        assert_eq!(config.output.unwrap().directory.as_deref(), Some("results"));
    }
}
