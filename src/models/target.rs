use std::path::PathBuf;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Languages the analysis engine can build a database for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Go,
    Java,
    JavaScript,
    Ruby,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::Go,
        Language::Java,
        Language::JavaScript,
        Language::Ruby,
    ];

    /// Tag passed to the engine's `--language` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Go => "go",
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::Ruby => "ruby",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "go" | "golang" => Ok(Self::Go),
            "java" => Ok(Self::Java),
            "javascript" | "js" | "typescript" | "ts" => Ok(Self::JavaScript),
            "ruby" | "rb" => Ok(Self::Ruby),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

/// A candidate project directory that passed language detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Stable identifier derived from the directory name.
    pub id: String,
    /// Absolute path to the project's source root.
    pub path: PathBuf,
    pub language: Language,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_str_aliases() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("ts".parse::<Language>().unwrap(), Language::JavaScript);
        assert_eq!("golang".parse::<Language>().unwrap(), Language::Go);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serde_matches_engine_tag() {
        for lang in Language::ALL {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(json, format!("\"{}\"", lang.as_str()));
        }
    }
}
