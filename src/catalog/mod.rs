//! Enumerates candidate projects under a data root and keeps the ones whose
//! language can be recognized from marker files or source globs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use regex::Regex;
use crate::errors::HnpError;
use crate::models::{Language, SkippedTarget, Target};
use tracing::{debug, info, warn};

struct LanguageMarkers {
    language: Language,
    /// Files at the project root that identify the language.
    markers: &'static [&'static str],
    /// Fallback: any matching source file anywhere below the root.
    source_globs: &'static [&'static str],
}

static LANGUAGE_MARKERS: &[LanguageMarkers] = &[
    LanguageMarkers {
        language: Language::Python,
        markers: &["requirements.txt", "setup.py", "pyproject.toml", "Pipfile"],
        source_globs: &["**/*.py"],
    },
    LanguageMarkers {
        language: Language::Go,
        markers: &["go.mod"],
        source_globs: &["**/*.go"],
    },
    LanguageMarkers {
        language: Language::Java,
        markers: &["pom.xml", "build.gradle", "build.gradle.kts"],
        source_globs: &["**/*.java"],
    },
    LanguageMarkers {
        language: Language::JavaScript,
        markers: &["package.json"],
        source_globs: &["**/*.js", "**/*.ts"],
    },
    LanguageMarkers {
        language: Language::Ruby,
        markers: &["Gemfile"],
        source_globs: &["**/*.rb"],
    },
];

static UNSAFE_ID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex"));

/// Result of enumerating a data root.
#[derive(Debug, Default)]
pub struct CatalogScan {
    pub targets: Vec<Target>,
    pub skipped: Vec<SkippedTarget>,
}

pub struct TargetCatalog {
    root: PathBuf,
    language: Option<Language>,
    excluded: Vec<PathBuf>,
}

impl TargetCatalog {
    pub fn new(root: &Path, language: Option<Language>) -> Self {
        Self {
            root: root.to_path_buf(),
            language,
            excluded: Vec::new(),
        }
    }

    /// Never treat these directories as targets (e.g. an output dir inside the data root).
    pub fn with_excluded(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.excluded.extend(paths.into_iter().map(|p| p.canonicalize().unwrap_or(p)));
        self
    }

    /// Enumerate immediate subdirectories of the root, sorted by name.
    ///
    /// An unreadable root is a configuration error; a single ambiguous or
    /// unrecognized project is only recorded as skipped.
    pub fn discover(&self) -> Result<CatalogScan, HnpError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            HnpError::Config(format!("Cannot read data root {}: {}", self.root.display(), e))
        })?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut scan = CatalogScan::default();
        let mut seen_ids = HashSet::new();

        for dir in dirs {
            let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();
            if name.starts_with('.') {
                continue;
            }
            let path = dir.canonicalize().unwrap_or_else(|_| dir.clone());
            if self.excluded.contains(&path) {
                debug!(project = %name, "Skipping excluded directory");
                continue;
            }

            let id = target_id(&name);
            match self.recognize(&path) {
                Ok(Some(language)) => {
                    if !seen_ids.insert(id.clone()) {
                        let err = HnpError::TargetDiscovery(format!(
                            "identifier '{}' already used by another project", id
                        ));
                        warn!(project = %name, error = %err, "Skipping target");
                        scan.skipped.push(SkippedTarget { target: name, reason: err.to_string() });
                        continue;
                    }
                    debug!(target = %id, language = %language, "Recognized target");
                    scan.targets.push(Target { id, path, language });
                }
                Ok(None) => {
                    let wanted = self.language.map(|l| l.as_str()).unwrap_or("supported");
                    info!(project = %name, "Skipping: not a {} project", wanted);
                    scan.skipped.push(SkippedTarget {
                        target: name,
                        reason: format!("no {} project markers", wanted),
                    });
                }
                Err(err) => {
                    warn!(project = %name, error = %err, "Skipping target");
                    scan.skipped.push(SkippedTarget { target: name, reason: err.to_string() });
                }
            }
        }

        info!(
            root = %self.root.display(),
            targets = scan.targets.len(),
            skipped = scan.skipped.len(),
            "Target discovery complete"
        );
        Ok(scan)
    }

    /// Decide the project's language. With a configured language only that
    /// one is checked; otherwise marker files beat source globs and two
    /// equally strong candidates are ambiguous.
    /// Run `discover` on the blocking pool; the directory walk and source
    /// globs must not stall the runtime's worker threads.
    pub async fn discover_async(self) -> Result<CatalogScan, HnpError> {
        tokio::task::spawn_blocking(move || self.discover())
            .await
            .map_err(|e| HnpError::Internal(format!("Discovery task failed: {}", e)))?
    }

    fn recognize(&self, path: &Path) -> Result<Option<Language>, HnpError> {
        let candidates: Vec<&LanguageMarkers> = LANGUAGE_MARKERS
            .iter()
            .filter(|m| self.language.map_or(true, |l| l == m.language))
            .collect();

        let by_marker: Vec<Language> = candidates
            .iter()
            .filter(|m| has_marker(path, m.markers))
            .map(|m| m.language)
            .collect();
        if let Some(language) = pick_one(&by_marker)? {
            return Ok(Some(language));
        }

        let by_glob: Vec<Language> = candidates
            .iter()
            .filter(|m| has_source_files(path, m.source_globs))
            .map(|m| m.language)
            .collect();
        pick_one(&by_glob)
    }
}

fn pick_one(found: &[Language]) -> Result<Option<Language>, HnpError> {
    match found {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        many => Err(HnpError::TargetDiscovery(format!(
            "ambiguous project type: {}",
            many.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

fn has_marker(path: &Path, markers: &[&str]) -> bool {
    markers.iter().any(|m| path.join(m).is_file())
}

fn has_source_files(path: &Path, globs: &[&str]) -> bool {
    let base = glob::Pattern::escape(&path.to_string_lossy());
    globs.iter().any(|g| {
        let pattern = format!("{}/{}", base, g);
        match glob::glob(&pattern) {
            Ok(mut paths) => paths.any(|p| p.is_ok()),
            Err(e) => {
                debug!(pattern = %pattern, error = %e, "Invalid source glob");
                false
            }
        }
    })
}

/// Stable, filesystem-safe identifier from a directory name.
pub fn target_id(dir_name: &str) -> String {
    let id = UNSAFE_ID_CHARS.replace_all(dir_name.trim(), "_").to_string();
    if id.is_empty() { "_".to_string() } else { id }
}
