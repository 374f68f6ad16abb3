use super::detector::detect;
use super::manifest::load_manifests;
use super::profile::build_profile;
use super::types::{ManifestData, ProjectProfile};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

const DEFAULT_MAX_DEPTH: usize = 12;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),
    #[error("Project scan aborted: {0}")]
    ScanAborted(String),
}

impl From<regex::Error> for AnalysisError {
    fn from(err: regex::Error) -> Self {
        AnalysisError::InvalidPattern(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub max_depth: usize,
    /// Regexes matched against single path components
    pub ignore_patterns: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            ignore_patterns: Self::default_ignores(),
        }
    }
}

impl AnalyzerConfig {
    pub fn default_ignores() -> Vec<String> {
        vec![
            r"^\.git$".to_string(),
            r"^node_modules$".to_string(),
            r"^\.next$".to_string(),
            r"^dist$".to_string(),
            r"^build$".to_string(),
        ]
    }

    pub fn add_ignore_pattern(&mut self, pattern: String) {
        self.ignore_patterns.push(pattern);
    }
}

/// Reads a project tree and produces its [`ProjectProfile`]
#[derive(Debug, Clone)]
pub struct ProjectAnalyzer {
    root: PathBuf,
    config: AnalyzerConfig,
}

impl ProjectAnalyzer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_config(root: impl Into<PathBuf>, config: AnalyzerConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scores the tree and assembles its profile
    ///
    /// The walk and manifest reads run on the blocking pool.
    pub async fn analyze(&self) -> Result<ProjectProfile, AnalysisError> {
        let start = Instant::now();
        info!(root = %self.root.display(), "Analyzing project");

        let analyzer = self.clone();
        let (files, manifest) = tokio::task::spawn_blocking(move || analyzer.scan())
            .await
            .map_err(|e| AnalysisError::ScanAborted(e.to_string()))??;

        let detection = detect(&files, &manifest);
        let profile = build_profile(detection, &files, &manifest);
        info!(
            project_type = %profile.project_type,
            confidence = profile.confidence_score,
            duration_ms = start.elapsed().as_millis(),
            "Project analysis complete"
        );
        Ok(profile)
    }

    /// Detection inputs without profile assembly
    pub fn scan(&self) -> Result<(Vec<String>, ManifestData), AnalysisError> {
        let files = self.list_files()?;
        Ok((files, load_manifests(&self.root)))
    }

    fn validate_root(&self) -> Result<(), AnalysisError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(AnalysisError::NotADirectory(self.root.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AnalysisError::PathNotFound(self.root.clone()))
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(
                AnalysisError::PermissionDenied(self.root.display().to_string()),
            ),
            Err(source) => Err(AnalysisError::Io {
                path: self.root.clone(),
                source,
            }),
        }
    }

    /// Relative file paths with `/` separators, ignored directories skipped
    pub fn list_files(&self) -> Result<Vec<String>, AnalysisError> {
        self.validate_root()?;

        let ignores = self
            .config
            .ignore_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .max_depth(self.config.max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || {
                    let name = e.file_name().to_string_lossy();
                    !ignores.iter().any(|re| re.is_match(&name))
                }
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let denied = e
                        .io_error()
                        .map(|io_err| io_err.kind() == io::ErrorKind::PermissionDenied)
                        .unwrap_or(false);
                    if denied {
                        return Err(AnalysisError::PermissionDenied(
                            e.path()
                                .unwrap_or(Path::new("unknown"))
                                .display()
                                .to_string(),
                        ));
                    }
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(joined);
        }

        debug!(files = files.len(), "Listed project files");
        Ok(files)
    }
}
