// Error types for configuration loading, history inspection and builds.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with the site configuration file. Always fatal: a build never
/// starts with a configuration it could not validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse YAML in config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid options for plugin 'git-authors' in {}: {source}", path.display())]
    PluginOptions {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("'{key}' in {} must be a string or an !ENV tag naming environment variables", path.display())]
    InvalidSetting { path: PathBuf, key: &'static str },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    #[error("fallback_policy is 'use_default_author' but no fallback_author is configured")]
    MissingFallbackAuthor,

    #[error("fallback_author is set but fallback_policy is '{policy}'; set fallback_policy: use_default_author")]
    UnusedFallbackAuthor { policy: String },

    #[error("authorship_threshold_percent must be between 0 and 100, got {0}")]
    ThresholdOutOfRange(f64),

    #[error("ignore_commits entry '{0}' is not a commit hash (expected 4 to 40 hex characters)")]
    InvalidCommitId(String),
}

/// Failures while reading git history for a page.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("{} is not inside a git repository", path.display())]
    NotARepository { path: PathBuf },

    #[error("git repository at {} is bare; a working tree is required", path.display())]
    BareRepository { path: PathBuf },

    #[error("{} is outside the repository working tree {}", path.display(), workdir.display())]
    PathOutsideRepository { path: PathBuf, workdir: PathBuf },

    #[error("Failed to resolve {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Anything that aborts a documentation build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(
        "docs directory {} is not inside a git repository.\n\
         Set `fallback_to_empty: true` for the git-authors plugin to build without git history.",
        path.display()
    )]
    NoRepository { path: PathBuf },

    #[error("docs directory {} does not exist or is not a directory", path.display())]
    DocsDirMissing { path: PathBuf },

    #[error("Failed to read/write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to walk docs directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to serialize build report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Aborted with {count} warning(s) in strict mode")]
    Strict { count: usize },
}
