//! Error types for dsb-manager

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::cluster::ReadinessDimension;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Readiness error: {0}")]
    Readiness(#[from] ReadinessError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Workload error: {0}")]
    Workload(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// External process errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("'{command}' exited with {status}{}", format_stderr(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{program}' produced non UTF-8 output")]
    InvalidOutput { program: String },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Metrics aggregation errors
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("metrics source unavailable for '{metric}': {source}")]
    SourceUnavailable {
        metric: &'static str,
        source: CommandError,
    },

    #[error("failed to write report to {path}: {source}")]
    Persist { path: PathBuf, source: io::Error },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to render report as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Readiness gate errors
#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error(
        "{dimension} did not converge within {budget_secs}s: expected {expected}, last observed {actual}"
    )]
    Timeout {
        dimension: ReadinessDimension,
        expected: usize,
        actual: usize,
        budget_secs: u64,
    },

    #[error("{dimension} status unavailable: {source}")]
    Status {
        dimension: ReadinessDimension,
        source: CommandError,
    },
}

/// Configuration and profile errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("exactly one of --local or --gcp must be provided")]
    AmbiguousTarget,

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid profile {path}: {source}")]
    InvalidProfile {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("missing file: {0}")]
    MissingFile(PathBuf),

    #[error("gcp profile is required for this command")]
    MissingProfile,

    #[error("instance '{0}' has no public address")]
    NoAddress(String),

    #[error("command '{command}' is not available for {target}")]
    Unsupported { command: String, target: String },
}

/// Config file generation errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid TOML template: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to render TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),

    #[error("invalid YAML template: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("template root must be a mapping")]
    NotAMapping,
}

pub type Result<T> = std::result::Result<T, ManagerError>;
