use std::time::Duration;

use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Per-site scan failures.
///
/// These never abort a scan job; they end up as the error message of the
/// failed subtask.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("site unreachable: {0}")]
    SiteUnreachable(String),

    #[error("failed to parse site response: {0}")]
    ParseError(String),

    #[error("site fetch timed out after {}s", .0.as_secs())]
    ScanTimeout(Duration),

    #[error("scan cancelled before the site was fetched")]
    Cancelled,

    #[error("no fetcher registered for parse method '{0}'")]
    NoFetcher(String),
}

/// Optimization-level failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    /// No assignment satisfies the model's constraints.
    #[error("no feasible purchase plan exists")]
    InfeasibleProblem,

    /// The exact solver hit its time limit without a feasible incumbent.
    #[error("solver exceeded its {}s time limit without a feasible solution", .0.as_secs())]
    SolverTimeout(Duration),

    /// Malformed configuration or input, rejected before any work.
    #[error("validation failed: {0}")]
    Validation(#[from] DomainError),

    /// Unexpected solver or algorithm crash.
    #[error("internal optimizer error: {0}")]
    Internal(String),

    /// The run was cancelled cooperatively.
    #[error("optimization cancelled")]
    Cancelled,
}

impl OptimizeError {
    /// Returns `true` if the engine may hand the run to the fallback algorithm.
    #[must_use]
    pub const fn allows_fallback(&self) -> bool {
        matches!(self, Self::InfeasibleProblem | Self::SolverTimeout(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
