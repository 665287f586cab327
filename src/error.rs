use thiserror::Error;

use crate::resources::PipelineDeletionSummary;

#[derive(Error, Debug)]
pub enum GitLabMcpError {
    #[error("GitLab API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GitLab API error (status {status}) persisted after {retries} retries")]
    ApiErrorAfterRetries { status: u16, retries: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{operation}: {source}")]
    Context {
        operation: &'static str,
        #[source]
        source: Box<GitLabMcpError>,
    },

    #[error("Operation cancelled")]
    Cancelled {
        partial: Option<PipelineDeletionSummary>,
    },
}

impl GitLabMcpError {
    /// HTTP status of the underlying API failure, looking through context wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::ApiErrorAfterRetries { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Context { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Context { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitLabMcpError>;

/// Prefixes errors with the name of the operation that produced them.
///
/// Cancellation passes through untouched so callers can still match on it.
pub trait ResultExt<T> {
    fn operation(self, operation: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn operation(self, operation: &'static str) -> Result<T> {
        self.map_err(|source| match source {
            GitLabMcpError::Cancelled { .. } => source,
            source => GitLabMcpError::Context {
                operation,
                source: Box::new(source),
            },
        })
    }
}
