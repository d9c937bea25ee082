use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a scrape run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to listing site failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Any non-200 answer. Usually the site's captcha service.
    #[error("listing site answered HTTP {status}, possibly blocked by anti-bot defenses")]
    Blocked { status: StatusCode },

    #[error("failed to encode search query: {0}")]
    Query(#[from] serde_json::Error),

    #[error("snapshot {} not found", path.display())]
    SnapshotMissing { path: PathBuf },

    #[error("snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSS selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("no listings container matching `{selector}` in page")]
    ContainerNotFound { selector: String },

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ScrapeError {
    /// Failures another attempt might get past; everything else is final
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Blocked { .. })
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("need at least {required} listings to export, got {found}")]
    TooFewRecords { found: usize, required: usize },

    #[error("no export columns declared")]
    NoColumns,

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}
