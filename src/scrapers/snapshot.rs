use crate::error::ScrapeError;
use crate::scrapers::traits::PageSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::Html;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_SNAPSHOT_FILE: &str = "sandbox.html";

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    /// Download the page when the snapshot is missing instead of failing
    pub fetch_missing: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            fetch_missing: false,
        }
    }
}

/// Offline copy of the results page, for working without hitting the site.
///
/// There is no expiry: the file is used until someone deletes it.
pub struct SnapshotCache {
    path: PathBuf,
    fallback: Option<Box<dyn PageSource>>,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback: None,
        }
    }

    /// Download through `source` whenever the snapshot file is missing
    pub fn with_fallback(mut self, source: Box<dyn PageSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<String, ScrapeError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(html) => {
                if let Ok(modified) = tokio::fs::metadata(&self.path)
                    .await
                    .and_then(|meta| meta.modified())
                {
                    let saved: DateTime<Utc> = modified.into();
                    info!(
                        "📂 Using snapshot {} saved {}",
                        self.path.display(),
                        saved.format("%Y-%m-%d %H:%M UTC")
                    );
                }
                Ok(html)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let Some(source) = &self.fallback else {
                    return Err(ScrapeError::SnapshotMissing {
                        path: self.path.clone(),
                    });
                };

                warn!(
                    "It appears the snapshot {} was deleted or moved",
                    self.path.display()
                );
                info!("Downloading HTML from {} source...", source.source_name());
                self.download(source.as_ref()).await?;

                let html = tokio::fs::read_to_string(&self.path)
                    .await
                    .map_err(|source| self.io_error(source))?;
                info!("done.");
                Ok(html)
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Fetch a fresh page and store it as the snapshot
    pub async fn download(&self, source: &dyn PageSource) -> Result<(), ScrapeError> {
        let body = source.load_page().await?;
        let html = Html::parse_document(&body).html();

        tokio::fs::write(&self.path, html)
            .await
            .map_err(|source| self.io_error(source))?;
        info!("💾 Saved snapshot to {}", self.path.display());

        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ScrapeError {
        ScrapeError::Snapshot {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl PageSource for SnapshotCache {
    async fn load_page(&self) -> Result<String, ScrapeError> {
        self.load().await
    }

    fn source_name(&self) -> &'static str {
        "snapshot"
    }
}
