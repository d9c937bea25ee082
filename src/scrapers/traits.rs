use crate::error::ScrapeError;
use async_trait::async_trait;

/// Where the search-results HTML comes from.
/// Live fetching and the offline snapshot both hand the pipeline the same raw page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load the raw search-results page
    async fn load_page(&self) -> Result<String, ScrapeError>;

    /// Get the name of the page source
    fn source_name(&self) -> &'static str;
}
