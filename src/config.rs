use crate::export::ExportConfig;
use crate::scrapers::extract::DEFAULT_CONTAINER_SELECTOR;
use crate::scrapers::snapshot::SnapshotConfig;
use crate::scrapers::types::FetchConfig;

/// Everything one run needs, handed to the pipeline up front
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub fetch: FetchConfig,
    pub snapshot: SnapshotConfig,
    /// CSS selector of the element holding the listing cards
    pub container_selector: String,
    pub export: ExportConfig,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            snapshot: SnapshotConfig::default(),
            container_selector: DEFAULT_CONTAINER_SELECTOR.to_string(),
            export: ExportConfig::default(),
        }
    }
}
