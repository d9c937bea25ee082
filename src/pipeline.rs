use crate::config::ScoutConfig;
use crate::error::{ExportError, ScrapeError};
use crate::export::{export_csv, ExportSummary};
use crate::models::NormalizedListing;
use crate::normalize::normalize;
use crate::scrapers::extract::ListingExtractor;
use crate::scrapers::traits::PageSource;
use tracing::{error, info};

/// Counts for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub extracted: usize,
    /// Cards skipped by the extractor
    pub skipped_cards: usize,
    /// Listings dropped during normalization
    pub dropped_records: usize,
    /// `None` when nothing was written
    pub export: Option<ExportSummary>,
}

impl RunReport {
    /// Listings lost anywhere between page and file
    pub fn total_dropped(&self) -> usize {
        self.skipped_cards
            + self.dropped_records
            + self.export.as_ref().map_or(0, |summary| summary.dropped)
    }
}

/// Normalized listings kept in memory instead of written out
#[derive(Debug)]
pub struct Collected {
    pub listings: Vec<NormalizedListing>,
    pub report: RunReport,
}

pub struct ListingPipeline {
    config: ScoutConfig,
    extractor: ListingExtractor,
}

impl ListingPipeline {
    pub fn new(config: ScoutConfig) -> Result<Self, ScrapeError> {
        let extractor = ListingExtractor::new(&config.container_selector)?;
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Load, extract and normalize
    pub async fn collect(&self, source: &dyn PageSource) -> Result<Collected, ScrapeError> {
        info!("Loading page from {} source", source.source_name());
        let html = source.load_page().await?;

        let extraction = self.extractor.extract(&html)?;
        let extracted = extraction.listings.len();
        let normalized = normalize(extraction.listings);

        Ok(Collected {
            listings: normalized.listings,
            report: RunReport {
                extracted,
                skipped_cards: extraction.skipped,
                dropped_records: normalized.dropped,
                export: None,
            },
        })
    }

    /// Collect and write the CSV file.
    ///
    /// A failed write is logged and leaves `export` empty; the run still ends normally.
    pub async fn run(&self, source: &dyn PageSource) -> Result<RunReport, ScrapeError> {
        let Collected {
            listings,
            mut report,
        } = self.collect(source).await?;

        let path = self.config.export.output_path();
        report.export = match export_csv(&path, &listings, &self.config.export.columns) {
            Ok(summary) => Some(summary),
            Err(ExportError::Csv(err)) => {
                error!("Failed to write {}: {}", path.display(), err);
                None
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            "✅ {} listings extracted, {} dropped along the way",
            report.extracted,
            report.total_dropped()
        );

        Ok(report)
    }
}
