use crate::error::ScrapeError;
use crate::models::RawListing;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info};

/// CSS class of the search-results list
pub const DEFAULT_CONTAINER_SELECTOR: &str = "ul.photo-cards";

/// Why a listing card was left out
#[derive(Debug, Error)]
pub enum CardSkip {
    #[error("no inline script")]
    MissingScript,
    #[error("inline script is empty")]
    EmptyScript,
    #[error("inline script is not a listing object: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("no price text")]
    MissingPrice,
}

/// Listings pulled from one page
#[derive(Debug, Default)]
pub struct Extraction {
    pub listings: Vec<RawListing>,
    /// Cards dropped for inconsistent markup (ads, promoted slots, ...)
    pub skipped: usize,
}

/// Walks the results list and reads each card's structured-data blob and price
pub struct ListingExtractor {
    container_css: String,
    container: Selector,
    script: Selector,
    span: Selector,
}

impl ListingExtractor {
    pub fn new(container_css: &str) -> Result<Self, ScrapeError> {
        Ok(Self {
            container_css: container_css.to_string(),
            container: parse_selector(container_css)?,
            script: parse_selector("script")?,
            span: parse_selector("span")?,
        })
    }

    /// Extract listings in document order.
    ///
    /// Only a page without the results container is an error. Cards missing a
    /// script or price, or carrying broken JSON, are skipped and counted.
    pub fn extract(&self, html: &str) -> Result<Extraction, ScrapeError> {
        let document = Html::parse_document(html);
        let container = document
            .select(&self.container)
            .next()
            .ok_or_else(|| ScrapeError::ContainerNotFound {
                selector: self.container_css.clone(),
            })?;

        let mut extraction = Extraction::default();
        for (idx, card) in container.children().filter_map(ElementRef::wrap).enumerate() {
            match self.extract_card(card) {
                Ok(listing) => extraction.listings.push(listing),
                Err(reason) => {
                    debug!("Skipped card {}: {}", idx, reason);
                    extraction.skipped += 1;
                }
            }
        }

        info!(
            "Found {} listing cards ({} skipped)",
            extraction.listings.len(),
            extraction.skipped
        );

        Ok(extraction)
    }

    fn extract_card(&self, card: ElementRef) -> Result<RawListing, CardSkip> {
        let script = card
            .select(&self.script)
            .next()
            .ok_or(CardSkip::MissingScript)?;
        let blob = script.text().collect::<String>();
        if blob.trim().is_empty() {
            return Err(CardSkip::EmptyScript);
        }
        let mut listing: RawListing = serde_json::from_str(&blob)?;

        // Price is the span's leading text node, e.g. "$450,000" or "Est. $1,200/mo"
        let price_text = card
            .select(&self.span)
            .next()
            .and_then(|span| span.first_child())
            .and_then(|node| node.value().as_text().map(|text| text.to_string()))
            .filter(|text| !text.is_empty())
            .ok_or(CardSkip::MissingPrice)?;

        listing.extra.remove("price");
        listing.price = price_text.split_whitespace().map(str::to_owned).collect();

        Ok(listing)
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_SELECTOR).expect("default container selector is valid")
    }
}

fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}
