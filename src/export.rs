use crate::error::ExportError;
use crate::models::NormalizedListing;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_OUTPUT_FILE: &str = "housingdata.csv";

/// Header order of the exported file
pub const DEFAULT_COLUMNS: [&str; 10] = [
    "floorSize",
    "url",
    "price",
    "streetAddress",
    "city",
    "state",
    "zip",
    "fullAddress",
    "latitude",
    "longitude",
];

/// A results page with fewer cards than this is treated as blocked or broken
/// and never exported.
pub const MIN_EXPORT_RECORDS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Output file; `None` falls back to [`DEFAULT_OUTPUT_FILE`]
    pub output: Option<PathBuf>,
    pub columns: Vec<String>,
}

impl ExportConfig {
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => {
                info!("No filename specified. Using {}", DEFAULT_OUTPUT_FILE);
                PathBuf::from(DEFAULT_OUTPUT_FILE)
            }
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output: None,
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: Option<PathBuf>,
    pub written: usize,
    /// Listings left out because they lacked a declared column
    pub dropped: usize,
}

fn check_input(listings: &[NormalizedListing], columns: &[String]) -> Result<(), ExportError> {
    if listings.len() < MIN_EXPORT_RECORDS {
        return Err(ExportError::TooFewRecords {
            found: listings.len(),
            required: MIN_EXPORT_RECORDS,
        });
    }
    if columns.is_empty() {
        return Err(ExportError::NoColumns);
    }
    Ok(())
}

/// Write listings as CSV: the declared columns as header, one row per listing.
pub fn write_csv<W: Write>(
    writer: W,
    listings: &[NormalizedListing],
    columns: &[String],
) -> Result<ExportSummary, ExportError> {
    check_input(listings, columns)?;

    let mut rows = Vec::with_capacity(listings.len());
    let mut dropped = 0;
    for (idx, listing) in listings.iter().enumerate() {
        let row: Option<Vec<String>> = columns.iter().map(|c| listing.field(c)).collect();
        match row {
            Some(row) => rows.push(row),
            None => {
                let missing: Vec<&str> = columns
                    .iter()
                    .filter(|c| listing.field(c).is_none())
                    .map(String::as_str)
                    .collect();
                warn!("Listing {} lacks column(s) {:?}, not exported", idx, missing);
                dropped += 1;
            }
        }
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns)?;
    for row in &rows {
        csv.write_record(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;

    Ok(ExportSummary {
        path: None,
        written: rows.len(),
        dropped,
    })
}

/// Write listings to a CSV file at `path`
pub fn export_csv(
    path: &Path,
    listings: &[NormalizedListing],
    columns: &[String],
) -> Result<ExportSummary, ExportError> {
    // Rejected input never leaves an empty file behind
    check_input(listings, columns)?;

    let file = std::fs::File::create(path).map_err(csv::Error::from)?;
    let mut summary = write_csv(file, listings, columns)?;
    summary.path = Some(path.to_path_buf());

    info!(
        "💾 Data uploaded to {} successfully ({} rows)",
        path.display(),
        summary.written
    );

    Ok(summary)
}
