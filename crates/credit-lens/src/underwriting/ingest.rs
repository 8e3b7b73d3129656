use std::io::Read;
use std::path::Path;

use tracing::warn;

use super::domain::BorrowerProfile;
use super::features::{FeatureExtractor, RawBorrowerRow};

/// Structural failures while reading a borrower export. Cell-level defects never
/// surface here; they are replaced with defaults by the extractor.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read borrower export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid borrower CSV data: {0}")]
    Csv(#[from] csv::Error),
}

pub struct BorrowerCsvImporter;

impl BorrowerCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<BorrowerProfile>, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<BorrowerProfile>, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();

        let mut profiles = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row: RawBorrowerRow = headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();

            if record.len() < headers.len() {
                warn!(
                    row = index + 1,
                    found = record.len(),
                    expected = headers.len(),
                    "short borrower row, missing cells fall back to defaults"
                );
            }

            let fallback_id = format!("row-{:04}", index + 1);
            profiles.push(FeatureExtractor::from_row(&row, &fallback_id));
        }

        Ok(profiles)
    }
}

fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .trim()
        .to_ascii_lowercase()
        .split(|ch: char| ch.is_whitespace() || ch == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
