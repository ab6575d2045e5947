pub mod extract;
pub mod payload;
pub mod record;
pub mod regions;

use scraper::Html;

use record::Record;
use regions::{RegionSelectors, Regions};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("missing required data in {region}: {reason}")]
    MissingRequired { region: &'static str, reason: String },

    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

impl ExtractError {
    pub fn missing(region: &'static str, reason: impl Into<String>) -> Self {
        ExtractError::MissingRequired {
            region,
            reason: reason.into(),
        }
    }
}

/// Turns raw page bytes into a [`Record`]. Holds compiled selectors only,
/// so one extractor serves every page of a run.
pub struct Extractor {
    regions: Regions,
}

impl Extractor {
    pub fn new(selectors: &RegionSelectors) -> Result<Self, ExtractError> {
        Ok(Extractor {
            regions: Regions::compile(selectors)?,
        })
    }

    /// Two-step pipeline: bytes → tolerant HTML tree → record.
    pub fn extract(&self, raw: &[u8]) -> Result<Record, ExtractError> {
        let html = String::from_utf8_lossy(raw);
        let doc = Html::parse_document(&html);
        extract::extract_all(&doc, &self.regions)
    }
}
