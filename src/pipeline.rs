use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, FailureKind, RunTotals};
use crate::fetcher::{Fetch, FetchError};
use crate::parser::record::Record;
use crate::parser::{ExtractError, Extractor};

/// Failure of a single locator. Never stops the rest of the batch.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("missing required data for {url}: {source}")]
    MissingData {
        url: String,
        #[source]
        source: ExtractError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Transport { .. } => FailureKind::Transport,
            PipelineError::MissingData { .. } => FailureKind::MissingData,
        }
    }
}

/// Fetch one product page and turn it into a record.
pub async fn fetch_record<F: Fetch>(
    fetcher: &F,
    extractor: &Extractor,
    url: &str,
) -> Result<Record, PipelineError> {
    let raw = fetcher.fetch(url).await.map_err(|source| PipelineError::Transport {
        url: url.to_string(),
        source,
    })?;
    let record = extractor.extract(&raw).map_err(|source| PipelineError::MissingData {
        url: url.to_string(),
        source,
    })?;
    flag_anomaly(&record, url);
    Ok(record)
}

/// Warn when a record lacks its category path. `source` names where the
/// page came from (locator or file). Returns whether the record is anomalous.
pub fn flag_anomaly(record: &Record, source: &str) -> bool {
    let anomalous = record.is_anomalous();
    if anomalous {
        warn!(source = %source, "product has no category path, may be delisted");
    }
    anomalous
}

/// Extract a record from a saved page on disk, with the same anomaly
/// reporting as a fetched page.
pub fn extract_file(extractor: &Extractor, path: &Path) -> Result<Record> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let record = extractor.extract(&raw)?;
    flag_anomaly(&record, &path.display().to_string());
    Ok(record)
}

pub enum Outcome {
    Stored { anomalous: bool },
    Failed,
}

/// Fetch, extract and store one locator.
///
/// The outer `Result` carries store errors only; per-locator failures come
/// back as [`Outcome::Failed`].
pub async fn process_locator<F: Fetch>(
    fetcher: &F,
    extractor: &Extractor,
    conn: &Connection,
    collection: &str,
    url: &str,
) -> Result<Outcome> {
    match fetch_record(fetcher, extractor, url).await {
        Ok(record) => {
            db::insert_product(conn, collection, url, &record)?;
            Ok(Outcome::Stored {
                anomalous: record.is_anomalous(),
            })
        }
        Err(e) => {
            warn!("{}", e);
            db::record_failure(conn, collection, url, e.kind(), &e.to_string())?;
            Ok(Outcome::Failed)
        }
    }
}

/// Process every locator of one category, strictly in order.
pub async fn run_category<F: Fetch>(
    fetcher: &F,
    extractor: &Extractor,
    conn: &Connection,
    collection: &str,
    urls: &[String],
) -> Result<RunTotals> {
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:>20} [{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta})")?
            .progress_chars("=> "),
    );
    pb.set_message(collection.to_string());

    let mut totals = RunTotals {
        categories: 1,
        ..RunTotals::default()
    };

    for url in urls {
        match process_locator(fetcher, extractor, conn, collection, url).await? {
            Outcome::Stored { anomalous } => {
                totals.stored += 1;
                if anomalous {
                    totals.anomalies += 1;
                }
            }
            Outcome::Failed => totals.failed += 1,
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "{}: {} stored, {} failed, {} anomalies",
        collection, totals.stored, totals.failed, totals.anomalies
    );
    Ok(totals)
}
