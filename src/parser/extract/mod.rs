pub mod images;
pub mod meta;
pub mod specs;
pub mod text;

use scraper::Html;

use super::record::Record;
use super::regions::{text_of, Regions};
use super::ExtractError;

/// Build a full record from a parsed page.
///
/// Only the title and the page-meta-data payload can fail the page; every
/// other field falls back to its sentinel.
pub fn extract_all(doc: &Html, regions: &Regions) -> Result<Record, ExtractError> {
    let title = doc
        .select(&regions.title)
        .next()
        .map(text_of)
        .ok_or_else(|| ExtractError::missing("title", "document has no title element"))?;

    let structured_data = meta::structured_data(doc, regions)?;
    let meta = meta::fields(&structured_data);

    Ok(Record {
        raw_document: doc.html(),
        title,
        description: text::description(doc, regions),
        details: text::details(doc, regions),
        specs: specs::extract(doc, regions),
        average_rating: meta.average_rating,
        color_count: meta.color_count,
        gender: meta.gender,
        review_count: meta.review_count,
        product_path: meta.product_path,
        color_list: meta::color_list(doc, regions),
        img_list: images::extract(doc, regions),
        structured_data,
    })
}
