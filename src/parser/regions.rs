use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use super::record::Field;
use super::ExtractError;

/// CSS selectors naming each region of a product page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionSelectors {
    pub title: String,
    pub description: String,
    pub details: String,
    pub specs: String,
    pub page_meta: String,
    pub carousel: String,
    pub thumbnail: String,
    /// Attribute read from every thumbnail element.
    pub thumbnail_attr: String,
}

impl Default for RegionSelectors {
    fn default() -> Self {
        RegionSelectors {
            title: "title".into(),
            description: "p.product-primary-description".into(),
            details: "ul.product-item-details".into(),
            specs: "table.product-spec-table".into(),
            page_meta: r#"script[data-client-store="page-meta-data"]"#.into(),
            carousel: r#"script[data-client-store="carousel-images"]"#.into(),
            thumbnail: "img.product-image-thumbnail".into(),
            thumbnail_attr: "data-high-res-img".into(),
        }
    }
}

/// Compiled form of [`RegionSelectors`].
pub struct Regions {
    pub title: Selector,
    pub description: Selector,
    pub details: Selector,
    pub specs: Selector,
    pub page_meta: Selector,
    pub carousel: Selector,
    pub thumbnail: Selector,
    pub thumbnail_attr: String,
}

impl Regions {
    pub fn compile(cfg: &RegionSelectors) -> Result<Self, ExtractError> {
        Ok(Regions {
            title: compile(&cfg.title)?,
            description: compile(&cfg.description)?,
            details: compile(&cfg.details)?,
            specs: compile(&cfg.specs)?,
            page_meta: compile(&cfg.page_meta)?,
            carousel: compile(&cfg.carousel)?,
            thumbnail: compile(&cfg.thumbnail)?,
            thumbnail_attr: cfg.thumbnail_attr.clone(),
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// First element matching `selector`, mapped through `f`, or the sentinel.
///
/// Every optional region goes through here: a missing region yields
/// `Field::Missing(fallback)` and never stops the rest of the extraction.
pub fn lookup_or<T>(
    doc: &Html,
    selector: &Selector,
    fallback: &'static str,
    f: impl FnOnce(ElementRef<'_>) -> T,
) -> Field<T> {
    match doc.select(selector).next() {
        Some(el) => Field::Present(f(el)),
        None => Field::Missing(fallback),
    }
}

/// Concatenated text of every descendant text node.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}
