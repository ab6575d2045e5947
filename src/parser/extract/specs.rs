use std::collections::BTreeMap;

use scraper::Html;

use crate::parser::record::{Field, SPECS_MISSING};
use crate::parser::regions::{lookup_or, text_of, Regions};

pub fn extract(doc: &Html, regions: &Regions) -> Field<BTreeMap<String, String>> {
    lookup_or(doc, &regions.specs, SPECS_MISSING, |el| {
        pair_tokens(&tokenize(&text_of(el)))
    })
}

/// Trimmed, non-blank lines of a table's text.
pub fn tokenize(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads tokens as alternating key/value. A trailing unpaired key is dropped.
pub fn pair_tokens(tokens: &[String]) -> BTreeMap<String, String> {
    tokens
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}
