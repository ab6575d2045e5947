use scraper::Html;

use crate::parser::record::{Field, DESCRIPTION_MISSING, DETAILS_MISSING};
use crate::parser::regions::{lookup_or, text_of, Regions};

pub fn description(doc: &Html, regions: &Regions) -> Field<String> {
    lookup_or(doc, &regions.description, DESCRIPTION_MISSING, |el| {
        text_of(el).trim().to_string()
    })
}

/// Detail bullets, one per non-blank line of the list's text.
pub fn details(doc: &Html, regions: &Regions) -> Field<Vec<String>> {
    lookup_or(doc, &regions.details, DETAILS_MISSING, |el| {
        text_of(el)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    })
}
