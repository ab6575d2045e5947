use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

pub const DESCRIPTION_MISSING: &str = "Product discription not available.";
pub const DETAILS_MISSING: &str = "Product details not available.";
pub const SPECS_MISSING: &str = "Product specs not available.";
pub const RATING_MISSING: &str = "Product rating not avialable.";
pub const NO_COLOR_OPTIONS: &str = "No color options";
pub const DEFAULT_GENDER: &str = "unisex";
pub const PATH_MISSING: &str = "null";

/// A value taken from the page, or the sentinel text stored in its place.
///
/// Serializes untagged so a stored document holds either the value itself
/// or the plain sentinel string under the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field<T> {
    Present(T),
    Missing(&'static str),
}

impl<T> Field<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing(_))
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            Field::Present(v) => Some(v),
            Field::Missing(_) => None,
        }
    }
}

/// One product document, as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub raw_document: String,
    pub title: String,
    pub description: Field<String>,
    pub details: Field<Vec<String>>,
    pub specs: Field<BTreeMap<String, String>>,
    pub structured_data: Value,
    pub average_rating: Field<Value>,
    pub color_count: Field<Value>,
    pub gender: Field<String>,
    pub review_count: Field<Value>,
    pub product_path: Field<String>,
    pub color_list: Field<BTreeSet<String>>,
    pub img_list: Vec<String>,
}

impl Record {
    #[cfg(test)]
    pub const KEYS: [&'static str; 13] = [
        "raw_document",
        "title",
        "description",
        "details",
        "specs",
        "structured_data",
        "average_rating",
        "color_count",
        "gender",
        "review_count",
        "product_path",
        "color_list",
        "img_list",
    ];

    /// Products without a category path are usually delisted.
    pub fn is_anomalous(&self) -> bool {
        self.product_path.is_missing()
    }
}
