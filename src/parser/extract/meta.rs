use std::collections::BTreeSet;

use scraper::Html;
use serde_json::Value;
use tracing::debug;

use crate::parser::payload::PayloadExt;
use crate::parser::record::{
    Field, DEFAULT_GENDER, NO_COLOR_OPTIONS, PATH_MISSING, RATING_MISSING,
};
use crate::parser::regions::{text_of, Regions};
use crate::parser::ExtractError;

/// Fields read out of the page-meta-data payload.
pub struct MetaFields {
    pub average_rating: Field<Value>,
    pub color_count: Field<Value>,
    pub gender: Field<String>,
    pub review_count: Field<Value>,
    pub product_path: Field<String>,
}

/// The page-meta-data payload. Unlike every other region this one is required.
pub fn structured_data(doc: &Html, regions: &Regions) -> Result<Value, ExtractError> {
    let el = doc
        .select(&regions.page_meta)
        .next()
        .ok_or_else(|| ExtractError::missing("structured_data", "page-meta-data script not found"))?;
    serde_json::from_str(&text_of(el))
        .map_err(|e| ExtractError::missing("structured_data", format!("undecodable payload: {e}")))
}

pub fn fields(md: &Value) -> MetaFields {
    MetaFields {
        average_rating: md.get_number_or("averageRating", RATING_MISSING),
        color_count: md.get_number_or("pdpcolornum", NO_COLOR_OPTIONS),
        gender: md.get_text_or("productGender", DEFAULT_GENDER),
        review_count: md.get_number_or("reviewCount", RATING_MISSING),
        product_path: md.get_text_or("productCategoryPath", PATH_MISSING),
    }
}

/// Color names, taken from the keys of the carousel-images payload.
pub fn color_list(doc: &Html, regions: &Regions) -> Field<BTreeSet<String>> {
    let Some(el) = doc.select(&regions.carousel).next() else {
        return Field::Missing(NO_COLOR_OPTIONS);
    };
    match serde_json::from_str::<Value>(&text_of(el)) {
        Ok(carousel) => carousel.keys_or(NO_COLOR_OPTIONS),
        Err(e) => {
            debug!("carousel payload not decodable: {}", e);
            Field::Missing(NO_COLOR_OPTIONS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::regions::RegionSelectors;
    use serde_json::json;

    fn regions() -> Regions {
        Regions::compile(&RegionSelectors::default()).unwrap()
    }

    #[test]
    fn decodes_page_meta() {
        let doc = Html::parse_document(
            r#"<script data-client-store="page-meta-data">{"reviewCount": 12}</script>"#,
        );
        assert_eq!(structured_data(&doc, &regions()).unwrap(), json!({"reviewCount": 12}));
    }

    #[test]
    fn missing_page_meta_is_hard_failure() {
        let doc = Html::parse_document("<script>{}</script>");
        let err = structured_data(&doc, &regions()).unwrap_err();
        assert!(matches!(err, ExtractError::MissingRequired { region: "structured_data", .. }));
    }

    #[test]
    fn broken_page_meta_is_hard_failure() {
        let doc = Html::parse_document(
            r#"<script data-client-store="page-meta-data">{"reviewCount": </script>"#,
        );
        assert!(structured_data(&doc, &regions()).is_err());
    }

    #[test]
    fn each_missing_key_has_its_own_sentinel() {
        let f = fields(&json!({}));
        assert_eq!(f.average_rating, Field::Missing("Product rating not avialable."));
        assert_eq!(f.color_count, Field::Missing("No color options"));
        assert_eq!(f.gender, Field::Missing("unisex"));
        assert_eq!(f.review_count, Field::Missing("Product rating not avialable."));
        assert_eq!(f.product_path, Field::Missing("null"));
    }

    #[test]
    fn present_keys_are_copied() {
        let f = fields(&json!({
            "averageRating": 4.2,
            "pdpcolornum": 3,
            "productGender": "Women's",
            "reviewCount": 57,
            "productCategoryPath": "Products|Women's Clothing|Women's Jackets"
        }));
        assert_eq!(f.average_rating, Field::Present(json!(4.2)));
        assert_eq!(f.color_count, Field::Present(json!(3)));
        assert_eq!(f.gender, Field::Present("Women's".into()));
        assert_eq!(f.review_count, Field::Present(json!(57)));
        assert_eq!(
            f.product_path,
            Field::Present("Products|Women's Clothing|Women's Jackets".into())
        );
    }

    #[test]
    fn carousel_keys_become_color_list() {
        let doc = Html::parse_document(
            r#"<script data-client-store="carousel-images">{"Red": [], "Black": []}</script>"#,
        );
        let colors = color_list(&doc, &regions());
        let got: Vec<&str> = colors.present().unwrap().iter().map(String::as_str).collect();
        assert_eq!(got, ["Black", "Red"]);
    }

    #[test]
    fn broken_or_missing_carousel_falls_back() {
        let broken = Html::parse_document(
            r#"<script data-client-store="carousel-images">not json</script>"#,
        );
        assert_eq!(color_list(&broken, &regions()), Field::Missing("No color options"));
        let absent = Html::parse_document("<div></div>");
        assert_eq!(color_list(&absent, &regions()), Field::Missing("No color options"));
    }
}
