use scraper::Html;

use crate::parser::regions::Regions;

/// Thumbnail image paths in document order. Thumbnails without the
/// attribute are skipped.
pub fn extract(doc: &Html, regions: &Regions) -> Vec<String> {
    doc.select(&regions.thumbnail)
        .filter_map(|el| el.value().attr(&regions.thumbnail_attr))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::regions::RegionSelectors;

    #[test]
    fn keeps_document_order() {
        let doc = Html::parse_document(
            r#"<img class="product-image-thumbnail" data-high-res-img="/media/b?size=2000">
               <img class="hero" data-high-res-img="/media/x">
               <img class="product-image-thumbnail" data-high-res-img="/media/a?size=2000">
               <img class="product-image-thumbnail">"#,
        );
        let regions = Regions::compile(&RegionSelectors::default()).unwrap();
        assert_eq!(extract(&doc, &regions), ["/media/b?size=2000", "/media/a?size=2000"]);
    }

    #[test]
    fn no_thumbnails_is_empty() {
        let doc = Html::parse_document("<img src='/logo.png'>");
        let regions = Regions::compile(&RegionSelectors::default()).unwrap();
        assert!(extract(&doc, &regions).is_empty());
    }
}
