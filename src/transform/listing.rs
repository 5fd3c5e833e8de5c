use crate::api::model::RawEntity;
use crate::config::CrawlConfig;
use crate::error::{AppError, AppResult, FieldError};
use crate::model::extract::JsonNode;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct ListingPage {
    pub entities: Vec<RawEntity>,
    /// Entities, or single variants of kept entities, that could not be decoded.
    pub rejected: Vec<FieldError>,
}

impl ListingPage {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.rejected.is_empty()
    }
}

/// Page URLs for one section, `1..=pages_per_section`.
pub fn page_urls(cfg: &CrawlConfig, section_path: &str) -> Vec<(u32, String)> {
    (1..=cfg.pages_per_section)
        .map(|page| (page, cfg.listing_url(section_path, page)))
        .collect()
}

/// Reads `items[].cells[].entity` out of a listing response.
///
/// Pages past the end of a section come back with no usable cells, so absent
/// `items`, `cells` or `entity` read as zero results. A document that is not an
/// object, or whose `items` is some other type, is a decode error.
pub fn decode_listing(url: &str, doc: &Value) -> AppResult<ListingPage> {
    if !doc.is_object() {
        return Err(AppError::decode(url, "listing response is not an object"));
    }
    let items = match doc.get("items") {
        None | Some(Value::Null) => return Ok(ListingPage::default()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(AppError::decode(url, "'items' is not an array")),
    };

    let mut page = ListingPage::default();
    for (i, item) in items.iter().enumerate() {
        let cells = match item.get("cells") {
            Some(Value::Array(cells)) => cells,
            _ => continue,
        };
        for (j, cell) in cells.iter().enumerate() {
            let Some(entity) = cell.get("entity").filter(|e| e.is_object()) else {
                continue;
            };
            let path = format!("items[{}].cells[{}].entity", i, j);
            let under_cell =
                |e: FieldError| FieldError::new(format!("{}.{}", path, e.path), e.expected);
            match RawEntity::from_json(JsonNode::root(entity)) {
                Ok(decoded) => {
                    page.rejected.extend(decoded.dropped.into_iter().map(under_cell));
                    page.entities.push(decoded.entity);
                }
                Err(e) => page.rejected.push(under_cell(e)),
            }
        }
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::fixtures::{entity, model, sku};
    use serde_json::json;

    fn listing(entities: Vec<Value>) -> Value {
        let cells: Vec<Value> = entities.into_iter().map(|e| json!({"entity": e})).collect();
        json!({"items": [{"cells": cells}]})
    }

    #[test]
    fn builds_fixed_page_range() {
        let cfg = CrawlConfig::for_base_url("http://shop");
        let urls = page_urls(&cfg, "/section/men");
        assert_eq!(urls.len(), 7);
        assert_eq!(urls[0], (1, "http://shop/api/section/men?page=1&page_size=30".to_string()));
        assert_eq!(urls[6].0, 7);
    }

    #[test]
    fn one_bad_entity_does_not_sink_the_page() {
        let m = || vec![model("1", "Red", vec![sku(100, 0, "M", 1, 1)])];
        let mut broken = entity(2, "c2", m());
        broken.as_object_mut().unwrap().remove("composition");
        let doc = listing(vec![entity(1, "c1", m()), broken, entity(3, "c3", m())]);

        let page = decode_listing("http://shop/p", &doc).unwrap();
        let ids: Vec<i64> = page.entities.iter().map(|e| e.product_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(page.rejected.len(), 1);
        assert_eq!(page.rejected[0].path, "items[0].cells[1].entity.composition");
    }

    #[test]
    fn one_bad_model_keeps_its_siblings() {
        let mut bad = model("b", "Blue", vec![sku(90, 0, "L", 0, 1)]);
        bad.as_object_mut().unwrap().remove("category");
        let good = model("a", "Red", vec![sku(100, 0, "M", 1, 1)]);
        let doc = listing(vec![entity(1, "c1", vec![good, bad])]);

        let page = decode_listing("http://shop/p", &doc).unwrap();
        assert_eq!(page.entities.len(), 1);
        let codes: Vec<&str> = page.entities[0]
            .models
            .iter()
            .map(|m| m.code.as_str())
            .collect();
        assert_eq!(codes, vec!["a"]);
        assert_eq!(
            page.rejected,
            vec![FieldError::new("items[0].cells[0].entity.models[1].category", "string")]
        );
    }

    #[test]
    fn out_of_range_pages_are_empty_not_errors() {
        for doc in [
            json!({"items": []}),
            json!({"items": null}),
            json!({}),
            json!({"items": [{"cells": [{"banner": {}}]}, {"title": "x"}]}),
        ] {
            let page = decode_listing("http://shop/p", &doc).unwrap();
            assert!(page.is_empty(), "expected empty page for {doc}");
        }
    }

    #[test]
    fn wrong_top_level_shape_is_a_decode_error() {
        let err = decode_listing("http://shop/p", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
        let err = decode_listing("http://shop/p", &json!({"items": "nope"})).unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }
}
