use crate::error::FieldError;
use crate::model::extract::JsonNode;
use serde_json::Value;

pub type ProductId = i64;

/// One node of a menu tree. Only lives while a menu response is flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryNode {
    pub url: Option<String>,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    #[cfg(test)]
    pub fn leaf(url: &str) -> Self {
        CategoryNode {
            url: Some(url.to_string()),
            children: Vec::new(),
        }
    }

    /// Menu nodes nest under `items`; a missing or mistyped `url` is treated as absent.
    pub fn from_json(node: JsonNode<'_>) -> Self {
        CategoryNode {
            url: node.opt_str("url"),
            children: node
                .opt_array("items")
                .iter()
                .map(|child| CategoryNode::from_json(child.node()))
                .collect(),
        }
    }

    /// A menu response is an unnamed root whose `items` are the top-level categories.
    pub fn from_menu(value: &Value) -> Self {
        CategoryNode::from_json(JsonNode::root(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSku {
    pub id: Option<i64>,
    pub price: i64,
    /// Zero when the product is not discounted.
    pub old_price: i64,
    pub size: String,
    pub stock_online: i64,
    pub stock_offline: i64,
}

impl RawSku {
    pub fn from_json(node: JsonNode<'_>) -> Result<Self, FieldError> {
        let size = node.object("size")?;
        let stock = node.object("stock")?;
        Ok(RawSku {
            id: node.opt_int("id"),
            price: node.int("price")?,
            old_price: node.opt_int("old_price").unwrap_or(0),
            size: size.node().str("value")?,
            stock_online: stock.node().int("online")?,
            stock_offline: stock.node().int("offline")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVariant {
    pub code: String,
    pub category: String,
    pub color: String,
    pub media: Vec<String>,
    pub skus: Vec<RawSku>,
}

impl RawVariant {
    pub fn from_json(node: JsonNode<'_>) -> Result<Self, FieldError> {
        let color = node.object("color")?;
        let media = node
            .opt_array("medias")
            .iter()
            .map(|m| m.node().str("url"))
            .collect::<Result<Vec<_>, _>>()?;
        let skus = node
            .array("skus")?
            .iter()
            .map(|s| RawSku::from_json(s.node()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawVariant {
            code: node.str("code")?,
            category: node.str("category")?,
            color: color.node().str("name")?,
            media,
            skus,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntity {
    pub product_id: ProductId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub article: String,
    pub composition: String,
    pub care: String,
    pub models: Vec<RawVariant>,
}

/// A decoded entity together with the variants that were left out of it.
#[derive(Debug)]
pub struct DecodedEntity {
    pub entity: RawEntity,
    /// One error per skipped variant, addressed from the entity root.
    pub dropped: Vec<FieldError>,
}

impl RawEntity {
    /// Entity-level fields are required. Each model is decoded on its own, so a
    /// broken variant is reported in `dropped` and its siblings are kept.
    pub fn from_json(node: JsonNode<'_>) -> Result<DecodedEntity, FieldError> {
        let mut entity = RawEntity {
            product_id: node.int("id")?,
            code: node.str("code")?,
            name: node.str("name")?,
            description: node.str("description")?,
            article: node.str("article")?,
            composition: node.str("composition")?,
            care: node.str("care")?,
            models: Vec::new(),
        };

        let mut dropped = Vec::new();
        for m in node.array("models")? {
            match RawVariant::from_json(m.node()) {
                Ok(variant) => entity.models.push(variant),
                Err(e) => dropped.push(e),
            }
        }
        Ok(DecodedEntity { entity, dropped })
    }

    pub fn model(&self, code: &str) -> Option<&RawVariant> {
        self.models.iter().find(|m| m.code == code)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn menu_tree_reads_nested_items() {
        let doc = json!({"items": [
            {"url": "/catalog/women", "items": [{"url": "/catalog/women/dresses"}]},
            {"title": "no url here"}
        ]});
        let root = CategoryNode::from_menu(&doc);
        assert_eq!(root.url, None);
        assert_eq!(root.children.len(), 2);
        assert_eq!(
            root.children[0].children[0],
            CategoryNode::leaf("/catalog/women/dresses")
        );
        assert_eq!(root.children[1].url, None);
    }

    #[test]
    fn entity_decodes_with_optional_fields_absent() {
        let mut m = model("77", "Black", vec![sku(100, 0, "S", 1, 2)]);
        m.as_object_mut().unwrap().remove("medias");
        let mut s = m["skus"][0].clone();
        s.as_object_mut().unwrap().remove("old_price");
        m["skus"][0] = s;

        let doc = entity(5, "0100-1", vec![m]);
        let raw = RawEntity::from_json(JsonNode::root(&doc)).unwrap().entity;
        assert_eq!(raw.product_id, 5);
        assert_eq!(raw.models[0].skus[0].id, Some(1));
        assert!(raw.models[0].media.is_empty());
        assert_eq!(raw.models[0].skus[0].old_price, 0);
        assert!(raw.model("77").is_some());
        assert!(raw.model("78").is_none());
    }

    #[test]
    fn missing_stock_drops_only_its_variant() {
        let mut s = sku(100, 0, "S", 1, 2);
        s.as_object_mut().unwrap().remove("stock");
        let doc = entity(
            5,
            "0100-1",
            vec![
                model("77", "Black", vec![s]),
                model("78", "White", vec![sku(90, 0, "M", 0, 1)]),
            ],
        );
        let decoded = RawEntity::from_json(JsonNode::root(&doc)).unwrap();
        assert_eq!(decoded.entity.models.len(), 1);
        assert_eq!(decoded.entity.models[0].code, "78");
        assert_eq!(decoded.dropped.len(), 1);
        assert_eq!(decoded.dropped[0].path, "models[0].skus[0].stock");
    }

    #[test]
    fn bad_entity_field_rejects_the_entity() {
        let mut doc = entity(5, "0100-1", vec![model("77", "Black", vec![])]);
        doc["id"] = json!("five");
        let err = RawEntity::from_json(JsonNode::root(&doc)).unwrap_err();
        assert_eq!(err, FieldError::new("id", "number"));
    }
}
