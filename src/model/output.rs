use crate::api::model::ProductId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SizeStock {
    /// SKU id; absent when the upstream SKU carried none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "size")]
    pub size_label: String,
    pub unit: String,
    #[serde(rename = "stock")]
    pub quantity: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ColorEntry {
    pub name: String,
    #[serde(default)]
    pub size_stock: Vec<SizeStock>,
}

/// One product as written to the output array.
///
/// `price` and `old_price` belong to the last SKU seen while normalizing, not to
/// any particular size.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct NormalizedRecord {
    pub name: String,
    pub price: i64,
    pub composition: String,
    pub old_price: Option<i64>,
    pub description: String,
    #[serde(default)]
    pub colors: Vec<ColorEntry>,
    pub article: String,
    pub product_url: String,
    pub category: String,
    pub product_id: ProductId,
    pub care: String,
    #[serde(default)]
    pub medias: Vec<String>,
}
