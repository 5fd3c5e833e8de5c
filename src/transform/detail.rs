use crate::api::model::{RawEntity, RawVariant};
use crate::config::{self, CrawlConfig};
use crate::model::output::{ColorEntry, NormalizedRecord, SizeStock};

/// Normalizes one (entity, variant) unit of work.
pub fn normalize(cfg: &CrawlConfig, entity: &RawEntity, variant: &RawVariant) -> NormalizedRecord {
    normalize_models(cfg, entity, std::slice::from_ref(variant))
}

/// Folds several variants of one product into a single record.
///
/// Category, media and product URL come from the last variant; each variant
/// contributes one color entry. `price`/`old_price` are overwritten by every
/// SKU in turn, so the last SKU wins. An `old_price` of zero leaves the previous
/// value in place.
pub fn normalize_models(
    cfg: &CrawlConfig,
    entity: &RawEntity,
    variants: &[RawVariant],
) -> NormalizedRecord {
    let mut record = NormalizedRecord {
        name: entity.name.clone(),
        price: 0,
        composition: entity.composition.clone(),
        old_price: None,
        description: entity.description.clone(),
        colors: Vec::with_capacity(variants.len()),
        article: entity.article.clone(),
        product_url: String::new(),
        category: String::new(),
        product_id: entity.product_id,
        care: entity.care.clone(),
        medias: Vec::new(),
    };

    for variant in variants {
        record.category = variant.category.clone();
        record.medias = variant.media.clone();

        let mut color = ColorEntry {
            name: variant.color.clone(),
            size_stock: Vec::with_capacity(variant.skus.len()),
        };
        for sku in &variant.skus {
            color.size_stock.push(SizeStock {
                id: sku.id,
                size_label: sku.size.clone(),
                unit: config::SIZE_UNIT.to_string(),
                quantity: sku.stock_online + sku.stock_offline,
            });
            record.price = sku.price;
            if sku.old_price > 0 {
                record.old_price = Some(sku.old_price);
            }
        }
        record.colors.push(color);
        record.product_url = cfg.landing_url(&entity.code, &variant.code);
    }

    record
}
