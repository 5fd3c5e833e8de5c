use super::client::ApiClient;
use super::model::{CategoryNode, RawEntity};
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use crate::model::extract::JsonNode;
use crate::transform::category::{self, SectionFilter};
use crate::transform::listing::{self, ListingPage};

/// Fetches one menu and returns its section paths, already rewritten and filtered.
pub async fn fetch_sections(
    client: &ApiClient,
    menu_url: &str,
    filter: &SectionFilter,
) -> AppResult<Vec<String>> {
    log(
        LogLevel::Info,
        &format!("Fetching category URLs from {}", menu_url),
    );
    let doc = client.fetch_json(menu_url).await?;
    if !doc.is_object() {
        return Err(AppError::decode(menu_url, "menu response is not an object"));
    }
    let root = CategoryNode::from_menu(&doc);
    Ok(category::flatten(&root, filter))
}

/// Fetches one page built by [`listing::page_urls`].
pub async fn fetch_listing_page(client: &ApiClient, url: &str) -> AppResult<ListingPage> {
    let doc = client.fetch_json(url).await?;
    let page = listing::decode_listing(url, &doc)?;

    for rejected in &page.rejected {
        log(
            LogLevel::Warning,
            &format!("Listing {} - dropping: {}", url, rejected),
        );
    }
    Ok(page)
}

/// The product endpoint returns the entity at the top level of the document.
/// Variants that fail to decode are logged and left out.
pub async fn fetch_product_detail(client: &ApiClient, url: &str) -> AppResult<RawEntity> {
    let doc = client.fetch_json(url).await?;
    if !doc.is_object() {
        return Err(AppError::decode(url, "product response is not an object"));
    }
    let decoded = RawEntity::from_json(JsonNode::root(&doc))?;
    for dropped in &decoded.dropped {
        log(
            LogLevel::Warning,
            &format!("Detail {} - dropping variant: {}", url, dropped),
        );
    }
    Ok(decoded.entity)
}
