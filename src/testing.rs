use crate::api::model::RawEntity;
use crate::config::CrawlConfig;
use crate::error::{AppError, AppResult};
use crate::io;
use crate::logging::{log, LogLevel};
use crate::model::extract::JsonNode;
use crate::transform::detail;
use serde_json::Value;
use std::path::Path;
use tokio::fs;

/// Normalizes a saved product-endpoint response without touching the network.
pub async fn test_detail_transform(
    cfg: &CrawlConfig,
    input_path: &Path,
    output_path: &Path,
) -> AppResult<()> {
    log(LogLevel::Info, "--- Running Detail Transform Test ---");
    log(
        LogLevel::Info,
        &format!("Input file: {}", input_path.display()),
    );
    log(
        LogLevel::Info,
        &format!("Output file: {}", output_path.display()),
    );

    let json_content = fs::read_to_string(input_path)
        .await
        .map_err(AppError::from)?;
    let source = input_path.display().to_string();
    let doc: Value = serde_json::from_str(&json_content)
        .map_err(|e| AppError::decode(&source, e.to_string()))?;

    let decoded = RawEntity::from_json(JsonNode::root(&doc))?;
    for dropped in &decoded.dropped {
        log(LogLevel::Warning, &format!("Skipping model: {}", dropped));
    }
    let entity = decoded.entity;
    if entity.models.is_empty() {
        log(
            LogLevel::Warning,
            "Product has no models. No file generated.",
        );
        return Ok(());
    }

    let record = detail::normalize_models(cfg, &entity, &entity.models);
    log(
        LogLevel::Success,
        &format!("Transformation successful (product {}).", record.product_id),
    );

    io::save_json(output_path, vec![record], "Test Detail File").await?;
    log(
        LogLevel::Success,
        &format!(
            "Successfully saved transformed data to {}",
            output_path.display()
        ),
    );
    Ok(())
}
