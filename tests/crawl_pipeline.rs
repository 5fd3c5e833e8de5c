//! End-to-end crawl tests against a local `wiremock` shop.
//!
//! Each test mounts a menu, a section listing and product endpoints, then runs
//! the real pipeline with a short page bound.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_harvest::api::client::ApiClient;
use catalog_harvest::config::{CrawlConfig, DetailStrategy};
use catalog_harvest::core::processor;
use catalog_harvest::core::stats::{PHASE_DETAIL, PHASE_LISTING, PHASE_MENU};
use catalog_harvest::model::output::{ColorEntry, NormalizedRecord, SizeStock};

fn sku(price: i64, old_price: i64, size: &str) -> Value {
    json!({
        "id": 10,
        "price": price,
        "old_price": old_price,
        "size": {"value": size},
        "stock": {"online": 1, "offline": 2}
    })
}

fn model(code: &str, color: &str) -> Value {
    json!({
        "code": code,
        "category": "Dresses",
        "color": {"name": color},
        "medias": [{"url": format!("https://cdn/{}.jpg", code)}],
        "skus": [sku(100, 0, "S"), sku(80, 120, "M")]
    })
}

fn entity(id: i64, code: &str, models: Vec<Value>) -> Value {
    json!({
        "id": id,
        "code": code,
        "name": format!("Dress {}", id),
        "description": "Midi dress",
        "article": format!("ART-{}", id),
        "composition": "100% cotton",
        "care": "30C",
        "models": models
    })
}

fn listing(entities: Vec<Value>) -> Value {
    let cells: Vec<Value> = entities.into_iter().map(|e| json!({"entity": e})).collect();
    json!({"items": [{"cells": cells}]})
}

fn test_config(server: &MockServer, strategy: DetailStrategy) -> CrawlConfig {
    let mut cfg = CrawlConfig::for_base_url(&server.uri());
    cfg.menu_urls = vec![
        format!("{}/api/menu/left_women", server.uri()),
        format!("{}/api/menu/left_missing", server.uri()),
    ];
    cfg.pages_per_section = 2;
    cfg.strategy = strategy;
    cfg.max_in_flight = Some(4);
    cfg
}

/// Mounts one section with four entities on page 1 and an empty page 2.
/// Entity 2 lacks `composition`; entity 1 has two colors.
async fn mount_shop(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/menu/left_women"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
            {"url": "/catalog/women", "items": [
                {"url": "/catalog/women-gift#gift"},
                {"url": ""}
            ]}
        ]})))
        .mount(server)
        .await;

    let mut broken = entity(2, "0002", vec![model("x", "Grey")]);
    broken.as_object_mut().unwrap().remove("composition");

    Mock::given(method("GET"))
        .and(path("/api/section/women"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(vec![
            entity(1, "0001", vec![model("a", "Red"), model("b", "Blue")]),
            broken,
            entity(3, "0003", vec![model("c", "Green")]),
            entity(4, "0004", vec![model("d", "Black")]),
        ])))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/section/women"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .with_priority(5)
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer) {
    let product_three = entity(3, "0003", vec![model("c", "Green")]);
    mount_details_with(server, product_three).await;
}

async fn mount_details_with(server: &MockServer, product_three: Value) {
    let product_one = entity(1, "0001", vec![model("a", "Red"), model("b", "Blue")]);
    for code in ["a", "b"] {
        Mock::given(method("GET"))
            .and(path("/api/v2/product/0001"))
            .and(query_param("model", code))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_one.clone()))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/api/v2/product/0003"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_three))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/product/0004"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(server)
        .await;
}

fn color(name: &str) -> ColorEntry {
    let size = |label: &str| SizeStock {
        id: Some(10),
        size_label: label.to_string(),
        unit: "pcs".to_string(),
        quantity: 3,
    };
    ColorEntry {
        name: name.to_string(),
        size_stock: vec![size("S"), size("M")],
    }
}

fn ids(records: &[NormalizedRecord]) -> BTreeSet<i64> {
    records.iter().map(|r| r.product_id).collect()
}

#[tokio::test]
async fn detail_crawl_dedups_and_contains_failures() {
    let server = MockServer::start().await;
    mount_shop(&server).await;
    mount_details(&server).await;

    let client = ApiClient::new().unwrap();
    let cfg = Arc::new(test_config(&server, DetailStrategy::Detail));
    let outcome = processor::crawl(&client, cfg).await.unwrap();

    assert_eq!(ids(&outcome.records), BTreeSet::from([1, 3]));
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.stats.sections, 1);
    assert_eq!(outcome.stats.duplicates, 1);

    let menu = outcome.stats.get(PHASE_MENU).unwrap();
    assert_eq!((menu.ok, menu.fail), (1, 1));
    let listing = outcome.stats.get(PHASE_LISTING).unwrap();
    assert_eq!((listing.ok, listing.skip_or_empty), (1, 1));
    let detail = outcome.stats.get(PHASE_DETAIL).unwrap();
    assert_eq!(detail.total_tasks, 4);
    assert_eq!((detail.ok, detail.fail), (3, 1));

    let one = outcome.records.iter().find(|r| r.product_id == 1).unwrap();
    let colors: Vec<&str> = one.colors.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(colors, vec!["Red", "Blue"]);
    assert_eq!(one.price, 80);
    assert_eq!(one.old_price, Some(120));
    assert_eq!(one.product_url, format!("{}/ru_ru/product/0001-b", server.uri()));
}

#[tokio::test]
async fn detail_without_models_is_skipped() {
    let server = MockServer::start().await;
    mount_shop(&server).await;
    mount_details_with(&server, entity(3, "0003", vec![])).await;

    let client = ApiClient::new().unwrap();
    let cfg = Arc::new(test_config(&server, DetailStrategy::Detail));
    let outcome = processor::crawl(&client, cfg).await.unwrap();

    assert_eq!(ids(&outcome.records), BTreeSet::from([1]));
    let detail = outcome.stats.get(PHASE_DETAIL).unwrap();
    assert_eq!(detail.total_tasks, 4);
    assert_eq!((detail.ok, detail.skip_or_empty, detail.fail), (2, 1, 1));
}

#[tokio::test]
async fn listing_strategy_needs_no_detail_endpoint() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    let client = ApiClient::new().unwrap();
    let mut cfg = test_config(&server, DetailStrategy::Listing);
    cfg.max_in_flight = None;
    let outcome = processor::crawl(&client, Arc::new(cfg)).await.unwrap();

    assert_eq!(ids(&outcome.records), BTreeSet::from([1, 3, 4]));
    assert_eq!(outcome.stats.duplicates, 1);

    // Either variant of product 1 may arrive first.
    let one = outcome.records.iter().find(|r| r.product_id == 1).unwrap();
    assert_eq!(one.colors.len(), 1);
    assert!(["Red", "Blue"].contains(&one.colors[0].name.as_str()));
    assert_eq!(one.colors[0].size_stock[0].quantity, 3);
}

#[tokio::test]
async fn run_writes_a_readable_pretty_array() {
    let server = MockServer::start().await;
    mount_shop(&server).await;
    mount_details(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&server, DetailStrategy::Detail);
    cfg.out_file = dir.path().join("products.json");
    cfg.schema_file = Some(dir.path().join("schema.json"));

    let code = processor::run(cfg.clone()).await.unwrap();
    assert_eq!(code, 0, "dropped units must not fail the run");

    let text = std::fs::read_to_string(&cfg.out_file).unwrap();
    assert!(text.starts_with("[\n  {\n    \"name\""));
    let saved: Vec<NormalizedRecord> = serde_json::from_str(&text).unwrap();

    let mut tuples: Vec<_> = saved
        .into_iter()
        .map(|r| (r.product_id, r.price, r.old_price, r.colors))
        .collect();
    tuples.sort_by_key(|t| t.0);
    assert_eq!(
        tuples,
        vec![
            (1, 80, Some(120), vec![color("Red"), color("Blue")]),
            (3, 80, Some(120), vec![color("Green")]),
        ]
    );

    let schema: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("schema.json")).unwrap())
            .unwrap();
    assert_eq!(schema["type"], "array");
}

#[tokio::test]
async fn unreachable_output_path_fails_the_run() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let mut cfg = test_config(&server, DetailStrategy::Listing);
    cfg.out_file = blocker.join("products.json");

    let code = processor::run(cfg).await.unwrap();
    assert_eq!(code, 1);
}
