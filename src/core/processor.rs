use crate::api::client::ApiClient;
use crate::api::fetchers;
use crate::api::model::RawEntity;
use crate::config::{self, CrawlConfig, DetailStrategy};
use crate::core::collector::{self, CollectorHandle};
use crate::core::stats::{self, PhaseStats, RunStats};
use crate::error::{AppError, AppResult};
use crate::io;
use crate::logging::{log, LogLevel};
use crate::model::output::NormalizedRecord;
use crate::transform::category::SectionFilter;
use crate::transform::{detail, listing};
use crate::utils;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug)]
pub struct CrawlOutcome {
    pub records: Vec<NormalizedRecord>,
    pub stats: RunStats,
}

/// One (entity, variant) pair waiting for its detail task.
#[derive(Debug, Clone)]
struct WorkUnit {
    entity: Arc<RawEntity>,
    model_index: usize,
}

impl WorkUnit {
    fn model_code(&self) -> &str {
        &self.entity.models[self.model_index].code
    }
}

enum UnitStatus {
    Delivered,
    Empty,
}

pub async fn run(cfg: CrawlConfig) -> AppResult<i32> {
    let overall_start_time = Instant::now();
    let start_ts_str = Utc::now().format("%Y-%m-%d %H:%M:%S %Z").to_string();
    log(
        LogLevel::Step,
        &format!(
            "Starting catalog crawl of {} menu(s) at {}",
            cfg.menu_urls.len(),
            start_ts_str
        ),
    );
    log(
        LogLevel::Info,
        &format!("Output file: {}", cfg.out_file.display()),
    );

    let client = ApiClient::new()?;
    let CrawlOutcome { records, mut stats } = crawl(&client, Arc::new(cfg.clone())).await?;

    log(LogLevel::Step, "--- Phase 4: Save Output ---");
    let save_start_time = Instant::now();
    let save_total = 1 + usize::from(cfg.schema_file.is_some());
    stats.phase(stats::PHASE_SAVE).add_total(save_total);

    let record_count = records.len();
    match io::save_json(&cfg.out_file, records, "Products").await {
        Ok(()) => {
            stats.phase(stats::PHASE_SAVE).add_ok();
            log(
                LogLevel::Success,
                &format!(
                    "Saved {} product(s) to {}",
                    record_count,
                    cfg.out_file.display()
                ),
            );
        }
        Err(_) => stats.phase(stats::PHASE_SAVE).add_fail(),
    }

    if let Some(schema_path) = &cfg.schema_file {
        let schema = schemars::schema_for!(Vec<NormalizedRecord>);
        match io::save_json(schema_path, schema, "Output Schema").await {
            Ok(()) => stats.phase(stats::PHASE_SAVE).add_ok(),
            Err(_) => stats.phase(stats::PHASE_SAVE).add_fail(),
        }
    }
    log_phase_completion(
        stats::PHASE_SAVE,
        stats.phase(stats::PHASE_SAVE),
        save_start_time.elapsed(),
    );

    stats::print_summary(&stats, overall_start_time.elapsed());
    Ok(stats::determine_exit_code(&stats))
}

/// Walks every menu, pages every section and drains the detail cohort.
///
/// Nothing here is fatal: failed menus, pages and products are logged, counted
/// and left out.
pub async fn crawl(client: &ApiClient, cfg: Arc<CrawlConfig>) -> AppResult<CrawlOutcome> {
    let mut run_stats = RunStats::new();
    let filter = SectionFilter::new(cfg.blocked_section.clone());

    let menu_start_time = Instant::now();
    log(LogLevel::Step, "--- Phase 1: Menu Fetch ---");
    run_stats
        .phase(stats::PHASE_MENU)
        .add_total(cfg.menu_urls.len());

    let mut menu_tasks = JoinSet::new();
    for (idx, menu_url) in cfg.menu_urls.iter().enumerate() {
        let client_c = client.clone();
        let url = menu_url.clone();
        let filter_c = filter.clone();
        menu_tasks.spawn(async move {
            let result = fetchers::fetch_sections(&client_c, &url, &filter_c).await;
            (idx, url, result)
        });
    }

    let mut menu_sections: Vec<(usize, Vec<String>)> = Vec::new();
    while let Some(joined) = menu_tasks.join_next().await {
        let stats_menu = run_stats.phase(stats::PHASE_MENU);
        match joined {
            Ok((idx, url, Ok(sections))) => {
                if sections.is_empty() {
                    log(
                        LogLevel::Warning,
                        &format!("Menu {} listed no sections.", url),
                    );
                    stats_menu.add_skip();
                } else {
                    stats_menu.add_ok();
                    menu_sections.push((idx, sections));
                }
            }
            Ok((_, url, Err(e))) => {
                log(
                    LogLevel::Warning,
                    &format!("Menu fetch failed for {}: {}, skipping menu.", url, e),
                );
                stats_menu.add_fail();
            }
            Err(e) => {
                log(LogLevel::Error, &format!("Menu fetch task panicked: {}", e));
                stats_menu.add_fail();
            }
        }
    }
    menu_sections.sort_unstable_by_key(|(idx, _)| *idx);
    let sections: Vec<String> = menu_sections
        .into_iter()
        .flat_map(|(_, sections)| sections)
        .collect();
    run_stats.sections = sections.len();
    log_phase_completion(
        stats::PHASE_MENU,
        run_stats.phase(stats::PHASE_MENU),
        menu_start_time.elapsed(),
    );

    let (sink, consumer) = collector::spawn_collector();
    let detail_sem = cfg.max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let mut detail_tasks: JoinSet<(String, AppResult<UnitStatus>)> = JoinSet::new();

    let list_start_time = Instant::now();
    log(LogLevel::Step, "--- Phase 2: Listing Fetch ---");
    let page_requests: Vec<(String, u32, String)> = sections
        .iter()
        .flat_map(|section| {
            listing::page_urls(&cfg, section)
                .into_iter()
                .map(move |(page, url)| (section.clone(), page, url))
        })
        .collect();
    let total_pages = page_requests.len();
    run_stats.phase(stats::PHASE_LISTING).add_total(total_pages);
    let list_log_interval = std::cmp::max(10, total_pages / 10);
    let mut list_processed = 0usize;

    if total_pages > 0 {
        log(
            LogLevel::Info,
            &format!(
                "Fetching {} listing page(s) across {} section(s)...",
                total_pages,
                sections.len()
            ),
        );
    } else {
        log(LogLevel::Warning, "No sections to page through.");
    }

    let mut page_stream = stream::iter(page_requests)
        .map(|(section, page, url)| {
            let client_c = client.clone();
            async move {
                let result = fetchers::fetch_listing_page(&client_c, &url).await;
                (section, page, result)
            }
        })
        .buffered(config::MAX_LIST_CONCUR);

    while let Some((section, page, result)) = page_stream.next().await {
        list_processed += 1;
        match result {
            Ok(listing_page) => {
                if listing_page.entities.is_empty() {
                    run_stats.phase(stats::PHASE_LISTING).add_skip();
                } else {
                    run_stats.phase(stats::PHASE_LISTING).add_ok();
                }
                for entity in listing_page.entities {
                    schedule_entity(
                        entity,
                        client,
                        &cfg,
                        detail_sem.as_ref(),
                        &sink,
                        &mut detail_tasks,
                        &mut run_stats,
                    );
                }
            }
            Err(e) => {
                log(
                    unit_failure_level(&e),
                    &format!("Listing {} page {} dropped: {}", section, page, e),
                );
                run_stats.phase(stats::PHASE_LISTING).add_fail();
            }
        }
        if list_processed % list_log_interval == 0 || list_processed == total_pages {
            log_progress(
                stats::PHASE_LISTING,
                run_stats.phase(stats::PHASE_LISTING),
                list_processed,
            );
        }
    }
    log_phase_completion(
        stats::PHASE_LISTING,
        run_stats.phase(stats::PHASE_LISTING),
        list_start_time.elapsed(),
    );

    // Every detail task owns a handle clone; once this one is gone the consumer
    // stops exactly when the last task finishes.
    drop(sink);

    let detail_start_time = Instant::now();
    log(LogLevel::Step, "--- Phase 3: Detail Fetch ---");
    let total_units = detail_tasks.len();
    let detail_log_interval = std::cmp::max(50, total_units / 20);
    let mut detail_processed = 0usize;
    log(
        LogLevel::Info,
        &format!("Waiting on {} product variant task(s)...", total_units),
    );

    while let Some(joined) = detail_tasks.join_next().await {
        detail_processed += 1;
        let stats_detail = run_stats.phase(stats::PHASE_DETAIL);
        match joined {
            Ok((_, Ok(UnitStatus::Delivered))) => stats_detail.add_ok(),
            Ok((url, Ok(UnitStatus::Empty))) => {
                log(
                    LogLevel::Warning,
                    &format!("Detail {} returned no models, dropped.", url),
                );
                stats_detail.add_skip();
            }
            Ok((url, Err(e))) => {
                log(unit_failure_level(&e), &format!("Detail {} dropped: {}", url, e));
                stats_detail.add_fail();
            }
            Err(e) => {
                log(LogLevel::Error, &format!("Detail task panicked: {}", e));
                stats_detail.add_fail();
            }
        }
        if detail_processed % detail_log_interval == 0 || detail_processed == total_units {
            log_progress(stats::PHASE_DETAIL, stats_detail, detail_processed);
        }
    }

    let collected = consumer.await?;
    run_stats.records = collected.len();
    run_stats.duplicates = collected.duplicates();
    log_phase_completion(
        stats::PHASE_DETAIL,
        run_stats.phase(stats::PHASE_DETAIL),
        detail_start_time.elapsed(),
    );
    log(
        LogLevel::Info,
        &format!(
            "Collected {} unique product(s), {} duplicate(s) dropped.",
            run_stats.records, run_stats.duplicates
        ),
    );

    Ok(CrawlOutcome {
        records: collected.into_records(),
        stats: run_stats,
    })
}

fn schedule_entity(
    entity: RawEntity,
    client: &ApiClient,
    cfg: &Arc<CrawlConfig>,
    detail_sem: Option<&Arc<Semaphore>>,
    sink: &CollectorHandle,
    tasks: &mut JoinSet<(String, AppResult<UnitStatus>)>,
    run_stats: &mut RunStats,
) {
    let entity = Arc::new(entity);
    for model_index in 0..entity.models.len() {
        let unit = WorkUnit {
            entity: entity.clone(),
            model_index,
        };
        let url = cfg.detail_url(&unit.entity.code, unit.model_code());
        if url.contains(config::GIFT_MARKER) {
            let stats_detail = run_stats.phase(stats::PHASE_DETAIL);
            stats_detail.add_total(1);
            stats_detail.add_skip();
            continue;
        }

        run_stats.phase(stats::PHASE_DETAIL).add_total(1);
        let client_c = client.clone();
        let cfg_c = cfg.clone();
        let sem_c = detail_sem.cloned();
        let sink_c = sink.clone();
        tasks.spawn(async move {
            let result =
                process_unit(&client_c, &cfg_c, sem_c.as_ref(), &sink_c, unit, &url).await;
            (url, result)
        });
    }
}

async fn process_unit(
    client: &ApiClient,
    cfg: &CrawlConfig,
    detail_sem: Option<&Arc<Semaphore>>,
    sink: &CollectorHandle,
    unit: WorkUnit,
    url: &str,
) -> AppResult<UnitStatus> {
    let record = match cfg.strategy {
        DetailStrategy::Listing => {
            detail::normalize(cfg, &unit.entity, &unit.entity.models[unit.model_index])
        }
        DetailStrategy::Detail => {
            let permit = utils::acquire_permit(detail_sem, "Detail Fetch").await?;
            let fetched = fetchers::fetch_product_detail(client, url).await;
            drop(permit);

            let product = fetched?;
            if product.models.is_empty() {
                return Ok(UnitStatus::Empty);
            }
            detail::normalize_models(cfg, &product, &product.models)
        }
    };

    sink.offer(record).await?;
    Ok(UnitStatus::Delivered)
}

/// Upstream trouble only costs the unit; anything else points at the crawler itself.
fn unit_failure_level(e: &AppError) -> LogLevel {
    if e.is_unit_local() {
        LogLevel::Warning
    } else {
        LogLevel::Error
    }
}

fn log_progress(phase: &str, stats: &PhaseStats, processed: usize) {
    log(
        LogLevel::Info,
        &format!(
            "{} progress: {}/{} (OK: {}, Skip: {}, Fail: {})",
            phase, processed, stats.total_tasks, stats.ok, stats.skip_or_empty, stats.fail
        ),
    );
}

fn log_phase_completion(phase: &str, stats: &PhaseStats, elapsed: Duration) {
    let level = if stats.fail > 0 {
        LogLevel::Warning
    } else {
        LogLevel::Success
    };
    log(
        level,
        &format!(
            "{} complete in {:.2?}: {} OK, {} skipped/empty, {} failed of {}.",
            phase,
            elapsed,
            stats.ok,
            stats.skip_or_empty,
            stats.fail,
            stats.get_processed()
        ),
    );
}
