use crate::config::{self, CrawlConfig, DetailStrategy};
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Crawls a retailer's category menus and saves every product as one JSON array.",
    long_about = None,
    after_help = format!("Default menus:\n    {}", config::DEFAULT_MENU_PATHS.join("\n    "))
)]
pub struct CliArgs {
    #[arg(
        long,
        default_value = config::DEFAULT_OUT_FILE,
        value_name = "FILE_PATH",
        help = "Where to write the product array"
    )]
    out_file: String,

    #[arg(
        long,
        default_value = config::DEFAULT_BASE_URL,
        value_name = "URL",
        help = "Shop origin used for every API and landing URL"
    )]
    base_url: String,

    #[arg(
        long = "menu",
        value_name = "PATH_OR_URL",
        help = "Menu endpoint to crawl (repeatable); replaces the default menus"
    )]
    menus: Vec<String>,

    #[arg(
        long,
        default_value_t = config::PAGES_PER_SECTION,
        value_name = "N",
        help = "Listing pages requested per section"
    )]
    pages: u32,

    #[arg(long, default_value_t = config::PAGE_SIZE, value_name = "N")]
    page_size: u32,

    #[arg(
        long,
        value_name = "SUBSTRING",
        help = "Skip sections whose path contains this text"
    )]
    blocked_section: Option<String>,

    #[arg(long, value_enum, default_value_t = DetailStrategy::Detail)]
    strategy: DetailStrategy,

    #[arg(
        long,
        default_value_t = config::DEFAULT_MAX_IN_FLIGHT,
        value_name = "N",
        help = "Concurrent product fetches; 0 lifts the limit"
    )]
    max_in_flight: usize,

    #[arg(
        long,
        value_name = "FILE_PATH",
        help = "Also write the JSON schema of the output records"
    )]
    schema_file: Option<String>,

    #[arg(
        long,
        value_name = "FILE_PATH",
        help = "Run in test mode using a local JSON file (product endpoint format)",
        conflicts_with_all = ["menus", "schema_file"]
    )]
    test_detail_file: Option<String>,

    #[arg(
        long,
        default_value = "test_output.json",
        value_name = "OUTPUT_FILE",
        help = "Output file name for test mode",
        requires = "test_detail_file"
    )]
    test_output_file: String,
}

impl CliArgs {
    pub fn get_test_detail_file(&self) -> Option<PathBuf> {
        self.test_detail_file.as_deref().map(PathBuf::from)
    }

    pub fn get_test_output_file(&self) -> PathBuf {
        PathBuf::from(&self.test_output_file)
    }

    pub fn to_config(&self) -> AppResult<CrawlConfig> {
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Argument(format!(
                "--base-url must be an http(s) URL, got '{}'",
                base_url
            )));
        }
        if self.pages == 0 || self.page_size == 0 {
            return Err(AppError::Argument(
                "--pages and --page-size must be at least 1".into(),
            ));
        }

        let mut cfg = CrawlConfig::for_base_url(base_url);
        if !self.menus.is_empty() {
            cfg.menu_urls = self
                .menus
                .iter()
                .map(|m| {
                    let m = m.trim();
                    if m.starts_with("http://") || m.starts_with("https://") {
                        m.to_string()
                    } else {
                        format!("{}{}", cfg.base_url, m)
                    }
                })
                .collect();
        }
        cfg.pages_per_section = self.pages;
        cfg.page_size = self.page_size;
        cfg.blocked_section = self.blocked_section.clone();
        cfg.strategy = self.strategy;
        cfg.max_in_flight = (self.max_in_flight > 0).then_some(self.max_in_flight);
        cfg.out_file = PathBuf::from(&self.out_file);
        cfg.schema_file = self.schema_file.as_deref().map(PathBuf::from);

        if cfg.max_in_flight.is_none() {
            log(
                LogLevel::Warning,
                "Product fetches are unbounded; every variant is requested at once.",
            );
        }
        Ok(cfg)
    }
}
