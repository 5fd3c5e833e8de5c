use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://lime-shop.com";
pub const DEFAULT_MENU_PATHS: [&str; 3] = [
    "/api/menu/left_kids",
    "/api/menu/left_women",
    "/api/menu/left_men",
];
pub const DEFAULT_OUT_FILE: &str = "products.json";

pub const PAGES_PER_SECTION: u32 = 7;
pub const PAGE_SIZE: u32 = 30;

pub const MAX_LIST_CONCUR: usize = 8;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

pub const HTTP_TIMEOUT_SECONDS: u64 = 35;
pub const HTTP_CONNECT_TIMEOUT: u64 = 20;

/// Menu links carry this marker for gift-card pseudo sections.
pub const GIFT_MARKER: &str = "#gift";
pub const BROWSE_SEGMENT: &str = "catalog";
pub const API_SEGMENT: &str = "section";

pub const SIZE_UNIT: &str = "pcs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DetailStrategy {
    /// Normalize the variant embedded in the listing page.
    Listing,
    /// Fetch the product endpoint for every variant.
    #[default]
    Detail,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    pub menu_urls: Vec<String>,
    pub pages_per_section: u32,
    pub page_size: u32,
    pub blocked_section: Option<String>,
    pub strategy: DetailStrategy,
    /// `None` spawns every detail fetch at once.
    pub max_in_flight: Option<usize>,
    pub out_file: PathBuf,
    pub schema_file: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig::for_base_url(DEFAULT_BASE_URL)
    }
}

impl CrawlConfig {
    pub fn for_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let menu_urls = DEFAULT_MENU_PATHS
            .iter()
            .map(|p| format!("{}{}", base_url, p))
            .collect();
        CrawlConfig {
            base_url,
            menu_urls,
            pages_per_section: PAGES_PER_SECTION,
            page_size: PAGE_SIZE,
            blocked_section: None,
            strategy: DetailStrategy::default(),
            max_in_flight: Some(DEFAULT_MAX_IN_FLIGHT),
            out_file: PathBuf::from(DEFAULT_OUT_FILE),
            schema_file: None,
        }
    }

    pub fn listing_url(&self, section_path: &str, page: u32) -> String {
        format!(
            "{}/api{}?page={}&page_size={}",
            self.base_url, section_path, page, self.page_size
        )
    }

    pub fn detail_url(&self, product_code: &str, model_code: &str) -> String {
        format!(
            "{}/api/v2/product/{}?id={}&force=false&model={}",
            self.base_url, product_code, product_code, model_code
        )
    }

    pub fn landing_url(&self, product_code: &str, model_code: &str) -> String {
        format!(
            "{}/ru_ru/product/{}-{}",
            self.base_url, product_code, model_code
        )
    }
}
