use serde::Deserialize;
use url::Url;

/// Listing crawled when no start URL is configured
pub const DEFAULT_START_URL: &str =
    "https://www.flipkart.com/computers/computer-components/monitors/pr?sid=6bo,g0i,9no&marketplace=FLIPKART";
pub const DEFAULT_RESULTS_WANTED: u32 = 20;
pub const DEFAULT_MAX_PAGES: u32 = 5;
pub const DEFAULT_MAX_CONCURRENCY: u32 = 3;
pub const DEFAULT_MAX_RUNTIME_SECS: u64 = 240;
pub const DEFAULT_DATABASE_PATH: &str = "./listing-sweep.db";
pub const DEFAULT_SUMMARY_PATH: &str = "./OUTPUT_SUMMARY.json";

/// Configuration file as written on disk
///
/// Every section and key is optional. Numeric keys are kept as raw TOML values
/// so that strings such as `"10"` and unusable values can be handled leniently.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub crawler: RawCrawlerConfig,
    pub proxy: RawProxyConfig,
    pub output: RawOutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawCrawlerConfig {
    pub start_url: Option<String>,
    pub site_origin: Option<String>,
    pub results_wanted: Option<toml::Value>,
    pub max_pages: Option<toml::Value>,
    pub max_concurrency: Option<toml::Value>,
    pub max_runtime_secs: Option<toml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProxyConfig {
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawOutputConfig {
    pub database_path: Option<String>,
    pub summary_path: Option<String>,
    pub records_path: Option<String>,
}

/// Main configuration structure for Listing-Sweep, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub proxy: ProxyConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerConfig {
    /// First listing page; later pages add a `page` query parameter
    pub start_url: Url,

    /// Origin that relative product links are resolved against
    pub site_origin: Url,

    /// Number of accepted records after which the crawl stops
    pub results_wanted: u32,

    /// Maximum number of listing pages to request
    pub max_pages: u32,

    /// Maximum number of simultaneous outbound requests
    pub max_concurrency: u32,

    /// Wall-clock budget checked before each page
    pub max_runtime_secs: u64,
}

/// Proxy rotation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy URLs used round robin, one per fetch attempt
    pub urls: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Path to the JSON run summary
    pub summary_path: String,

    /// Optional JSON Lines copy of the records
    pub records_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            summary_path: DEFAULT_SUMMARY_PATH.to_string(),
            records_path: None,
        }
    }
}
