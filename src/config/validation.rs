use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, ProxyConfig, RawConfig, RawCrawlerConfig, RawOutputConfig,
    RawProxyConfig, DEFAULT_DATABASE_PATH, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PAGES,
    DEFAULT_MAX_RUNTIME_SECS, DEFAULT_RESULTS_WANTED, DEFAULT_START_URL, DEFAULT_SUMMARY_PATH,
};
use crate::url::{parse_listing_url, site_origin};
use crate::ConfigError;
use url::Url;

/// Turns the on-disk configuration into a validated [`Config`]
///
/// Unusable numeric values fall back to their defaults with a warning. Bad URLs
/// and empty output paths are errors.
pub fn resolve(raw: RawConfig) -> Result<Config, ConfigError> {
    Ok(Config {
        crawler: resolve_crawler_config(raw.crawler)?,
        proxy: resolve_proxy_config(raw.proxy)?,
        output: resolve_output_config(raw.output)?,
    })
}

fn resolve_crawler_config(raw: RawCrawlerConfig) -> Result<CrawlerConfig, ConfigError> {
    let start_url = raw.start_url.as_deref().unwrap_or(DEFAULT_START_URL);
    let start_url = parse_listing_url(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start-url: {}", e)))?;

    let site_origin = match raw.site_origin.as_deref() {
        Some(origin) => {
            let origin = parse_listing_url(origin)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site-origin: {}", e)))?;
            site_origin(&origin)
        }
        None => site_origin(&start_url),
    }
    .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site-origin: {}", e)))?;

    let max_runtime_secs = resolve_count(
        "max-runtime-secs",
        raw.max_runtime_secs.as_ref(),
        DEFAULT_MAX_RUNTIME_SECS,
    );

    Ok(CrawlerConfig {
        start_url,
        site_origin,
        results_wanted: resolve_u32("results-wanted", raw.results_wanted.as_ref(), DEFAULT_RESULTS_WANTED),
        max_pages: resolve_u32("max-pages", raw.max_pages.as_ref(), DEFAULT_MAX_PAGES),
        max_concurrency: resolve_u32(
            "max-concurrency",
            raw.max_concurrency.as_ref(),
            DEFAULT_MAX_CONCURRENCY,
        ),
        max_runtime_secs,
    })
}

fn resolve_proxy_config(raw: RawProxyConfig) -> Result<ProxyConfig, ConfigError> {
    for proxy in &raw.urls {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
    }

    Ok(ProxyConfig { urls: raw.urls })
}

fn resolve_output_config(raw: RawOutputConfig) -> Result<OutputConfig, ConfigError> {
    let database_path = raw
        .database_path
        .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
    if database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    let summary_path = raw
        .summary_path
        .unwrap_or_else(|| DEFAULT_SUMMARY_PATH.to_string());
    if summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    if raw.records_path.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "records-path cannot be empty".to_string(),
        ));
    }

    Ok(OutputConfig {
        database_path,
        summary_path,
        records_path: raw.records_path,
    })
}

fn resolve_u32(key: &str, value: Option<&toml::Value>, default: u32) -> u32 {
    let resolved = resolve_count(key, value, u64::from(default));
    u32::try_from(resolved).unwrap_or(u32::MAX)
}

/// Reads a positive count leniently
///
/// Integers, floats (truncated) and numeric strings are accepted; anything at
/// or below 1 becomes 1. Missing keys use `default`; unusable values use
/// `default` and log a warning.
pub fn resolve_count(key: &str, value: Option<&toml::Value>, default: u64) -> u64 {
    let Some(value) = value else {
        return default;
    };

    let number = match value {
        toml::Value::Integer(n) => Some(*n as f64),
        toml::Value::Float(f) => Some(*f),
        toml::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number.filter(|n| n.is_finite()) {
        Some(n) if n < 1.0 => 1,
        Some(n) => n.trunc() as u64,
        None => {
            tracing::warn!(
                "Ignoring unusable value {} for {}, using default {}",
                value,
                key,
                default
            );
            default
        }
    }
}
