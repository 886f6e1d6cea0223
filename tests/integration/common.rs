//! Shared fixtures for the integration tests

use listing_sweep::config::{Config, CrawlerConfig, OutputConfig, ProxyConfig};
use listing_sweep::crawler::pacing::{DelayRange, FixedRandomness, NoopSleeper, Randomness, Sleeper};
use listing_sweep::crawler::{HttpFetcher, RetryPolicy};
use listing_sweep::Coordinator;
use std::sync::Arc;
use url::Url;

/// Renders one product card the way the listing site does
pub fn card(id: &str, title: &str, price: &str) -> String {
    format!(
        r#"<div data-id="{id}">
  <a class="CGtC98" href="/{slug}/p/{id}?pid={id}&lid=x">
    <img class="DByoQZ" src="https://img.example/{id}.jpg?q=70"/>
    <div class="KzDlHZ">{title}</div>
    <div class="_5OesEi"><span class="_3LWZlK">4.3</span></div>
    <span class="_2_R_DZ">1,234 Ratings &amp; 56 Reviews</span>
    <ul class="_1xgFaf"><li>Panel Type: IPS</li><li>75 Hz Refresh Rate</li></ul>
    <div class="Nx9bqj">{price}</div>
    <div class="_3I9_wc">₹9,999</div>
    <div class="UkUFwK"><span>20% off</span></div>
  </a>
</div>"#,
        slug = title.to_lowercase().replace(' ', "-"),
    )
}

/// Wraps cards into a listing page
pub fn listing_page(cards: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Monitors</title></head><body><div id=\"listing\">{}</div></body></html>",
        cards.concat()
    )
}

/// `count` cards with ids unique to `page`
pub fn page_of(page: u32, count: usize) -> String {
    let cards: Vec<String> = (1..=count)
        .map(|i| {
            card(
                &format!("MON{}X{}", page, i),
                &format!("Monitor {} {}", page, i),
                "₹7,499",
            )
        })
        .collect();
    listing_page(&cards)
}

pub fn crawler_config(server_uri: &str, results_wanted: u32, max_pages: u32) -> CrawlerConfig {
    let start_url = Url::parse(&format!("{}/monitors?sort=popularity", server_uri)).unwrap();
    let site_origin = Url::parse(&format!("{}/", server_uri)).unwrap();
    CrawlerConfig {
        start_url,
        site_origin,
        results_wanted,
        max_pages,
        max_concurrency: 2,
        max_runtime_secs: 240,
    }
}

pub fn config(crawler: CrawlerConfig, output: OutputConfig) -> Config {
    Config {
        crawler,
        proxy: ProxyConfig::default(),
        output,
    }
}

/// Fetcher and coordinator that never wait
pub fn instant_fetcher() -> Arc<HttpFetcher> {
    let sleeper: Arc<dyn Sleeper> = Arc::new(NoopSleeper);
    let rng: Arc<dyn Randomness> = Arc::new(FixedRandomness);
    Arc::new(HttpFetcher::new(sleeper, rng).with_pre_request_delay(DelayRange::zero()))
}

pub fn instant_coordinator(config: &CrawlerConfig) -> Coordinator {
    Coordinator::new(config, instant_fetcher())
        .unwrap()
        .with_pacing(Arc::new(NoopSleeper), Arc::new(FixedRandomness))
        .with_page_delay(DelayRange::zero())
        .with_retry_policy(RetryPolicy::default())
}
