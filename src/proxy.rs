//! Proxy selection for outbound requests

use crate::config::ProxyConfig;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Supplies the proxy for the next fetch attempt
pub trait ProxyProvider: Send + Sync {
    /// Returns the proxy URL to use, or `None` for a direct connection
    fn next_url(&self) -> Option<String>;
}

/// Always connects directly
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectConnection;

impl ProxyProvider for DirectConnection {
    fn next_url(&self) -> Option<String> {
        None
    }
}

/// Cycles through a fixed list of proxies
#[derive(Debug, Default)]
pub struct RotatingProxies {
    urls: Vec<String>,
    cursor: AtomicUsize,
}

impl RotatingProxies {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.urls.clone())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl ProxyProvider for RotatingProxies {
    fn next_url(&self) -> Option<String> {
        if self.urls.is_empty() {
            return None;
        }
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.urls.len();
        Some(self.urls[slot].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let proxies = RotatingProxies::new(vec!["http://a:1".to_string(), "http://b:2".to_string()]);

        assert_eq!(proxies.next_url().as_deref(), Some("http://a:1"));
        assert_eq!(proxies.next_url().as_deref(), Some("http://b:2"));
        assert_eq!(proxies.next_url().as_deref(), Some("http://a:1"));
    }

    #[test]
    fn test_empty_list_is_direct() {
        let proxies = RotatingProxies::from_config(&ProxyConfig::default());
        assert!(proxies.is_empty());
        assert_eq!(proxies.next_url(), None);
        assert_eq!(DirectConnection.next_url(), None);
    }
}
