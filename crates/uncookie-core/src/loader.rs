//! Remote schema loading with gist URL rewriting and a TTL cache.

use regex::Regex;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use crate::error::{Result, UncookieError};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

const GIST_HOST: &str = "gist.github.com";
const RAW_GIST_BASE: &str = "https://gist.githubusercontent.com/raw";

static USER_GIST_RE: OnceLock<Regex> = OnceLock::new();
static BARE_GIST_RE: OnceLock<Regex> = OnceLock::new();

fn user_gist_re() -> &'static Regex {
    USER_GIST_RE.get_or_init(|| {
        Regex::new(r"(?i)gist\.github\.com/[^/]+/([a-f0-9]+)").expect("valid regex")
    })
}

fn bare_gist_re() -> &'static Regex {
    BARE_GIST_RE
        .get_or_init(|| Regex::new(r"(?i)gist\.github\.com/([a-f0-9]+)/?$").expect("valid regex"))
}

/// Rewrite a gist page URL into its raw-content form.
///
/// URLs that already point at raw content, or that carry no recognizable gist
/// id, come back unchanged.
pub fn rewrite_gist_url(url: &str) -> String {
    if !url.contains(GIST_HOST) || url.contains("raw") {
        return url.to_string();
    }
    let id = user_gist_re()
        .captures(url)
        .or_else(|| bare_gist_re().captures(url))
        .and_then(|caps| caps.get(1));
    match id {
        Some(id) => format!("{RAW_GIST_BASE}/{}/", id.as_str()),
        None => {
            tracing::warn!(url, "could not extract gist id, using url as-is");
            url.to_string()
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    fetched_at: Instant,
}

/// Fetches schema text over HTTP and memoizes it per fetched URL.
pub struct RemoteLoader {
    client: reqwest::Client,
    cache: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for RemoteLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteLoader {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the schema text behind `url`, serving from cache while fresh.
    pub async fn resolve(&self, url: &str) -> Result<String> {
        let fetch_url = rewrite_gist_url(url);
        if let Some(content) = self.cached(&fetch_url) {
            tracing::debug!(url = %fetch_url, "using cached schema");
            return Ok(content);
        }

        tracing::debug!(url, fetch_url = %fetch_url, "fetching remote schema");
        let response = self
            .client
            .get(&fetch_url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UncookieError::RemoteLoad {
                url: fetch_url,
                status: status.as_u16(),
            });
        }
        let content = response.text().await?;

        self.lock_cache().insert(
            fetch_url,
            CacheEntry {
                content: content.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(content)
    }

    fn cached(&self, url: &str) -> Option<String> {
        let mut cache = self.lock_cache();
        let fresh = cache.get(url)?.fetched_at.elapsed() < self.ttl;
        if fresh {
            cache.get(url).map(|entry| entry.content.clone())
        } else {
            cache.remove(url);
            None
        }
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned cache only means a panic mid-insert; the map is still usable.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_user_gist_urls() {
        assert_eq!(
            rewrite_gist_url("https://gist.github.com/alice/abc123DEF"),
            "https://gist.githubusercontent.com/raw/abc123DEF/"
        );
        assert_eq!(
            rewrite_gist_url("https://gist.github.com/c3a4430e7255223cb2e40844f4f98ca4"),
            "https://gist.githubusercontent.com/raw/c3a4430e7255223cb2e40844f4f98ca4/"
        );
    }

    #[test]
    fn leaves_raw_and_foreign_urls_alone() {
        let raw = "https://gist.github.com/alice/abc123/raw";
        assert_eq!(rewrite_gist_url(raw), raw);
        let other = "https://example.com/rules.json";
        assert_eq!(rewrite_gist_url(other), other);
        let no_id = "https://gist.github.com/alice/";
        assert_eq!(rewrite_gist_url(no_id), no_id);
    }

    #[tokio::test]
    async fn caches_within_ttl() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rules.json")
            .match_header("cache-control", "no-cache")
            .with_status(200)
            .with_body(r##"[{"action":"remove","target":"#a"}]"##)
            .expect(1)
            .create_async()
            .await;

        let loader = RemoteLoader::new();
        let url = format!("{}/rules.json", server.url());
        let first = loader.resolve(&url).await.unwrap();
        let second = loader.resolve(&url).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.cache_len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refetches_after_expiry_and_clear() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rules.json")
            .with_status(200)
            .with_body("[]")
            .expect(4)
            .create_async()
            .await;

        let url = format!("{}/rules.json", server.url());
        let expired = RemoteLoader::with_ttl(Duration::ZERO);
        expired.resolve(&url).await.unwrap();
        expired.resolve(&url).await.unwrap();

        let loader = RemoteLoader::new();
        loader.resolve(&url).await.unwrap();
        loader.clear_cache();
        assert_eq!(loader.cache_len(), 0);
        loader.resolve(&url).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let loader = RemoteLoader::new();
        let url = format!("{}/missing", server.url());
        let err = loader.resolve(&url).await.unwrap_err();
        match err {
            UncookieError::RemoteLoad { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(loader.cache_len(), 0);
    }
}
