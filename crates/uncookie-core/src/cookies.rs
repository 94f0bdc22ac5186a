//! In-memory cookie store with `document.cookie` write semantics.
//!
//! A write is one `Set-Cookie`-style directive
//! (`name=value; Max-Age=0; path=/; domain=.example.com`). Cookies are keyed by
//! `(name, domain, path)`, where a cookie written without a `domain` attribute
//! is host-only and distinct from one written with `domain=<host>`. A write
//! whose `Max-Age` is not positive or whose `Expires` lies in the past deletes
//! the matching key and nothing else. Reads only show cookies whose path
//! covers the page path.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    #[serde(default)]
    pub value: String,
    /// `None` for host-only cookies. Stored without a leading dot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    fn same_key(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieJar {
    host: String,
    page_path: String,
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
            page_path: default_path(),
            cookies: Vec::new(),
        }
    }

    /// Jar as seen from a page at `path` instead of `/`.
    pub fn with_page_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if path.starts_with('/') {
            self.page_path = path;
        }
        self
    }

    pub fn page_path(&self) -> &str {
        &self.page_path
    }

    /// Seed the jar directly, bypassing write parsing. Cookies whose domain
    /// does not cover the host are dropped.
    pub fn insert(&mut self, mut cookie: Cookie) {
        cookie.domain = cookie.domain.map(|d| normalize_domain(&d));
        if let Some(domain) = &cookie.domain {
            if !domain_matches(&self.host, domain) {
                return;
            }
        }
        self.cookies.retain(|c| !c.same_key(&cookie));
        self.cookies.push(cookie);
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cookies.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Read side of `document.cookie`: `a=1; b=2`, limited to cookies
    /// visible at the page path.
    pub fn header(&self) -> String {
        self.cookies
            .iter()
            .filter(|c| path_matches(&self.page_path, &c.path))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Write side of `document.cookie`.
    pub fn write(&mut self, directive: &str) {
        self.write_at(directive, Utc::now());
    }

    pub fn write_at(&mut self, directive: &str, now: DateTime<Utc>) {
        let mut parts = directive.split(';');
        let Some((name, value)) = parts.next().and_then(|kv| kv.split_once('=')) else {
            tracing::debug!(directive, "ignoring cookie write without name=value");
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let mut cookie = Cookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            domain: None,
            path: default_path(),
        };
        let mut expired = false;

        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            let val = val.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "max-age" => {
                    if let Ok(secs) = val.parse::<i64>() {
                        expired = secs <= 0;
                    }
                }
                "expires" => {
                    if let Some(at) = parse_cookie_date(val) {
                        expired = at <= now;
                    }
                }
                "path" if val.starts_with('/') => cookie.path = val.to_string(),
                "domain" if !val.is_empty() => {
                    let domain = normalize_domain(val);
                    if !domain_matches(&self.host, &domain) {
                        tracing::debug!(domain = %domain, host = %self.host, "cookie domain rejected");
                        return;
                    }
                    cookie.domain = Some(domain);
                }
                _ => {}
            }
        }

        self.cookies.retain(|c| !c.same_key(&cookie));
        if !expired {
            self.cookies.push(cookie);
        }
    }
}

/// Cookie path-match: `cookie_path` equals `page_path` or is a directory
/// prefix of it.
fn path_matches(page_path: &str, cookie_path: &str) -> bool {
    match page_path.strip_prefix(cookie_path) {
        Some(rest) => rest.is_empty() || cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Format used for explicit past-expiry writes.
pub fn cookie_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn parse_cookie_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let bare = raw
        .trim()
        .trim_end_matches("GMT")
        .trim_end_matches("UTC")
        .trim();
    NaiveDateTime::parse_from_str(bare, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar() -> CookieJar {
        CookieJar::new("www.example.com")
    }

    #[test]
    fn write_and_read_header() {
        let mut j = jar();
        j.write("a=1");
        j.write("b=2; path=/");
        assert_eq!(j.header(), "a=1; b=2");
        assert_eq!(j.get("b"), Some("2"));
    }

    #[test]
    fn overwrite_same_key() {
        let mut j = jar();
        j.write("a=1");
        j.write("a=2");
        assert_eq!(j.header(), "a=2");
    }

    #[test]
    fn host_only_and_domain_cookies_are_distinct() {
        let mut j = jar();
        j.write("a=host");
        j.write("a=dom; domain=example.com");
        assert_eq!(j.cookies().len(), 2);
        j.write("a=; Max-Age=0; path=/");
        assert_eq!(j.cookies().len(), 1);
        assert_eq!(j.cookies()[0].domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn leading_dot_is_ignored() {
        let mut j = jar();
        j.write("a=1; domain=.www.example.com");
        j.write("a=; Max-Age=0; path=/; domain=www.example.com");
        assert!(j.is_empty());
    }

    #[test]
    fn past_expiry_deletes() {
        let mut j = jar();
        j.write("a=1");
        j.write("a=; expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/;");
        assert!(!j.contains("a"));
        j.write("b=1");
        j.write(&format!("b=; expires={}; path=/", cookie_date(DateTime::<Utc>::UNIX_EPOCH)));
        assert!(!j.contains("b"));
    }

    #[test]
    fn future_expiry_keeps() {
        let mut j = jar();
        j.write("a=1; expires=Fri, 01 Jan 2100 00:00:00 GMT");
        assert!(j.contains("a"));
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let mut j = jar();
        j.write("a=1; domain=other.com");
        assert!(j.is_empty());
    }

    #[test]
    fn header_hides_cookies_outside_page_path() {
        let mut j = jar();
        j.write("a=1; path=/shop");
        j.write("b=2");
        assert_eq!(j.header(), "b=2");
        assert!(j.contains("a"));

        let mut cart = CookieJar::new("www.example.com").with_page_path("/shop/cart");
        cart.write("a=1; path=/shop");
        cart.write("c=3; path=/shopping");
        assert_eq!(cart.header(), "a=1");
    }

    #[test]
    fn delete_only_hits_matching_path() {
        let mut j = jar();
        j.write("a=1; path=/shop");
        j.write("a=; Max-Age=0; path=/");
        assert!(j.contains("a"));
    }
}
