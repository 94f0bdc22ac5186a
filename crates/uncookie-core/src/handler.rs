use serde::{Deserialize, Serialize};

/// A named ruleset paired with its schema reference.
///
/// `schema` holds either inline JSON text or a URL. Handlers are identified by
/// their position in the configured list; two handlers may share a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    #[serde(alias = "rulesetName")]
    pub name: String,
    pub schema: String,
}

impl Handler {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
        }
    }

    /// `true` when the schema reference should be fetched rather than parsed.
    pub fn is_remote(&self) -> bool {
        self.schema.trim().starts_with("http")
    }

    pub fn applies_to(&self, host: &str) -> bool {
        matches_host(&self.name, host)
    }
}

/// The last two dot-separated labels of `host` (`www.example.com` → `example.com`).
pub fn base_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    let start = labels.len().saturating_sub(2);
    labels[start..].join(".")
}

/// Domain rule shared by handler names and `domain` fields: `*`, the exact
/// hostname, or the hostname's last-two-label suffix.
pub fn matches_host(pattern: &str, host: &str) -> bool {
    pattern == "*" || pattern == host || pattern == base_domain(host)
}
