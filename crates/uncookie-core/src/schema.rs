//! Schema parsing and shape detection.
//!
//! [`parse`] is the fail-closed entry point: anything that is not a JSON
//! array yields an empty action list. [`ActionGroup::detect`] sits on top of
//! it and decides, once per schema, which of the three wire shapes a handler
//! uses:
//!
//! ```text
//! [ {action, target, ...}, ... ]                 Flat
//! [ {domain, actions: [...]}, ... ]               Scoped
//! { "<domain>": [ {action, ...}, ... ], ... }     Keyed
//! ```

use serde_json::Value;

use crate::action::kind_of;
use crate::handler::{base_domain, matches_host, Handler};

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a schema value into its ordered list of entries.
///
/// Strings are deserialized first. A JSON error or a non-array top level is
/// logged and returns an empty list. Entries are not validated here.
pub fn parse(schema: &Value) -> Vec<Value> {
    match schema {
        Value::String(text) => parse_text(text),
        Value::Array(items) => items.clone(),
        other => {
            tracing::warn!(
                found = kind_of(other),
                "failed to parse action schema: schema must be an array of actions"
            );
            Vec::new()
        }
    }
}

/// [`parse`] for raw schema text.
pub fn parse_text(text: &str) -> Vec<Value> {
    if text.trim().is_empty() {
        tracing::warn!("failed to parse action schema: empty input");
        return Vec::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(other) => parse(&other),
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse action schema");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// ActionGroup
// ---------------------------------------------------------------------------

/// The shape a handler's schema was detected as.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionGroup {
    /// Plain action list; gated by the handler name.
    Flat(Vec<Value>),
    /// Entries carrying a `domain` field. Each entry is kept whole so that
    /// both `{domain, actions: [...]}` and `{domain, action, ...}` work.
    Scoped(Vec<(String, Value)>),
    /// Object keyed by domain, in document order.
    Keyed(Vec<(String, Vec<Value>)>),
}

impl ActionGroup {
    /// Detect the shape of `schema` (text or structured).
    pub fn detect(schema: &Value) -> Self {
        if let Value::String(text) = schema {
            return match serde_json::from_str::<Value>(text) {
                Ok(value) => Self::detect(&value),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to parse action schema");
                    ActionGroup::Flat(Vec::new())
                }
            };
        }

        if let Some(map) = schema.as_object() {
            if is_domain_map(map) {
                let entries = map
                    .iter()
                    .filter_map(|(domain, actions)| match actions.as_array() {
                        Some(actions) => Some((domain.clone(), actions.clone())),
                        None => {
                            tracing::debug!(domain = %domain, "skipping non-array domain entry");
                            None
                        }
                    })
                    .collect();
                return ActionGroup::Keyed(entries);
            }
        }

        let items = parse(schema);
        let has_domains = items.iter().any(|item| domain_of(item).is_some());
        if !has_domains {
            return ActionGroup::Flat(items);
        }

        let scoped = items
            .into_iter()
            .filter_map(|item| domain_of(&item).map(|d| (d.to_string(), item.clone())))
            .collect();
        ActionGroup::Scoped(scoped)
    }

    /// Convenience for schema text.
    pub fn detect_text(text: &str) -> Self {
        Self::detect(&Value::String(text.to_string()))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            ActionGroup::Flat(_) => "flat",
            ActionGroup::Scoped(_) => "scoped",
            ActionGroup::Keyed(_) => "keyed",
        }
    }

    /// Number of top-level entries across the whole schema.
    pub fn len(&self) -> usize {
        match self {
            ActionGroup::Flat(items) => items.len(),
            ActionGroup::Scoped(groups) => groups.len(),
            ActionGroup::Keyed(groups) => groups.iter().map(|(_, a)| a.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The part of this schema that applies to `host` for `handler`, ready to
    /// hand to the interpreter as one pass. `None` when nothing applies.
    pub fn select(&self, handler: &Handler, host: &str) -> Option<Value> {
        match self {
            ActionGroup::Flat(items) => {
                (handler.applies_to(host) && !items.is_empty()).then(|| Value::Array(items.clone()))
            }
            ActionGroup::Scoped(groups) => {
                let matched: Vec<Value> = groups
                    .iter()
                    .filter(|(domain, _)| matches_host(domain, host))
                    .map(|(_, entry)| entry.clone())
                    .collect();
                (!matched.is_empty()).then_some(Value::Array(matched))
            }
            ActionGroup::Keyed(groups) => {
                let base = base_domain(host);
                groups
                    .iter()
                    .find(|(domain, _)| domain == host)
                    .or_else(|| groups.iter().find(|(domain, _)| *domain == base))
                    .map(|(_, actions)| Value::Array(actions.clone()))
            }
        }
    }
}

fn domain_of(item: &Value) -> Option<&str> {
    item.get("domain")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
}

/// Any non-empty object that is not itself an action. Values that are not
/// arrays are skipped entry by entry.
fn is_domain_map(map: &serde_json::Map<String, Value>) -> bool {
    !map.is_empty() && !map.contains_key("action")
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

const PREVIEW_LIMIT: usize = 50;
const REMOTE_PREVIEW_LIMIT: usize = 40;

/// Short one-line description of a schema reference for handler listings.
pub fn preview(schema: &str) -> String {
    if schema.starts_with("http") {
        return format!(
            "Remote schema: {}",
            truncate(schema, REMOTE_PREVIEW_LIMIT)
        );
    }

    let Ok(parsed) = serde_json::from_str::<Value>(schema) else {
        return truncate(schema, PREVIEW_LIMIT);
    };
    let items = match &parsed {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };
    let Some(first) = items.first() else {
        return truncate(&parsed.to_string(), PREVIEW_LIMIT);
    };

    let field = |key: &str, label: &str, sep: &str| {
        first
            .get(key)
            .and_then(Value::as_str)
            .map(|v| format!("{label}: {v}{sep}"))
            .unwrap_or_default()
    };
    let mut text = format!(
        "{{{}{}{}}}",
        field("domain", "domain", ", "),
        field("action", "action", ", "),
        field("target", "target", "")
    );
    if items.len() > 1 {
        text.push_str(&format!(" + {} more", items.len() - 1));
    }
    truncate(&text, PREVIEW_LIMIT)
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_accepts_text_and_structured_arrays() {
        assert_eq!(parse_text(r#"[{"action":"reload"}]"#).len(), 1);
        assert_eq!(parse(&json!([{"action": "reload"}, {"log": "x"}])).len(), 2);
        assert_eq!(parse(&json!(r#"[{"action":"reload"}]"#)).len(), 1);
    }

    #[test]
    fn parse_fails_closed_on_non_arrays() {
        assert!(parse_text(r##"{"action":"remove","target":"#a"}"##).is_empty());
        assert!(parse_text("42").is_empty());
        assert!(parse_text(r#""just a string""#).is_empty());
        assert!(parse(&json!({"example.com": []})).is_empty());
        assert!(parse(&Value::Null).is_empty());
    }

    #[test]
    fn parse_fails_closed_on_bad_json() {
        assert!(parse_text("[{").is_empty());
        assert!(parse_text("").is_empty());
        assert!(parse_text("   ").is_empty());
    }

    #[test]
    fn parse_does_not_validate_entries() {
        let items = parse_text(r#"[{"action":"teleport"}, 7, null]"#);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn detect_flat() {
        let g = ActionGroup::detect_text(r##"[{"action":"remove","target":"#a"}]"##);
        assert_eq!(g.shape(), "flat");
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn detect_scoped_drops_undomained_entries() {
        let g = ActionGroup::detect(&json!([
            {"domain": "example.com", "actions": [{"action": "remove", "target": "#a"}]},
            {"action": "remove", "target": "#b"},
        ]));
        let ActionGroup::Scoped(groups) = &g else {
            panic!("expected Scoped, got {g:?}")
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "example.com");
    }

    #[test]
    fn detect_keyed_map() {
        let g = ActionGroup::detect_text(
            r##"{"example.com": [{"action":"remove","target":"#a"}], "other.org": []}"##,
        );
        assert_eq!(g.shape(), "keyed");
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn detect_keyed_skips_non_array_values() {
        let g = ActionGroup::detect(&json!({
            "note": "x",
            "version": 3,
            "example.com": [{"action": "remove", "target": "#a"}],
        }));
        let ActionGroup::Keyed(groups) = &g else {
            panic!("expected Keyed, got {g:?}")
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "example.com");
        assert!(g
            .select(&Handler::new("n", ""), "www.example.com")
            .is_some());
    }

    #[test]
    fn detect_single_action_object_is_empty_flat() {
        let g = ActionGroup::detect(&json!({"action": "remove", "target": "#a"}));
        assert_eq!(g, ActionGroup::Flat(Vec::new()));
    }

    #[test]
    fn select_flat_gated_by_handler_name() {
        let g = ActionGroup::detect(&json!([{"action": "reload"}]));
        assert!(g
            .select(&Handler::new("example.com", ""), "www.example.com")
            .is_some());
        assert!(g
            .select(&Handler::new("*", ""), "anything.net")
            .is_some());
        assert!(g
            .select(&Handler::new("other.com", ""), "www.example.com")
            .is_none());
    }

    #[test]
    fn select_scoped_filters_by_domain() {
        let g = ActionGroup::detect(&json!([
            {"domain": "*", "actions": [{"action": "remove", "target": "#a"}]},
            {"domain": "example.com", "actions": []},
            {"domain": "other.org", "actions": []},
        ]));
        let selected = g
            .select(&Handler::new("ignored", ""), "www.example.com")
            .unwrap();
        assert_eq!(selected.as_array().unwrap().len(), 2);
    }

    #[test]
    fn select_keyed_prefers_exact_host() {
        let g = ActionGroup::detect(&json!({
            "example.com": [{"log": "base"}],
            "www.example.com": [{"log": "exact"}, {"log": "exact 2"}],
        }));
        let h = Handler::new("n", "");
        let exact = g.select(&h, "www.example.com").unwrap();
        assert_eq!(exact.as_array().unwrap().len(), 2);
        let base = g.select(&h, "shop.example.com").unwrap();
        assert_eq!(base, json!([{"log": "base"}]));
        assert!(g.select(&h, "example.org").is_none());
    }

    #[test]
    fn preview_formats() {
        assert_eq!(
            preview(r##"[{"action":"remove","target":"#cookie"}]"##),
            "{action: remove, target: #cookie}"
        );
        assert_eq!(
            preview(r#"[{"domain":"a.com","actions":[]},{"domain":"b.com"}]"#),
            "{domain: a.com, } + 1 more"
        );
        assert!(preview("https://gist.github.com/someone/0123456789abcdef0123456789")
            .starts_with("Remote schema: https://gist.github.com/someone/0123"));
        assert!(preview("not json at all").starts_with("not json"));
        let long = "x".repeat(80);
        assert_eq!(preview(&long).len(), 53);
    }
}
