//! In-memory page implementing [`Document`].
//!
//! Elements live in an arena indexed by [`NodeId`]; removal detaches a node
//! from its parent so it stops matching queries. Pages round-trip through a
//! YAML [`PageSnapshot`]:
//!
//! ```yaml
//! hostname: www.example.com
//! path: /checkout
//! cookies:
//!   - { name: consent, value: "0", domain: example.com }
//! body:
//!   - tag: div
//!     id: banner
//!     class: cookie-banner visible
//!     children:
//!       - { tag: button, id: accept }
//! ```
//!
//! Supported selectors: `*`, `tag`, `#id`, `.class`, `[attr]`, `[attr=v]`,
//! `[attr^=v]`, `[attr$=v]`, `[attr*=v]`, `[attr~=v]`, descendant and `>`
//! combinators, and comma-separated groups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cookies::{Cookie, CookieJar};
use crate::document::{Document, StyleSheet};
use crate::error::{Result, UncookieError};

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    /// Inline style declarations in insertion order.
    pub style: Vec<(String, String)>,
    pub clicks: u32,
}

impl Element {
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attrs
            .get("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().contains(&class_name)
    }

    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// `None` only for the document root.
    element: Option<Element>,
}

#[derive(Debug, Clone)]
pub struct Page {
    hostname: String,
    nodes: Vec<Node>,
    head_attached: bool,
    style_sheets: BTreeMap<String, StyleSheet>,
    cookies: CookieJar,
    reloads: u32,
}

const ROOT: NodeId = NodeId(0);

impl Page {
    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        Self {
            cookies: CookieJar::new(hostname.clone()),
            hostname,
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                element: None,
            }],
            head_attached: true,
            style_sheets: BTreeMap::new(),
            reloads: 0,
        }
    }

    /// Append a new element under `parent` (the document root when `None`).
    pub fn append(&mut self, parent: Option<NodeId>, element: Element) -> NodeId {
        let parent = parent.unwrap_or(ROOT);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            element: Some(element),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Shorthand for `append` with a tag and attribute pairs.
    pub fn add(&mut self, parent: Option<NodeId>, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let element = Element {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            ..Element::default()
        };
        self.append(parent, element)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node.0).and_then(|n| n.element.as_ref())
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(node.0).and_then(|n| n.element.as_mut())
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ROOT {
                return true;
            }
            cursor = self.nodes[current.0].parent;
        }
        false
    }

    /// Serve the page from `path`; only affects which cookies reads see.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.cookies = self.cookies.with_page_path(path);
        self
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    pub fn set_head_attached(&mut self, attached: bool) {
        self.head_attached = attached;
    }

    pub fn style_sheet_rules(&self, id: &str) -> Option<&StyleSheet> {
        self.style_sheets.get(id)
    }

    pub fn reloads(&self) -> u32 {
        self.reloads
    }

    /// Number of connected elements.
    pub fn element_count(&self) -> usize {
        let mut out = Vec::new();
        self.collect_elements(ROOT, &mut out);
        out.len()
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent.filter(|p| *p != ROOT)
    }

    fn collect_elements(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.nodes[node.0].children {
            out.push(*child);
            self.collect_elements(*child, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Document impl
// ---------------------------------------------------------------------------

impl Document for Page {
    type Node = NodeId;

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        let mut candidates = Vec::new();
        self.collect_elements(ROOT, &mut candidates);
        Ok(candidates
            .into_iter()
            .filter(|node| groups.iter().any(|parts| self.matches_chain(*node, parts)))
            .collect())
    }

    fn remove(&mut self, node: NodeId) {
        if node == ROOT {
            return;
        }
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            match el.style.iter_mut().find(|(p, _)| p == property) {
                Some(entry) => entry.1 = value.to_string(),
                None => el.style.push((property.to_string(), value.to_string())),
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class_name: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let Some(class_attr) = el.attrs.get("class") else {
            return;
        };
        let kept = class_attr
            .split_ascii_whitespace()
            .filter(|c| *c != class_name)
            .collect::<Vec<_>>()
            .join(" ");
        el.attrs.insert("class".into(), kept);
    }

    fn click(&mut self, node: NodeId) -> Result<()> {
        if !self.is_connected(node) {
            return Err(UncookieError::Action("click target is detached".into()));
        }
        let el = self
            .element_mut(node)
            .ok_or_else(|| UncookieError::Action("click target is not an element".into()))?;
        el.clicks += 1;
        Ok(())
    }

    fn cookie(&self) -> String {
        self.cookies.header()
    }

    fn set_cookie(&mut self, directive: &str) {
        self.cookies.write(directive);
    }

    fn style_sheet(&mut self, id: &str) -> Option<&mut StyleSheet> {
        if !self.head_attached {
            return None;
        }
        Some(self.style_sheets.entry(id.to_string()).or_default())
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub clicks: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

fn default_true() -> bool {
    true
}

fn default_page_path() -> String {
    "/".to_string()
}

fn is_root_path(path: &str) -> bool {
    path == "/"
}

/// Serializable form of a [`Page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub hostname: String,
    /// Page path; cookie reads only see cookies whose path covers it.
    #[serde(default = "default_page_path", skip_serializing_if = "is_root_path")]
    pub path: String,
    /// Whether `<head>` exists, i.e. whether the injected stylesheet can attach.
    #[serde(default = "default_true")]
    pub head: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<Cookie>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style_sheets: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub body: Vec<ElementSpec>,
}

impl Page {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let snapshot: PageSnapshot = serde_yaml::from_str(yaml)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_snapshot(snapshot: PageSnapshot) -> Self {
        let mut page = Page::new(snapshot.hostname).with_path(snapshot.path);
        page.head_attached = snapshot.head;
        for cookie in snapshot.cookies {
            page.cookies.insert(cookie);
        }
        for (id, rules) in snapshot.style_sheets {
            let sheet = page.style_sheets.entry(id).or_default();
            for rule in rules {
                let at = sheet.len();
                if let Err(e) = sheet.insert_rule(&rule, at) {
                    tracing::warn!(error = %e, "skipping stylesheet rule in snapshot");
                }
            }
        }
        for spec in snapshot.body {
            page.append_spec(None, spec);
        }
        page
    }

    fn append_spec(&mut self, parent: Option<NodeId>, spec: ElementSpec) -> NodeId {
        let mut attrs = spec.attrs;
        if let Some(id) = spec.id {
            attrs.insert("id".into(), id);
        }
        if let Some(class) = spec.class {
            attrs.insert("class".into(), class);
        }
        let node = self.append(
            parent,
            Element {
                tag: spec.tag.to_ascii_lowercase(),
                attrs,
                style: spec.style,
                clicks: spec.clicks,
            },
        );
        for child in spec.children {
            self.append_spec(Some(node), child);
        }
        node
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            hostname: self.hostname.clone(),
            path: self.cookies.page_path().to_string(),
            head: self.head_attached,
            cookies: self.cookies.cookies().to_vec(),
            style_sheets: self
                .style_sheets
                .iter()
                .map(|(id, sheet)| {
                    let rules = sheet.rules().iter().map(|r| r.css_text.clone()).collect();
                    (id.clone(), rules)
                })
                .collect(),
            body: self.nodes[ROOT.0]
                .children
                .iter()
                .map(|c| self.spec_of(*c))
                .collect(),
        }
    }

    fn spec_of(&self, node: NodeId) -> ElementSpec {
        let n = &self.nodes[node.0];
        let el = n.element.clone().unwrap_or_default();
        let mut attrs = el.attrs;
        let id = attrs.remove("id");
        let class = attrs.remove("class");
        ElementSpec {
            tag: el.tag,
            id,
            class,
            attrs,
            style: el.style,
            clicks: el.clicks,
            children: n.children.iter().map(|c| self.spec_of(*c)).collect(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.snapshot())?)
    }
}

// ---------------------------------------------------------------------------
// Selector matching
// ---------------------------------------------------------------------------

impl Page {
    fn matches_chain(&self, node: NodeId, parts: &[SelectorPart]) -> bool {
        let Some((last, rest)) = parts.split_last() else {
            return false;
        };
        if !self.matches_step(node, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match last.combinator {
            Combinator::Child => self
                .parent_element(node)
                .is_some_and(|parent| self.matches_chain(parent, rest)),
            Combinator::Descendant => {
                let mut cursor = self.parent_element(node);
                while let Some(ancestor) = cursor {
                    if self.matches_chain(ancestor, rest) {
                        return true;
                    }
                    cursor = self.parent_element(ancestor);
                }
                false
            }
        }
    }

    fn matches_step(&self, node: NodeId, step: &SelectorStep) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        if let Some(tag) = &step.tag {
            if !el.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &step.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if step.classes.iter().any(|c| !el.has_class(c)) {
            return false;
        }
        step.attrs.iter().all(|cond| {
            let actual = el.attrs.get(&cond.key);
            match (&cond.op, actual) {
                (_, None) => false,
                (AttrOp::Exists, Some(_)) => true,
                (AttrOp::Eq(v), Some(a)) => a == v,
                (AttrOp::StartsWith(v), Some(a)) => !v.is_empty() && a.starts_with(v.as_str()),
                (AttrOp::EndsWith(v), Some(a)) => !v.is_empty() && a.ends_with(v.as_str()),
                (AttrOp::Contains(v), Some(a)) => !v.is_empty() && a.contains(v.as_str()),
                (AttrOp::Includes(v), Some(a)) => a.split_ascii_whitespace().any(|t| t == v),
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Eq(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Includes(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    key: String,
    op: AttrOp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SelectorStep {
    /// `None` for `*` or when only id/class/attr parts are given.
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    step: SelectorStep,
    // Relation to the part on the left; ignored for the first part.
    combinator: Combinator,
}

fn unsupported(selector: &str) -> UncookieError {
    UncookieError::Selector(selector.to_string())
}

fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    split_outside_brackets(selector, |ch| ch == ',')?
        .into_iter()
        .map(|group| parse_selector_chain(&group, selector))
        .collect()
}

fn parse_selector_chain(group: &str, full: &str) -> Result<Vec<SelectorPart>> {
    let group = group.trim();
    if group.is_empty() {
        return Err(unsupported(full));
    }

    // Pad `>` so it tokenizes on whitespace like the descendant combinator.
    let mut padded = String::with_capacity(group.len() + 4);
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for ch in group.chars() {
        match (ch, quote) {
            ('"' | '\'', None) if depth > 0 => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            ('[', None) => depth += 1,
            (']', None) => depth = depth.saturating_sub(1),
            ('>', None) if depth == 0 => {
                padded.push_str(" > ");
                continue;
            }
            _ => {}
        }
        padded.push(ch);
    }

    let tokens = split_outside_brackets(&padded, |ch| ch.is_ascii_whitespace())?;
    let mut parts = Vec::new();
    let mut pending = Combinator::Descendant;
    let mut saw_child = false;
    for token in tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if token == ">" {
            if parts.is_empty() || saw_child {
                return Err(unsupported(full));
            }
            pending = Combinator::Child;
            saw_child = true;
            continue;
        }
        parts.push(SelectorPart {
            step: parse_selector_step(token, full)?,
            combinator: pending,
        });
        pending = Combinator::Descendant;
        saw_child = false;
    }
    if parts.is_empty() || saw_child {
        return Err(unsupported(full));
    }
    Ok(parts)
}

/// Split on `is_sep` outside `[...]` and quotes.
fn split_outside_brackets(input: &str, is_sep: impl Fn(char) -> bool) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' if depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                if depth == 0 {
                    return Err(unsupported(input));
                }
                depth -= 1;
                current.push(ch);
            }
            c if depth == 0 && is_sep(c) => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(unsupported(input));
    }
    out.push(current);
    Ok(out)
}

fn parse_selector_step(part: &str, full: &str) -> Result<SelectorStep> {
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();
    let mut universal = false;

    while i < bytes.len() {
        match bytes[i] {
            b'*' if i == 0 => {
                universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_ident(part, i + 1).ok_or_else(|| unsupported(full))?;
                if step.id.replace(id).is_some() {
                    return Err(unsupported(full));
                }
                i = next;
            }
            b'.' => {
                let (class, next) = parse_ident(part, i + 1).ok_or_else(|| unsupported(full))?;
                step.classes.push(class);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr(part, i).ok_or_else(|| unsupported(full))?;
                step.attrs.push(cond);
                i = next;
            }
            _ if i == 0 => {
                let (tag, next) = parse_ident(part, 0).ok_or_else(|| unsupported(full))?;
                step.tag = Some(tag);
                i = next;
            }
            // Pseudo-classes and anything else are outside the supported subset.
            _ => return Err(unsupported(full)),
        }
    }

    if !universal
        && step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
    {
        return Err(unsupported(full));
    }
    Ok(step)
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_ident_char(bytes[end]) {
        end += 1;
    }
    (end > start).then(|| (src[start..end].to_string(), end))
}

/// Parse `[key]` or `[key<op>value]` starting at the `[`; returns the index
/// just past `]`.
fn parse_attr(src: &str, open: usize) -> Option<(AttrCondition, usize)> {
    let close = open + src[open..].find(']')?;
    let inner = src[open + 1..close].trim();
    let next = close + 1;

    let op_at = inner.find(|c: char| matches!(c, '=' | '^' | '$' | '*' | '~'));
    let Some(op_at) = op_at else {
        let key = inner.to_ascii_lowercase();
        let valid = !key.is_empty() && key.bytes().all(is_ident_char);
        return valid.then_some((
            AttrCondition {
                key,
                op: AttrOp::Exists,
            },
            next,
        ));
    };

    let key = inner[..op_at].trim().to_ascii_lowercase();
    if key.is_empty() || !key.bytes().all(is_ident_char) {
        return None;
    }
    let rest = &inner[op_at..];
    let (op_len, kind) = match rest.as_bytes() {
        [b'=', ..] => (1, b'='),
        [k @ (b'^' | b'$' | b'*' | b'~'), b'=', ..] => (2, *k),
        _ => return None,
    };
    let raw = rest[op_len..].trim();
    let value = match raw.as_bytes() {
        [q @ (b'"' | b'\''), .., last] if last == q && raw.len() >= 2 => {
            raw[1..raw.len() - 1].to_string()
        }
        _ if raw.bytes().all(is_ident_char) => raw.to_string(),
        _ => return None,
    };
    let op = match kind {
        b'^' => AttrOp::StartsWith(value),
        b'$' => AttrOp::EndsWith(value),
        b'*' => AttrOp::Contains(value),
        b'~' => AttrOp::Includes(value),
        _ => AttrOp::Eq(value),
    };
    Some((AttrCondition { key, op }, next))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
hostname: www.example.com
cookies:
  - { name: consent, value: "0" }
body:
  - tag: div
    id: banner
    class: cookie-banner visible
    attrs: { data-role: "consent dialog" }
    children:
      - { tag: button, id: accept, class: btn primary }
      - { tag: button, class: btn }
  - tag: main
    children:
      - tag: section
        children:
          - { tag: p, class: note }
      - { tag: p }
"#;

    fn page() -> Page {
        Page::from_yaml(PAGE).unwrap()
    }

    fn ids(page: &Page, selector: &str) -> Vec<String> {
        page.query_all(selector)
            .unwrap()
            .into_iter()
            .map(|n| {
                let el = page.element(n).unwrap();
                el.id().map(str::to_string).unwrap_or_else(|| el.tag.clone())
            })
            .collect()
    }

    #[test]
    fn simple_selectors() {
        let p = page();
        assert_eq!(ids(&p, "#banner"), vec!["banner"]);
        assert_eq!(ids(&p, ".btn"), vec!["accept", "button"]);
        assert_eq!(ids(&p, "button.primary"), vec!["accept"]);
        assert_eq!(p.query_all("*").unwrap().len(), 7);
        assert_eq!(ids(&p, "[data-role]"), vec!["banner"]);
        assert_eq!(ids(&p, r#"[data-role="consent dialog"]"#), vec!["banner"]);
        assert_eq!(ids(&p, "[data-role^=consent]"), vec!["banner"]);
        assert_eq!(ids(&p, "[class~=visible]"), vec!["banner"]);
        assert_eq!(ids(&p, "[class*=banner]"), vec!["banner"]);
    }

    #[test]
    fn combinators_and_groups() {
        let p = page();
        assert_eq!(p.query_all("main p").unwrap().len(), 2);
        assert_eq!(p.query_all("main > p").unwrap().len(), 1);
        assert_eq!(p.query_all("main>section>p.note").unwrap().len(), 1);
        assert_eq!(ids(&p, "#banner > .btn, main > p"), vec!["accept", "button", "p"]);
    }

    #[test]
    fn unsupported_selectors_error() {
        let p = page();
        for bad in ["", "div:hover", "a >", "> a", "[x", "a,,b", "#"] {
            assert!(
                matches!(p.query_all(bad), Err(UncookieError::Selector(_))),
                "expected selector error for {bad:?}"
            );
        }
    }

    #[test]
    fn remove_detaches_subtree() {
        let mut p = page();
        let banner = p.query_all("#banner").unwrap()[0];
        p.remove(banner);
        assert!(p.query_all("#banner").unwrap().is_empty());
        assert!(p.query_all("#accept").unwrap().is_empty());
        assert!(!p.is_connected(banner));
        assert_eq!(p.element_count(), 4);
    }

    #[test]
    fn style_class_and_click() {
        let mut p = page();
        let banner = p.query_all("#banner").unwrap()[0];
        p.set_style(banner, "display", "none");
        p.set_style(banner, "display", "block");
        p.remove_class(banner, "visible");
        let el = p.element(banner).unwrap();
        assert_eq!(el.style, vec![("display".to_string(), "block".to_string())]);
        assert_eq!(el.classes(), vec!["cookie-banner"]);

        let accept = p.query_all("#accept").unwrap()[0];
        p.click(accept).unwrap();
        assert_eq!(p.element(accept).unwrap().clicks, 1);
        p.remove(banner);
        assert!(p.click(accept).is_err());
    }

    #[test]
    fn style_sheet_requires_head() {
        let mut p = page();
        p.set_head_attached(false);
        assert!(p.style_sheet("s").is_none());
        p.set_head_attached(true);
        assert!(p.style_sheet("s").is_some());
    }

    #[test]
    fn snapshot_roundtrip_keeps_mutations() {
        let mut p = page();
        let banner = p.query_all("#banner").unwrap()[0];
        p.set_style(banner, "display", "none");
        p.set_cookie("consent=; Max-Age=0; path=/");
        let yaml = p.to_yaml().unwrap();
        let again = Page::from_yaml(&yaml).unwrap();
        assert!(again.cookie().is_empty());
        let banner = again.query_all("#banner").unwrap()[0];
        assert_eq!(again.element(banner).unwrap().style_value("display"), Some("none"));
        assert_eq!(again.element_count(), 7);
    }
}
