//! Action interpreter.
//!
//! One [`Interpreter::interpret`] call is one pass: the schema is flattened
//! into an ordered list of [`Action`]s, each action runs to completion
//! (including its whole `onSuccess` / `onError` chain) before the next one
//! starts, and the effect counters are reported to the [`Messenger`] once at
//! the end.
//!
//! ```text
//! schema ──normalize──▶ [Action, Action, ...]
//!                           │
//!                           ▼
//!            delay? ─▶ apply(op) ─▶ ok ? onSuccess : onError ─▶ ...
//!                           │
//!                           ▼
//!             counters ──▶ Message::UpdateCounter (once, if non-zero)
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::action::{Action, Op};
use crate::cookies::cookie_date;
use crate::document::Document;
use crate::error::{Result, UncookieError};
use crate::handler::base_domain;
use crate::message::{Message, Messenger};

/// `id` of the single `<style>` element the interpreter injects.
pub const STYLE_SHEET_ID: &str = "un-cookie-styles";

/// Default bound on chain length and group nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Counters / summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EffectCounters {
    pub elements: u64,
    pub cookies: u64,
}

impl EffectCounters {
    pub fn total(&self) -> u64 {
        self.elements + self.cookies
    }
}

/// Result of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EffectSummary {
    pub elements: u64,
    pub cookies: u64,
    /// Actions executed, chained ones included.
    pub executed: usize,
    /// Actions that failed or errored.
    pub failed: usize,
    /// `true` when a `reload` ended the pass early.
    pub halted: bool,
}

impl EffectSummary {
    pub fn total(&self) -> u64 {
        self.elements + self.cookies
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

pub struct Interpreter<M> {
    messenger: M,
    /// selector → injected rule text.
    styles: BTreeMap<String, String>,
    counters: EffectCounters,
    max_depth: usize,
    executed: usize,
    failed: usize,
    halted: bool,
}

impl<M: Messenger> Interpreter<M> {
    pub fn new(messenger: M) -> Self {
        Self {
            messenger,
            styles: BTreeMap::new(),
            counters: EffectCounters::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            executed: 0,
            failed: 0,
            halted: false,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn style_registry(&self) -> &BTreeMap<String, String> {
        &self.styles
    }

    pub fn counters(&self) -> EffectCounters {
        self.counters
    }

    /// Forget injected styles and counters. Rules already in the document's
    /// stylesheet are left in place.
    pub fn reset(&mut self) {
        self.styles.clear();
        self.start_pass();
    }

    fn start_pass(&mut self) {
        self.counters = EffectCounters::default();
        self.executed = 0;
        self.failed = 0;
        self.halted = false;
    }

    /// Run one pass of `schema` against `doc`.
    pub async fn interpret<D: Document>(&mut self, schema: &Value, doc: &mut D) -> EffectSummary {
        self.start_pass();

        let mut actions = Vec::new();
        self.normalize(schema, 0, &mut actions);
        tracing::debug!(count = actions.len(), host = doc.hostname(), "interpreting actions");

        for action in &actions {
            if self.halted {
                break;
            }
            self.run_chain(action, doc).await;
        }

        let summary = EffectSummary {
            elements: self.counters.elements,
            cookies: self.counters.cookies,
            executed: self.executed,
            failed: self.failed,
            halted: self.halted,
        };
        if summary.total() > 0 {
            self.messenger.send(Message::UpdateCounter {
                count: summary.total(),
            });
            tracing::info!(
                elements = summary.elements,
                cookies = summary.cookies,
                "removed {} elements and {} cookies",
                summary.elements,
                summary.cookies
            );
        }
        summary
    }

    /// Flatten nested sequences and `{actions: [...]}` groups.
    fn normalize(&self, value: &Value, depth: usize, out: &mut Vec<Action>) {
        if depth > self.max_depth {
            tracing::warn!(
                error = %UncookieError::ChainTooDeep(self.max_depth),
                "skipping nested action group"
            );
            return;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    self.normalize(item, depth + 1, out);
                }
            }
            Value::Object(obj) => match obj.get("actions").and_then(Value::as_array) {
                Some(actions) => out.extend(actions.iter().map(Action::from_value)),
                None => out.push(Action::from_value(value)),
            },
            other => out.push(Action::from_value(other)),
        }
    }

    /// Run `first` and follow its chain until a link has no follow-up.
    async fn run_chain<D: Document>(&mut self, first: &Action, doc: &mut D) {
        let mut current = first;
        let mut depth = 0usize;
        loop {
            if let Some(delay) = current.delay {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "delaying action");
                tokio::time::sleep(delay).await;
            }

            let ok = self.execute(&current.op, doc);
            if self.halted {
                return;
            }

            let next = if ok {
                current.on_success.as_deref()
            } else {
                current.on_error.as_deref()
            };
            let Some(next) = next else {
                return;
            };
            if depth >= self.max_depth {
                tracing::warn!(
                    error = %UncookieError::ChainTooDeep(self.max_depth),
                    "dropping chained action"
                );
                return;
            }
            tracing::debug!(
                branch = if ok { "onSuccess" } else { "onError" },
                "executing chained action"
            );
            current = next;
            depth += 1;
        }
    }

    /// Apply one op; errors are logged and count as failure.
    fn execute<D: Document>(&mut self, op: &Op, doc: &mut D) -> bool {
        self.executed += 1;
        let ok = match self.apply(op, doc) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(action = op.name(), error = %e, "error executing action");
                false
            }
        };
        if !ok {
            self.failed += 1;
        }
        ok
    }

    fn apply<D: Document>(&mut self, op: &Op, doc: &mut D) -> Result<bool> {
        match op {
            Op::Log(text) => {
                tracing::info!("{text}");
                Ok(true)
            }
            Op::Click { target } => {
                let Some(first) = doc.query_all(target)?.first().copied() else {
                    tracing::warn!(selector = %target, "click target not found");
                    return Ok(false);
                };
                doc.click(first)?;
                tracing::debug!(selector = %target, "clicked element");
                Ok(true)
            }
            Op::Remove { target } => {
                let nodes = doc.query_all(target)?;
                for node in &nodes {
                    doc.remove(*node);
                    self.counters.elements += 1;
                }
                Ok(!nodes.is_empty())
            }
            Op::Hide { target } => {
                let hide = [("display".to_string(), "none".to_string())];
                apply_style(doc, target, &hide)
            }
            Op::Style {
                target,
                declarations,
            } => apply_style(doc, target, declarations),
            Op::RemoveClass { target, class_name } => {
                let nodes = doc.query_all(target)?;
                for node in &nodes {
                    doc.remove_class(*node, class_name);
                }
                Ok(!nodes.is_empty())
            }
            Op::ClearCookie { name } => Ok(self.clear_cookie(doc, name)),
            Op::ClearAllCookies => Ok(self.clear_all_cookies(doc)),
            Op::AddGlobalStyle {
                selector,
                declarations,
            } => self.add_global_style(doc, selector, declarations),
            Op::RemoveGlobalStyle { selector } => self.remove_global_style(doc, selector),
            Op::Reload => {
                tracing::info!("reloading page");
                doc.reload();
                self.halted = true;
                Ok(true)
            }
            Op::Invalid(reason) => Err(UncookieError::Action(reason.clone())),
        }
    }

    // -- cookies ------------------------------------------------------------

    /// Write every scoping variant that could have set `name`. Succeeds only
    /// when the cookie was readable before and is gone afterwards.
    fn clear_cookie<D: Document>(&mut self, doc: &mut D, name: &str) -> bool {
        let present = cookie_names(&doc.cookie()).any(|n| n == name);
        tracing::debug!(cookie = name, present, "clearing cookie");

        let host = doc.hostname().to_string();
        let base = base_domain(&host);
        let past = cookie_date(DateTime::<Utc>::UNIX_EPOCH);
        let mut directives = vec![
            format!("{name}=; Max-Age=0; path=/; domain={host}"),
            format!("{name}=; Max-Age=0; path=/"),
            format!("{name}=; Max-Age=0; path=/; domain=.{host}"),
            format!("{name}=; expires={past}; path=/; domain={host}"),
            format!("{name}=; expires={past}; path=/"),
        ];
        if base != host {
            directives.push(format!("{name}=; Max-Age=0; path=/; domain=.{base}"));
        }
        for directive in &directives {
            doc.set_cookie(directive);
        }

        if !present {
            return false;
        }
        if cookie_names(&doc.cookie()).any(|n| n == name) {
            tracing::warn!(cookie = name, "cookie survived every clearing write");
            return false;
        }
        self.counters.cookies += 1;
        true
    }

    fn clear_all_cookies<D: Document>(&mut self, doc: &mut D) -> bool {
        let header = doc.cookie();
        let names: Vec<String> = cookie_names(&header).map(str::to_string).collect();
        tracing::debug!(count = names.len(), "clearing all cookies");

        let past = cookie_date(DateTime::<Utc>::UNIX_EPOCH);
        for name in &names {
            doc.set_cookie(&format!("{name}=; expires={past}; path=/;"));
            self.counters.cookies += 1;
        }
        self.messenger.send(Message::ClearAllCookies);
        true
    }

    // -- global styles ------------------------------------------------------

    fn add_global_style<D: Document>(
        &mut self,
        doc: &mut D,
        selector: &str,
        declarations: &[(String, String)],
    ) -> Result<bool> {
        let css = declarations
            .iter()
            .map(|(prop, value)| format!("{prop}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        let rule = format!("{selector} {{ {css} }}");

        let Some(sheet) = doc.style_sheet(STYLE_SHEET_ID) else {
            tracing::warn!(error = %UncookieError::StyleSheetDetached, selector, "cannot add global style");
            return Ok(false);
        };
        let at = sheet.len();
        sheet.insert_rule(&rule, at)?;
        tracing::debug!(rule = %rule, "added global style");
        self.styles.insert(selector.to_string(), rule);
        Ok(true)
    }

    fn remove_global_style<D: Document>(&mut self, doc: &mut D, selector: &str) -> Result<bool> {
        let Some(sheet) = doc.style_sheet(STYLE_SHEET_ID) else {
            tracing::warn!(error = %UncookieError::StyleSheetDetached, selector, "cannot remove global style");
            return Ok(false);
        };
        let Some(index) = sheet
            .rules()
            .iter()
            .position(|rule| rule.selector_text == selector)
        else {
            return Ok(false);
        };
        sheet.delete_rule(index)?;
        self.styles.remove(selector);
        tracing::debug!(selector, "removed global style");
        Ok(true)
    }
}

fn apply_style<D: Document>(
    doc: &mut D,
    target: &str,
    declarations: &[(String, String)],
) -> Result<bool> {
    let nodes = doc.query_all(target)?;
    for node in &nodes {
        for (prop, value) in declarations {
            doc.set_style(*node, prop, value);
        }
    }
    Ok(!nodes.is_empty())
}

/// Names in a `document.cookie` header.
fn cookie_names(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(';')
        .map(|pair| pair.split('=').next().unwrap_or("").trim())
        .filter(|name| !name.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
