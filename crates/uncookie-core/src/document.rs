//! Host boundary: the live document the interpreter mutates.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UncookieError};

/// Operations the interpreter needs from a page.
///
/// Element handles are opaque to the interpreter. Selector errors surface as
/// `Err` from [`Document::query_all`] and are treated as a failed action.
pub trait Document {
    type Node: Copy + std::fmt::Debug;

    fn hostname(&self) -> &str;

    /// All connected elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Node>>;

    fn remove(&mut self, node: Self::Node);

    fn set_style(&mut self, node: Self::Node, property: &str, value: &str);

    fn remove_class(&mut self, node: Self::Node, class_name: &str);

    fn click(&mut self, node: Self::Node) -> Result<()>;

    /// Read side of `document.cookie`.
    fn cookie(&self) -> String;

    /// Write side of `document.cookie`.
    fn set_cookie(&mut self, directive: &str);

    /// The injected `<style>` element's sheet, created on first access.
    /// `None` while the document has nowhere to attach it.
    fn style_sheet(&mut self, id: &str) -> Option<&mut StyleSheet>;

    fn reload(&mut self);
}

// ---------------------------------------------------------------------------
// StyleSheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssRule {
    pub selector_text: String,
    pub css_text: String,
}

/// Ordered rule list of one stylesheet (`CSSStyleSheet.cssRules`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheet {
    rules: Vec<CssRule>,
}

impl StyleSheet {
    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Insert `rule` (`selector { decls }`) at `index`.
    pub fn insert_rule(&mut self, rule: &str, index: usize) -> Result<usize> {
        let Some((selector, rest)) = rule.split_once('{') else {
            return Err(UncookieError::Action(format!("malformed css rule: {rule}")));
        };
        let selector = selector.trim();
        if selector.is_empty() || !rest.trim_end().ends_with('}') {
            return Err(UncookieError::Action(format!("malformed css rule: {rule}")));
        }
        if index > self.rules.len() {
            return Err(UncookieError::Action(format!(
                "rule index {index} out of range"
            )));
        }
        self.rules.insert(
            index,
            CssRule {
                selector_text: selector.to_string(),
                css_text: rule.trim().to_string(),
            },
        );
        Ok(index)
    }

    pub fn delete_rule(&mut self, index: usize) -> Result<()> {
        if index >= self.rules.len() {
            return Err(UncookieError::Action(format!(
                "rule index {index} out of range"
            )));
        }
        self.rules.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_delete_rules() {
        let mut sheet = StyleSheet::default();
        sheet.insert_rule("body { overflow: auto; }", 0).unwrap();
        sheet.insert_rule(".modal { display: none; }", 1).unwrap();
        assert_eq!(sheet.rules()[1].selector_text, ".modal");
        sheet.delete_rule(0).unwrap();
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rules()[0].css_text, ".modal { display: none; }");
    }

    #[test]
    fn rejects_malformed_rules() {
        let mut sheet = StyleSheet::default();
        assert!(sheet.insert_rule("no braces here", 0).is_err());
        assert!(sheet.insert_rule("{ color: red; }", 0).is_err());
        assert!(sheet.insert_rule("a { color: red; }", 3).is_err());
        assert!(sheet.delete_rule(0).is_err());
    }
}
