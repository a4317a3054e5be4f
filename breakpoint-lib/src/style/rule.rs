//! Turns one `selector { body }` rule into its pseudo-element substitute.

use crate::style::declaration;
use crate::style::synthesized::ContentRule;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::unwrap_used)] // Constant pattern, known to be valid
static RE_RULE_PARTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^{]*)\{([^}]*)\}").unwrap());
#[allow(clippy::unwrap_used)]
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A plain rule: the text before the braces and the text between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: String,
    pub body: String,
}

/// A grouping construct (`@media ...`) and the rules nested in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    pub header: String,
    pub rules: Vec<StyleRule>,
}

impl StyleRule {
    /// Splits raw `selector { body }` text on its first brace pair.
    ///
    /// Returns `None` for text without braces and for at-rules, which only the
    /// grouping pass of the compiler handles.
    pub fn parse(raw_rule: &str) -> Option<StyleRule> {
        let caps = RE_RULE_PARTS.captures(raw_rule.trim_start())?;
        let selector = RE_WHITESPACE.replace_all(caps[1].trim(), " ").into_owned();
        if selector.is_empty() || selector.contains('@') {
            return None;
        }
        Some(StyleRule {
            selector,
            body: caps[2].to_string(),
        })
    }

    pub fn content_rule(&self) -> Option<ContentRule> {
        let breakpoint = declaration::scan(&self.body)?;
        debug!("`{}` declares breakpoint `{}`", self.selector, breakpoint);
        Some(ContentRule::new(&self.selector, &breakpoint))
    }
}

impl GroupRule {
    /// The group re-emitted around its transformed rules, or an empty string
    /// when none of them declares a breakpoint.
    pub fn transform(&self) -> String {
        let inner: String = self.rules.iter().map(transform).collect();
        if inner.is_empty() {
            return String::new();
        }
        format!("{}{{{}}}", self.header, inner)
    }
}

/// The substitute rule for `rule`, or an empty string when it declares no breakpoint.
pub fn transform(rule: &StyleRule) -> String {
    rule.content_rule()
        .map(|content| content.to_string())
        .unwrap_or_default()
}

/// Text form of [`transform`]: parses `raw_rule` first. Malformed rules and
/// at-rules produce an empty string.
pub fn transform_rule(raw_rule: &str) -> String {
    StyleRule::parse(raw_rule)
        .map(|rule| transform(&rule))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_selector_and_body() {
        let rule = StyleRule::parse("  .a ,\t.b  { color: red; --breakpoint: big; }").unwrap();
        assert_eq!(rule.selector, ".a , .b");
        assert_eq!(rule.body, " color: red; --breakpoint: big; ");
    }

    #[test]
    fn transforms_breakpoint_rule() {
        assert_eq!(
            transform_rule(".a{--breakpoint:small;}"),
            r#"[data-selector=".a__detectBreakpoint__"]:before{content:"small";display:none}"#
        );
    }

    #[test]
    fn skips_rules_without_output() {
        assert_eq!(transform_rule(".c{color:red;}"), "");
        assert_eq!(transform_rule("@font-face{--breakpoint:small;}"), "");
        assert_eq!(transform_rule("no braces here"), "");
    }

    #[test]
    fn empty_groups_are_dropped() {
        let group = GroupRule {
            header: "@media (min-width:600px)".into(),
            rules: vec![StyleRule {
                selector: ".c".into(),
                body: "color:red".into(),
            }],
        };
        assert_eq!(group.transform(), "");
    }
}
