//! Build-time twin of the text compiler.
//!
//! Parses the stylesheet with LightningCSS, copies it into an
//! [`OwnedStylesheet`] and works on the tree: every rule declaring
//! `--breakpoint` gets a sibling `:before { content }` rule inserted directly
//! after it.

use crate::error::{BreakpointError, Result};
use crate::style::owned_css::{
    OwnedDeclaration, OwnedMediaRule, OwnedRule, OwnedStyleRule, OwnedStylesheet,
};
use crate::style::synthesized::suppression_rule;
use crate::style::BreakpointCompiler;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::{style::StyleRule, CssRule};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use log::{debug, warn};

/// Walks a parsed CSS tree instead of scanning text.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralCompiler;

impl StructuralCompiler {
    pub fn new() -> Self {
        StructuralCompiler
    }
}

impl BreakpointCompiler for StructuralCompiler {
    fn compile(&self, css: &str) -> String {
        compile(css)
    }
}

/// Parse a raw CSS string (LightningCSS) and convert it to a fully-owned stylesheet.
///
/// With `error_recovery` invalid rules are skipped instead of failing the parse.
pub fn parse_and_own_css(css_text: &str, error_recovery: bool) -> Result<OwnedStylesheet> {
    let parser_opts = ParserOptions {
        error_recovery,
        ..ParserOptions::default()
    };
    let sheet = LightningStyleSheet::parse(css_text, parser_opts)
        .map_err(|e| BreakpointError::CssParse(e.to_string()))?;

    Ok(OwnedStylesheet {
        rules: own_rules(&sheet.rules.0),
    })
}

fn own_rules(rules: &[CssRule<'_>]) -> Vec<OwnedRule> {
    let mut owned_rules = Vec::new();
    for rule in rules {
        match rule {
            CssRule::Style(style_rule) => {
                owned_rules.push(OwnedRule::Style(convert_style_rule(style_rule)));
            }
            CssRule::Media(media_rule) => {
                let query = media_rule
                    .query
                    .to_css_string(PrinterOptions::default())
                    .unwrap_or_default();
                owned_rules.push(OwnedRule::Media(OwnedMediaRule {
                    query,
                    rules: own_rules(&media_rule.rules.0),
                }));
            }
            other => match other.to_css_string(PrinterOptions::default()) {
                Ok(text) if !text.trim().is_empty() => owned_rules.push(OwnedRule::Other(text)),
                Ok(_) => {}
                Err(e) => debug!("dropping rule that failed to print: {}", e),
            },
        }
    }
    owned_rules
}

fn own_declaration(property: &Property<'_>, important: bool) -> OwnedDeclaration {
    OwnedDeclaration {
        property: property.property_id().name().to_string(),
        value: property
            .value_to_css_string(PrinterOptions::default())
            .unwrap_or_default()
            .trim()
            .to_string(),
        important,
    }
}

fn print_selectors(style_rule: &StyleRule<'_>) -> Vec<String> {
    style_rule
        .selectors
        .0
        .iter()
        .filter_map(|selector| selector.to_css_string(Default::default()).ok())
        .collect()
}

/// Canonical text of a selector list, as LightningCSS prints it, so that
/// `div>p` and `div > p` or `[a='x']` and `[a="x"]` share one marker key.
///
/// Text that is not exactly one valid selector list is only trimmed and
/// whitespace-collapsed.
pub fn selector_key(selector: &str) -> String {
    let trimmed = selector.trim();
    let rule_text = format!("{trimmed}{{color:red}}");
    if let Ok(sheet) = LightningStyleSheet::parse(&rule_text, ParserOptions::default()) {
        if let [CssRule::Style(style_rule)] = sheet.rules.0.as_slice() {
            let selectors = print_selectors(style_rule);
            if !selectors.is_empty() {
                return selectors.join(", ");
            }
        }
    }
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Helper to copy a single StyleRule's selectors + declarations into OwnedStyleRule.
fn convert_style_rule(style_rule: &StyleRule<'_>) -> OwnedStyleRule {
    let selectors = print_selectors(style_rule);

    let block = &style_rule.declarations;
    let declarations = block
        .declarations
        .iter()
        .map(|property| own_declaration(property, false))
        .chain(
            block
                .important_declarations
                .iter()
                .map(|property| own_declaration(property, true)),
        )
        .collect();

    OwnedStyleRule {
        selectors,
        declarations,
    }
}

/// Inserts a content rule after every breakpoint-declaring rule, at the same
/// nesting level. Returns the number of rules inserted.
pub fn insert_content_rules(sheet: &mut OwnedStylesheet) -> usize {
    insert_into(&mut sheet.rules)
}

fn insert_into(rules: &mut Vec<OwnedRule>) -> usize {
    let mut inserted = 0;
    let mut index = 0;
    while index < rules.len() {
        let synthesized = match &mut rules[index] {
            OwnedRule::Style(style_rule) => style_rule
                .content_rule()
                .map(|content| OwnedStyleRule::from(&content)),
            OwnedRule::Media(media_rule) => {
                inserted += insert_into(&mut media_rule.rules);
                None
            }
            OwnedRule::Other(_) => None,
        };
        index += 1;
        if let Some(rule) = synthesized {
            rules.insert(index, OwnedRule::Style(rule));
            inserted += 1;
            index += 1;
        }
    }
    inserted
}

/// The build-time transform: the whole stylesheet with content rules inserted
/// and, when any were, the suppression rule appended.
pub fn prop_to_content(css: &str) -> Result<String> {
    let mut sheet = parse_and_own_css(css, false)?;
    let inserted = insert_content_rules(&mut sheet);
    debug!("inserted {} content rules", inserted);
    if inserted > 0 {
        sheet.rules.push(OwnedRule::Other(suppression_rule()));
    }
    Ok(sheet.to_string())
}

/// Only the synthesized rules, in the same order and shape as the text compiler.
pub fn compile(css: &str) -> String {
    let sheet = match parse_and_own_css(css, true) {
        Ok(sheet) => sheet,
        Err(e) => {
            warn!("skipping stylesheet: {}", e);
            return String::new();
        }
    };

    let mut plain = String::new();
    let mut grouped = String::new();
    for rule in &sheet.rules {
        match rule {
            OwnedRule::Style(style_rule) => {
                if let Some(content) = style_rule.content_rule() {
                    plain.push_str(&content.to_string());
                }
            }
            OwnedRule::Media(media_rule) => {
                let inner: String = media_rule
                    .rules
                    .iter()
                    .filter_map(|rule| match rule {
                        OwnedRule::Style(style_rule) => style_rule.content_rule(),
                        _ => None,
                    })
                    .map(|content| content.to_string())
                    .collect();
                if !inner.is_empty() {
                    grouped.push_str(&format!("@media {}{{{}}}", media_rule.query, inner));
                }
            }
            OwnedRule::Other(_) => {}
        }
    }

    let mut output = plain;
    output.push_str(&grouped);
    if !output.is_empty() {
        output.push_str(&suppression_rule());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn owns_media_and_declarations() {
        let sheet = parse_and_own_css(
            "@media (min-width: 600px) { .b { color: red; --breakpoint: medium; } }",
            false,
        )
        .unwrap();
        let OwnedRule::Media(media) = &sheet.rules[0] else {
            panic!("expected a media rule, got {:?}", sheet.rules[0]);
        };
        assert!(media.query.contains("600px"), "query was {}", media.query);
        let OwnedRule::Style(rule) = &media.rules[0] else {
            panic!("expected a style rule");
        };
        assert_eq!(rule.selectors, vec![".b".to_string()]);
        assert_eq!(rule.breakpoint().as_deref(), Some("medium"));
    }

    #[test]
    fn inserts_sibling_after_original() {
        let mut sheet =
            parse_and_own_css(".a { --breakpoint: small; } .c { color: red; }", false).unwrap();
        assert_eq!(insert_content_rules(&mut sheet), 1);
        let selectors: Vec<String> = sheet
            .rules
            .iter()
            .map(|rule| match rule {
                OwnedRule::Style(style) => style.selector_text(),
                other => other.to_string(),
            })
            .collect();
        assert_eq!(
            selectors,
            vec![
                ".a".to_string(),
                r#"[data-selector=".a__detectBreakpoint__"]:before"#.to_string(),
                ".c".to_string(),
            ]
        );
    }

    #[test]
    fn prop_to_content_keeps_original_rules() {
        let out = prop_to_content(".a { color: blue; --breakpoint: small; }").unwrap();
        assert!(out.contains("color: blue"));
        assert!(out.contains(r#"content: "small";"#));
        assert!(out.trim_end().ends_with("[data-selector]:before{display:none}"));
    }

    #[test]
    fn prop_to_content_without_declarations_adds_nothing() {
        let out = prop_to_content(".a { color: blue; }").unwrap();
        assert!(!out.contains("data-selector"));
    }

    #[test]
    fn selector_key_ignores_spelling() {
        assert_eq!(selector_key(".a,.b"), selector_key(" .a ,\n .b "));
        assert_eq!(selector_key("div>p"), selector_key("div > p"));
        assert_eq!(selector_key("a[href='x']"), selector_key(r#"a[href="x"]"#));
        assert_eq!(selector_key(".a::before"), selector_key(".a:before"));
        assert_ne!(selector_key(".a .b"), selector_key(".a.b"));
        assert_eq!(selector_key(".a, .b"), ".a, .b");
    }

    #[test]
    fn selector_key_keeps_unparseable_text() {
        assert_eq!(selector_key("  .a   %% "), ".a %%");
        assert_eq!(selector_key(""), "");
    }

    #[test]
    fn compile_matches_text_shape() {
        assert_eq!(
            compile(".a{--breakpoint:small;}"),
            concat!(
                r#"[data-selector=".a__detectBreakpoint__"]:before{content:"small";display:none}"#,
                "[data-selector]:before{display:none}"
            )
        );
        assert_eq!(compile(".a{color:red}"), "");
    }
}
