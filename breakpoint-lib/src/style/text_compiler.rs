//! Regex-based stylesheet compiler used at runtime, where no CSS tree is available.

use crate::style::rule::{self, GroupRule, StyleRule};
use crate::style::synthesized::suppression_rule;
use crate::style::BreakpointCompiler;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::unwrap_used)] // Constant patterns, known to be valid
static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
#[allow(clippy::unwrap_used)]
static RE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());
#[allow(clippy::unwrap_used)]
static RE_AT_STATEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[\w-]+[^{};]*;").unwrap());
/// An at-rule header followed by a block of simple `selector{body}` rules.
#[allow(clippy::unwrap_used)]
static RE_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([\w-]+)([^{}]*)\{((?:[^{}]*\{[^{}]*\})*[^{}]*)\}").unwrap()
});
#[allow(clippy::unwrap_used)]
static RE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^{}]+\{[^{}]*\}").unwrap());

/// Scans stylesheet text with regular expressions.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCompiler;

impl TextCompiler {
    pub fn new() -> Self {
        TextCompiler
    }
}

impl BreakpointCompiler for TextCompiler {
    fn compile(&self, css: &str) -> String {
        compile(css)
    }
}

fn parse_rules(css: &str) -> Vec<StyleRule> {
    RE_RULE
        .find_iter(css)
        .filter_map(|m| StyleRule::parse(m.as_str()))
        .collect()
}

/// Compiles `css` into the equivalent pseudo-element stylesheet.
pub fn compile(css: &str) -> String {
    let css = RE_COMMENT.replace_all(css, "");
    let css = RE_NEWLINE.replace_all(&css, " ");
    let css = RE_AT_STATEMENT.replace_all(&css, "");

    let mut grouped = String::new();
    for caps in RE_GROUP.captures_iter(&css) {
        if !caps[1].eq_ignore_ascii_case("media") {
            debug!("skipping unsupported @{} block", &caps[1]);
            continue;
        }
        let group = GroupRule {
            header: format!("@media {}", caps[2].trim()),
            rules: parse_rules(&caps[3]),
        };
        grouped.push_str(&group.transform());
    }
    let top_level = RE_GROUP.replace_all(&css, "");

    let mut output: String = parse_rules(&top_level).iter().map(rule::transform).collect();
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
    fn compiles_single_rule() {
        assert_eq!(
            compile(".a{--breakpoint:small;}"),
            concat!(
                r#"[data-selector=".a__detectBreakpoint__"]:before{content:"small";display:none}"#,
                "[data-selector]:before{display:none}"
            )
        );
    }

    #[test]
    fn empty_without_declarations() {
        assert_eq!(compile(".a { color: red } @media print { .b { color: blue } }"), "");
        assert_eq!(compile(""), "");
    }

    #[test]
    fn output_does_not_recompile() {
        let once = compile(".a{--breakpoint:small;}");
        assert_eq!(compile(&once), "");
    }

    #[test]
    fn media_groups_are_kept_and_plain_rules_come_first() {
        let css = "@media (min-width:600px){.b{--breakpoint:medium;}} .c{color:red;} .a{--breakpoint:small}";
        assert_eq!(
            compile(css),
            concat!(
                r#"[data-selector=".a__detectBreakpoint__"]:before{content:"small";display:none}"#,
                r#"@media (min-width:600px){[data-selector=".b__detectBreakpoint__"]:before{content:"medium";display:none}}"#,
                "[data-selector]:before{display:none}"
            )
        );
    }

    #[test]
    fn comments_are_ignored() {
        let css = "/* .x { --breakpoint: commented; } */\n.a {\n  /* --breakpoint: nope; */\n  --breakpoint: real;\n}";
        let out = compile(css);
        assert!(out.contains(r#"content:"real""#));
        assert!(!out.contains("commented"));
        assert!(!out.contains("nope"));
    }

    #[test]
    fn other_at_rules_are_dropped() {
        let css = r#"@import url("x.css"); @font-face { font-family: x; src: url(x.woff) }
            @supports (display:grid) { .s { --breakpoint: grid; } }
            .a { --breakpoint: small; }"#;
        let out = compile(css);
        assert!(out.contains(".a__detectBreakpoint__"));
        assert!(!out.contains("grid"));
        assert!(!out.contains("font-face"));
    }
}
