// A fully-owned copy of a parsed stylesheet, detached from the parser's input lifetime.
use crate::style::declaration::{self, BREAKPOINT_PROPERTY};
use crate::style::synthesized::ContentRule;
use std::fmt;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OwnedStylesheet {
    pub rules: Vec<OwnedRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OwnedRule {
    Style(OwnedStyleRule),
    Media(OwnedMediaRule),
    /// Any other rule, kept as printed by the parser.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnedStyleRule {
    /// e.g. "div", ".red", "#header"
    pub selectors: Vec<String>,
    pub declarations: Vec<OwnedDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnedMediaRule {
    /// The media query list, e.g. "screen and (min-width: 600px)".
    pub query: String,
    pub rules: Vec<OwnedRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnedDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl OwnedStyleRule {
    pub fn selector_text(&self) -> String {
        self.selectors.join(", ")
    }

    /// The breakpoint this rule declares. `!important` declarations beat
    /// normal ones; otherwise the last declaration wins.
    pub fn breakpoint(&self) -> Option<String> {
        let mut winner: Option<&OwnedDeclaration> = None;
        for decl in &self.declarations {
            if decl.property != BREAKPOINT_PROPERTY {
                continue;
            }
            if winner.map_or(true, |current| decl.important || !current.important) {
                winner = Some(decl);
            }
        }
        winner
            .and_then(|decl| declaration::breakpoint_name(&decl.value))
            .map(str::to_string)
    }

    pub fn content_rule(&self) -> Option<ContentRule> {
        let breakpoint = self.breakpoint()?;
        Some(ContentRule::new(&self.selector_text(), &breakpoint))
    }
}

impl From<&ContentRule> for OwnedStyleRule {
    fn from(rule: &ContentRule) -> Self {
        OwnedStyleRule {
            selectors: vec![rule.selector.pseudo_selector()],
            declarations: vec![
                OwnedDeclaration {
                    property: "content".to_string(),
                    value: rule.content_value(),
                    important: false,
                },
                OwnedDeclaration {
                    property: "display".to_string(),
                    value: "none".to_string(),
                    important: false,
                },
            ],
        }
    }
}

impl fmt::Display for OwnedStylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl fmt::Display for OwnedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnedRule::Style(rule) => write!(f, "{}", rule),
            OwnedRule::Media(rule) => write!(f, "{}", rule),
            OwnedRule::Other(text) => writeln!(f, "{}", text),
        }
    }
}

impl fmt::Display for OwnedStyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.selector_text())?;
        for decl in &self.declarations {
            let important = if decl.important { " !important" } else { "" };
            writeln!(f, "  {}: {}{};", decl.property, decl.value, important)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for OwnedMediaRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@media {} {{", self.query)?;
        for rule in &self.rules {
            write!(f, "{}", rule)?;
        }
        writeln!(f, "}}")
    }
}
