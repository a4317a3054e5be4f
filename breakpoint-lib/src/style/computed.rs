use crate::dom::dom_tree::{self, Document, NodeRef};
use crate::host::StyleHost;
use crate::style::css_matcher::{matches_selector_list, parse_selector_list, ComplexSelector, PseudoElement};
use crate::style::media::media_matches;
use crate::style::owned_css::{OwnedDeclaration, OwnedRule};
use crate::style::structural::parse_and_own_css;
use log::warn;
use std::collections::{HashMap, HashSet};

/// Represents final set of CSS properties an element (or pseudo-element) gets.
#[derive(Default, Clone, Debug)]
pub struct ComputedStyle {
    pub properties: HashMap<String, String>,
}

impl ComputedStyle {
    pub fn new() -> Self {
        ComputedStyle {
            properties: HashMap::new(),
        }
    }
}

/// A style rule whose media conditions already matched.
#[derive(Debug)]
struct ActiveRule {
    selectors: Vec<ComplexSelector>,
    declarations: Vec<OwnedDeclaration>,
}

/// A document-only host: evaluates the `<style>` sheets of a [`Document`] at a
/// fixed viewport width.
///
/// Cascade is textual order (last declaration wins, `!important` first);
/// specificity is not considered. Custom properties inherit.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    viewport_width: f32,
    custom_properties: bool,
    computed_style: bool,
}

impl HeadlessHost {
    pub fn new(viewport_width: f32) -> Self {
        HeadlessHost {
            viewport_width,
            custom_properties: true,
            computed_style: true,
        }
    }

    /// Emulates a host that drops custom properties and `var()` references.
    pub fn with_custom_properties(mut self, supported: bool) -> Self {
        self.custom_properties = supported;
        self
    }

    /// Emulates a host with no computed-style query at all.
    pub fn with_computed_style(mut self, supported: bool) -> Self {
        self.computed_style = supported;
        self
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    fn keeps(&self, decl: &OwnedDeclaration) -> bool {
        self.custom_properties || !(decl.property.starts_with("--") || decl.value.contains("var("))
    }

    fn collect_rules(&self, rules: Vec<OwnedRule>, out: &mut Vec<ActiveRule>) {
        for rule in rules {
            match rule {
                OwnedRule::Style(style_rule) => {
                    let selectors = parse_selector_list(&style_rule.selector_text());
                    let declarations = style_rule
                        .declarations
                        .into_iter()
                        .filter(|decl| self.keeps(decl))
                        .collect();
                    out.push(ActiveRule {
                        selectors,
                        declarations,
                    });
                }
                OwnedRule::Media(media_rule) => {
                    if media_matches(&media_rule.query, self.viewport_width) {
                        self.collect_rules(media_rule.rules, out);
                    }
                }
                OwnedRule::Other(_) => {}
            }
        }
    }

    fn active_rules(&self, document: &Document) -> Vec<ActiveRule> {
        let mut rules = Vec::new();
        for css in document.style_texts() {
            match parse_and_own_css(&css, true) {
                Ok(sheet) => self.collect_rules(sheet.rules, &mut rules),
                Err(e) => warn!("ignoring unparseable <style>: {}", e),
            }
        }
        rules
    }

    /// Computes the declared properties of `element` (or its pseudo-element).
    pub fn compute_style(
        &self,
        document: &Document,
        element: &NodeRef,
        pseudo: Option<PseudoElement>,
    ) -> ComputedStyle {
        compute_element_style(element, pseudo, &self.active_rules(document))
    }
}

/// Build a ComputedStyle by applying every matching rule in order.
fn compute_element_style(
    element: &NodeRef,
    pseudo: Option<PseudoElement>,
    rules: &[ActiveRule],
) -> ComputedStyle {
    let mut final_style = ComputedStyle::new();
    let mut important = HashSet::new();

    for rule in rules {
        if !matches_selector_list(element, &rule.selectors, pseudo) {
            continue;
        }
        for decl in &rule.declarations {
            if decl.important {
                important.insert(decl.property.clone());
            } else if important.contains(&decl.property) {
                continue;
            }
            final_style
                .properties
                .insert(decl.property.clone(), decl.value.clone());
        }
    }
    final_style
}

impl StyleHost for HeadlessHost {
    fn inline_style_length(&self, css_text: &str) -> usize {
        let wrapped = format!("*{{{}}}", css_text);
        let Ok(sheet) = parse_and_own_css(&wrapped, true) else {
            return 0;
        };
        match sheet.rules.first() {
            Some(OwnedRule::Style(rule)) => rule
                .declarations
                .iter()
                .filter(|decl| self.keeps(decl))
                .count(),
            _ => 0,
        }
    }

    fn computed_value(
        &self,
        document: &Document,
        element: &NodeRef,
        pseudo: Option<PseudoElement>,
        property: &str,
    ) -> Option<String> {
        if !self.computed_style {
            return None;
        }
        let style = self.compute_style(document, element, pseudo);
        if let Some(value) = style.properties.get(property) {
            return Some(value.clone());
        }

        if property.starts_with("--") && self.custom_properties {
            // Custom properties inherit: pseudo-elements from their element,
            // elements from their parent element.
            let inherited_from = match pseudo {
                Some(_) => Some(element.clone()),
                None => dom_tree::parent_of(element)
                    .filter(|parent| parent.borrow().as_element().is_some()),
            };
            if let Some(source) = inherited_from {
                return self.computed_value(document, &source, None, property);
            }
        }

        Some(match property {
            "content" if pseudo.is_some() => "none".to_string(),
            "content" => "normal".to_string(),
            _ => String::new(),
        })
    }
}
