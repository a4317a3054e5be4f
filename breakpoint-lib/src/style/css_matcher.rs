use crate::dom::dom_tree::{self, ElementNode, NodeRef};
use std::collections::HashSet;
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
    /// [attr|="value"]
    DashMatch,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>, // None means only existence check
    pub value: Option<String>,
}

/// The generated-content pseudo-elements a selector can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElement {
    Before,
    After,
}

/// A compound selector: optional tag, id, classes, attribute conditions and pseudos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: HashSet<String>,
    pub attributes: Vec<AttributeSelector>,
    /// Pseudo-classes are recorded but never match in a static document.
    pub pseudo_classes: Vec<String>,
    pub pseudo_element: Option<PseudoElement>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Tracks whether the scanner is inside `[...]`, `(...)` or a quoted string.
#[derive(Default)]
struct Nesting {
    brackets: usize,
    parens: usize,
    quote: Option<char>,
    escaped: bool,
}

impl Nesting {
    /// Feeds one character; returns true when it sits at the top level.
    fn feed(&mut self, ch: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return false;
        }
        if ch == '\\' {
            self.escaped = true;
            return false;
        }
        if let Some(q) = self.quote {
            if ch == q {
                self.quote = None;
            }
            return false;
        }
        match ch {
            '"' | '\'' => {
                self.quote = Some(ch);
                false
            }
            '[' => {
                self.brackets += 1;
                false
            }
            ']' => {
                self.brackets = self.brackets.saturating_sub(1);
                false
            }
            '(' => {
                self.parens += 1;
                false
            }
            ')' => {
                self.parens = self.parens.saturating_sub(1);
                false
            }
            _ => self.brackets == 0 && self.parens == 0,
        }
    }
}

/// Parse a comma separated selector list; unparseable entries are dropped.
pub fn parse_selector_list(selector: &str) -> Vec<ComplexSelector> {
    let mut parts = Vec::new();
    let mut nesting = Nesting::default();
    let mut current = String::new();
    for ch in selector.chars() {
        if nesting.feed(ch) && ch == ',' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);

    parts
        .iter()
        .filter_map(|part| parse_complex_selector(part))
        .collect()
}

/// Parse a complex selector string (e.g. "div.red > p#header + span.foo") into a ComplexSelector.
pub fn parse_complex_selector(selector: &str) -> Option<ComplexSelector> {
    let mut compounds: Vec<String> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current = String::new();
    let mut pending: Option<Combinator> = None;
    let mut nesting = Nesting::default();

    for ch in selector.trim().chars() {
        let top_level = nesting.feed(ch);
        let explicit = match ch {
            '>' => Some(Combinator::Child),
            '+' => Some(Combinator::AdjacentSibling),
            '~' => Some(Combinator::GeneralSibling),
            _ => None,
        };
        if top_level && (ch.is_whitespace() || explicit.is_some()) {
            if !current.is_empty() {
                compounds.push(std::mem::take(&mut current));
                pending = Some(Combinator::Descendant);
            }
            if explicit.is_some() {
                pending = explicit;
            }
            continue;
        }
        if let Some(combinator) = pending.take() {
            if compounds.is_empty() {
                // A leading combinator has nothing to relate to.
                return None;
            }
            combinators.push(combinator);
        }
        current.push(ch);
    }
    if current.is_empty() {
        return None;
    }
    compounds.push(current);

    let mut iter = compounds.iter().map(|c| parse_compound_selector(c));
    let mut key = iter.next()?;
    let mut ancestors = Vec::new();
    for (combinator, compound) in combinators.into_iter().zip(iter) {
        ancestors.push((combinator, key));
        key = compound;
    }
    ancestors.reverse();
    Some(ComplexSelector { key, ancestors })
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || ch == '*' || !ch.is_ascii()
}

fn read_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut buffer = String::new();
    while let Some(&ch) = chars.peek() {
        if ch == '\\' {
            chars.next();
            if let Some(escaped) = chars.next() {
                buffer.push(escaped);
            }
        } else if is_name_char(ch) {
            buffer.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    buffer
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
        chars.next();
    }
}

/// Reads the body of a quoted CSS string, resolving backslash escapes.
fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> String {
    let mut value = String::new();
    while let Some(ch) = chars.next() {
        if ch == quote {
            break;
        }
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 && chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            if let Some(c) = chars.next() {
                hex.push(c);
            }
        }
        if hex.is_empty() {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            if chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
            value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
        }
    }
    value
}

fn parse_attribute(chars: &mut Peekable<Chars<'_>>) -> Option<AttributeSelector> {
    skip_whitespace(chars);
    let name = read_name(chars);
    skip_whitespace(chars);

    let mut operator = None;
    let mut value = None;
    if let Some(&ch) = chars.peek() {
        if matches!(ch, '=' | '~' | '^' | '$' | '*' | '|') {
            chars.next();
            if ch != '=' && chars.peek() == Some(&'=') {
                chars.next();
            }
            operator = match ch {
                '=' => Some(AttributeOperator::Exact),
                '~' => Some(AttributeOperator::Includes),
                '^' => Some(AttributeOperator::Prefix),
                '$' => Some(AttributeOperator::Suffix),
                '*' => Some(AttributeOperator::Substring),
                '|' => Some(AttributeOperator::DashMatch),
                _ => None,
            };
            skip_whitespace(chars);
            value = match chars.peek() {
                Some(&q) if q == '"' || q == '\'' => {
                    chars.next();
                    Some(read_quoted(chars, q))
                }
                _ => Some(read_name(chars)),
            };
        }
    }
    // Skip flags such as ` i` up to the closing bracket.
    for ch in chars.by_ref() {
        if ch == ']' {
            break;
        }
    }
    (!name.is_empty()).then_some(AttributeSelector {
        name,
        operator,
        value,
    })
}

fn parse_pseudo(chars: &mut Peekable<Chars<'_>>, compound: &mut CompoundSelector) {
    let double_colon = chars.peek() == Some(&':');
    if double_colon {
        chars.next();
    }
    let name = read_name(chars).to_ascii_lowercase();
    let mut argument = String::new();
    if chars.peek() == Some(&'(') {
        let mut depth = 0usize;
        for ch in chars.by_ref() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            argument.push(ch);
        }
    }
    match name.as_str() {
        "before" => compound.pseudo_element = Some(PseudoElement::Before),
        "after" => compound.pseudo_element = Some(PseudoElement::After),
        _ if double_colon => compound.pseudo_classes.push(format!("::{name}")),
        _ => compound.pseudo_classes.push(format!("{name}{argument}")),
    }
}

/// Parse a compound selector string, e.g. "div.red#header[data-type~=\"main\"]:before"
pub fn parse_compound_selector(selector: &str) -> CompoundSelector {
    let mut compound = CompoundSelector::default();
    let mut chars = selector.chars().peekable();

    if chars.peek().is_some_and(|&ch| is_name_char(ch)) {
        let tag = read_name(&mut chars);
        if !tag.is_empty() && tag != "*" {
            compound.tag = Some(tag);
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                let id = read_name(&mut chars);
                if !id.is_empty() {
                    compound.id = Some(id);
                }
            }
            '.' => {
                let class = read_name(&mut chars);
                if !class.is_empty() {
                    compound.classes.insert(class);
                }
            }
            '[' => {
                if let Some(attribute) = parse_attribute(&mut chars) {
                    compound.attributes.push(attribute);
                }
            }
            ':' => parse_pseudo(&mut chars, &mut compound),
            _ => {}
        }
    }

    compound
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

fn attribute_matches(actual: &str, operator: AttributeOperator, expected: &str) -> bool {
    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => actual.split_whitespace().any(|word| word == expected),
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
        AttributeOperator::DashMatch => {
            actual == expected || actual.starts_with(&format!("{expected}-"))
        }
    }
}

/// Returns true if the given ElementNode matches the CompoundSelector.
/// The pseudo-element part is checked by the caller.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if !compound.pseudo_classes.is_empty() {
        return false;
    }
    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(ref id_val) = compound.id {
        if elem.attributes.get("id") != Some(id_val) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let Some(class_attr) = elem.attributes.get("class") else {
            return false;
        };
        let elem_classes: HashSet<&str> = class_attr.split_whitespace().collect();
        if !compound
            .classes
            .iter()
            .all(|class| elem_classes.contains(class.as_str()))
        {
            return false;
        }
    }
    compound.attributes.iter().all(|attr_sel| {
        let Some(actual) = elem.attributes.get(&attr_sel.name) else {
            return false;
        };
        match (attr_sel.operator, &attr_sel.value) {
            (Some(operator), Some(expected)) => attribute_matches(actual, operator, expected),
            _ => true,
        }
    })
}

fn element_matches(node: &NodeRef, compound: &CompoundSelector) -> bool {
    node.borrow()
        .as_element()
        .is_some_and(|elem| matches_compound(elem, compound))
}

/// Matches a ComplexSelector against a candidate element for the given pseudo-element
/// (`None` for the element itself). Matching proceeds right-to-left.
pub fn matches_complex_selector(
    candidate: &NodeRef,
    complex: &ComplexSelector,
    pseudo: Option<PseudoElement>,
) -> bool {
    if complex.key.pseudo_element != pseudo || !element_matches(candidate, &complex.key) {
        return false;
    }
    let mut current = Rc::clone(candidate);
    for (combinator, compound) in &complex.ancestors {
        let found = match combinator {
            Combinator::Child => {
                dom_tree::parent_of(&current).filter(|parent| element_matches(parent, compound))
            }
            Combinator::Descendant => std::iter::successors(dom_tree::parent_of(&current), |n| {
                dom_tree::parent_of(n)
            })
            .find(|ancestor| element_matches(ancestor, compound)),
            Combinator::AdjacentSibling => dom_tree::prev_sibling_of(&current)
                .filter(|sibling| element_matches(sibling, compound)),
            Combinator::GeneralSibling => {
                std::iter::successors(dom_tree::prev_sibling_of(&current), |n| {
                    dom_tree::prev_sibling_of(n)
                })
                .find(|sibling| element_matches(sibling, compound))
            }
        };
        match found {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

/// True if any selector of the list matches.
pub fn matches_selector_list(
    candidate: &NodeRef,
    selectors: &[ComplexSelector],
    pseudo: Option<PseudoElement>,
) -> bool {
    selectors
        .iter()
        .any(|selector| matches_complex_selector(candidate, selector, pseudo))
}
