//! Finds `--breakpoint` declarations in a rule body.

use once_cell::sync::Lazy;
use regex::Regex;

pub const BREAKPOINT_PROPERTY: &str = "--breakpoint";

#[allow(clippy::unwrap_used)] // Constant pattern, known to be valid
static RE_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w-])--breakpoint:\s*([\w-]+)").unwrap());
#[allow(clippy::unwrap_used)]
static RE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([\w-]+)").unwrap());

/// Returns the breakpoint named by the last `--breakpoint` declaration in
/// `rule_body`, or `None` when the body declares none.
///
/// Comments must already be stripped.
pub fn scan(rule_body: &str) -> Option<String> {
    RE_DECLARATION
        .captures_iter(rule_body)
        .last()
        .map(|caps| caps[1].to_string())
}

/// Leading identifier of a declaration value, e.g. `small` for ` small !important`.
pub fn breakpoint_name(value: &str) -> Option<&str> {
    RE_NAME
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
