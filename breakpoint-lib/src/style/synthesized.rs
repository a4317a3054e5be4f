//! The pseudo-element encoding shared by both compiler backends.

use crate::style::structural::selector_key;
use std::fmt;

/// Attribute carried by marker elements and matched by synthesized rules.
pub const MARKER_ATTRIBUTE: &str = "data-selector";

/// Appended to the original selector inside the marker attribute value.
pub const MARKER_SUFFIX: &str = "__detectBreakpoint__";

/// Hides the generated content of every marker element unless a rule overrides it.
pub fn suppression_rule() -> String {
    format!("[{MARKER_ATTRIBUTE}]:before{{display:none}}")
}

/// Attribute selector derived from an original selector.
///
/// The attribute value embeds the selector's canonical key (see
/// [`selector_key`]), so distinct selectors yield distinct synthesized
/// selectors while different spellings of one selector share a marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynthesizedSelector {
    original: String,
}

impl SynthesizedSelector {
    pub fn new(original: &str) -> Self {
        SynthesizedSelector {
            original: selector_key(original),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Value written into the marker element's attribute.
    pub fn attribute_value(&self) -> String {
        format!("{}{MARKER_SUFFIX}", self.original)
    }

    /// The selector matching the marker's `:before` pseudo-element.
    pub fn pseudo_selector(&self) -> String {
        format!("{self}:before")
    }
}

impl fmt::Display for SynthesizedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{MARKER_ATTRIBUTE}=\"")?;
        for ch in self.attribute_value().chars() {
            if ch == '"' || ch == '\\' {
                write!(f, "\\")?;
            }
            write!(f, "{ch}")?;
        }
        write!(f, "\"]")
    }
}

/// One synthesized rule: `<marker>:before{content:"<breakpoint>";display:none}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRule {
    pub selector: SynthesizedSelector,
    pub breakpoint: String,
}

impl ContentRule {
    pub fn new(original_selector: &str, breakpoint: &str) -> Self {
        ContentRule {
            selector: SynthesizedSelector::new(original_selector),
            breakpoint: breakpoint.to_string(),
        }
    }

    /// The `content` value, quoted the way a computed style reports it.
    pub fn content_value(&self) -> String {
        format!("\"{}\"", self.breakpoint)
    }
}

impl fmt::Display for ContentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{{content:{};display:none}}",
            self.selector.pseudo_selector(),
            self.content_value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_content_rule() {
        let rule = ContentRule::new(" .a ", "small");
        assert_eq!(
            rule.to_string(),
            r#"[data-selector=".a__detectBreakpoint__"]:before{content:"small";display:none}"#
        );
    }

    #[test]
    fn escapes_quotes_in_embedded_selector() {
        let selector = SynthesizedSelector::new(r#"a[href="x"]"#);
        assert_eq!(selector.attribute_value(), r#"a[href="x"]__detectBreakpoint__"#);
        assert_eq!(
            selector.to_string(),
            r#"[data-selector="a[href=\"x\"]__detectBreakpoint__"]"#
        );
    }

    #[test]
    fn spellings_of_one_selector_share_a_marker() {
        let compact = SynthesizedSelector::new(".a,.b>p");
        let spaced = SynthesizedSelector::new(".a , .b > p");
        assert_eq!(compact, spaced);
        assert_eq!(compact.attribute_value(), ".a, .b > p__detectBreakpoint__");
    }

    #[test]
    fn distinct_selectors_stay_distinct() {
        let a = SynthesizedSelector::new(".a .b");
        let b = SynthesizedSelector::new(".a.b");
        assert_ne!(a.to_string(), b.to_string());
    }
}
