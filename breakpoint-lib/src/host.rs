//! The capabilities the detector needs from its host environment.

use crate::dom::dom_tree::{Document, NodeRef};
use crate::style::css_matcher::PseudoElement;

/// Style computation offered by the environment the document lives in.
pub trait StyleHost {
    /// How many declarations the host keeps after assigning `css_text` to an
    /// element's inline style.
    fn inline_style_length(&self, css_text: &str) -> usize;

    /// Computed value of `property` for `element` (or one of its
    /// pseudo-elements). `None` when the host cannot compute styles at all.
    fn computed_value(
        &self,
        document: &Document,
        element: &NodeRef,
        pseudo: Option<PseudoElement>,
        property: &str,
    ) -> Option<String>;
}
