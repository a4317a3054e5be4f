use crate::dom::dom_tree::{self, Document, NodeRef};
use log::debug;
use std::rc::Rc;

/// Appends a `<style>` element holding `css` to the document's `<head>`, or
/// to the root element when there is no head.
///
/// Every call adds a new sheet; later sheets win on conflicting rules.
pub fn inject(document: &Document, css: &str) -> NodeRef {
    let style = dom_tree::create_element("style");
    dom_tree::append_child(&style, dom_tree::create_text(css));

    let target = document
        .head()
        .or_else(|| document.document_element())
        .unwrap_or_else(|| Rc::clone(&document.root));
    dom_tree::append_child(&target, Rc::clone(&style));
    debug!("injected {} bytes of CSS", css.len());
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;

    #[test]
    fn appends_to_head_and_accumulates() {
        let document = create_dom_tree("<html><head></head><body></body></html>");
        inject(&document, ".a{}");
        inject(&document, ".b{}");
        assert_eq!(document.style_texts(), vec![".a{}".to_string(), ".b{}".to_string()]);

        let head = document.head().unwrap();
        let styles = dom_tree::descendant_elements(&head);
        assert_eq!(styles.len(), 2);
    }

    #[test]
    fn falls_back_to_document_root() {
        let document = dom_tree::new_document();
        inject(&document, ".a{}");
        assert_eq!(document.style_texts(), vec![".a{}".to_string()]);
    }
}
