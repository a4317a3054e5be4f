use html5ever::{LocalName, Namespace, QualName};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use url::Url;

use crate::style::css_matcher::{matches_selector_list, parse_selector_list};

pub mod dom_tree {
    use super::*;

    pub type NodeRef = Rc<RefCell<Node>>;

    const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

    #[derive(Debug)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
    }

    #[derive(Debug, Default)]
    pub struct DocumentRootNode {
        pub children: Vec<NodeRef>,
    }

    #[derive(Debug)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: HashMap<String, String>,
        pub children: Vec<NodeRef>,
        pub parent: Option<Weak<RefCell<Node>>>,
        /// Previous *element* sibling, used by the `+` and `~` combinators.
        pub prev_sibling: Option<Weak<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: NodeRef,
        pub doctype: RefCell<Option<Doctype>>,
        pub base_url: RefCell<Option<Url>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: HashMap::new(),
                children: Vec::new(),
                parent: None,
                prev_sibling: None,
            }
        }
    }

    impl Node {
        pub fn as_element(&self) -> Option<&ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn children(&self) -> Option<&Vec<NodeRef>> {
            match self {
                Node::DocumentRoot(root) => Some(&root.children),
                Node::Element(elem) => Some(&elem.children),
                Node::Text(_) => None,
            }
        }

        pub fn children_mut(&mut self) -> Option<&mut Vec<NodeRef>> {
            match self {
                Node::DocumentRoot(root) => Some(&mut root.children),
                Node::Element(elem) => Some(&mut elem.children),
                Node::Text(_) => None,
            }
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
            base_url: RefCell::new(None),
        }
    }

    /// Creates a detached HTML element.
    pub fn create_element(tag: &str) -> NodeRef {
        let qual_name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag));
        Rc::new(RefCell::new(Node::Element(ElementNode::new(
            tag.to_ascii_lowercase(),
            qual_name,
        ))))
    }

    pub fn create_text(text: &str) -> NodeRef {
        Rc::new(RefCell::new(Node::Text(text.to_string())))
    }

    pub fn set_attribute(node: &NodeRef, name: &str, value: &str) {
        if let Node::Element(elem) = &mut *node.borrow_mut() {
            elem.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn get_attribute(node: &NodeRef, name: &str) -> Option<String> {
        node.borrow()
            .as_element()
            .and_then(|elem| elem.attributes.get(name).cloned())
    }

    pub fn tag_name(node: &NodeRef) -> Option<String> {
        node.borrow().as_element().map(|elem| elem.tag.clone())
    }

    pub fn parent_of(node: &NodeRef) -> Option<NodeRef> {
        node.borrow()
            .as_element()
            .and_then(|elem| elem.parent.as_ref())
            .and_then(Weak::upgrade)
    }

    pub fn prev_sibling_of(node: &NodeRef) -> Option<NodeRef> {
        node.borrow()
            .as_element()
            .and_then(|elem| elem.prev_sibling.as_ref())
            .and_then(Weak::upgrade)
    }

    /// Appends `child` to `parent`. Consecutive text is merged into one text node.
    pub fn append_child(parent: &NodeRef, child: NodeRef) {
        if let Node::Text(text) = &*child.borrow() {
            let mut parent_borrow = parent.borrow_mut();
            if let Some(children) = parent_borrow.children_mut() {
                if let Some(last) = children.last() {
                    if let Node::Text(existing) = &mut *last.borrow_mut() {
                        existing.push_str(text);
                        return;
                    }
                }
            }
        }

        set_parent(&child, Some(parent));
        if let Some(children) = parent.borrow_mut().children_mut() {
            children.push(child);
            relink_siblings(children);
        }
    }

    /// Inserts `child` immediately before `sibling` under `sibling`'s parent.
    pub fn insert_before(sibling: &NodeRef, child: NodeRef) {
        let Some(parent) = parent_of(sibling) else {
            return;
        };
        set_parent(&child, Some(&parent));
        let mut parent_borrow = parent.borrow_mut();
        if let Some(children) = parent_borrow.children_mut() {
            let index = children
                .iter()
                .position(|c| Rc::ptr_eq(c, sibling))
                .unwrap_or(children.len());
            children.insert(index, child);
            relink_siblings(children);
        }
    }

    /// Removes `child` from `parent`; returns false when it was not a child.
    pub fn remove_child(parent: &NodeRef, child: &NodeRef) -> bool {
        let removed = {
            let mut parent_borrow = parent.borrow_mut();
            let Some(children) = parent_borrow.children_mut() else {
                return false;
            };
            let Some(index) = children.iter().position(|c| Rc::ptr_eq(c, child)) else {
                return false;
            };
            let removed = children.remove(index);
            relink_siblings(children);
            removed
        };
        set_parent(&removed, None);
        if let Node::Element(elem) = &mut *removed.borrow_mut() {
            elem.prev_sibling = None;
        }
        true
    }

    /// Moves every child of `node` under `new_parent`.
    pub fn reparent_children(node: &NodeRef, new_parent: &NodeRef) {
        let moved = match node.borrow_mut().children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        };
        for child in moved {
            append_child(new_parent, child);
        }
    }

    fn set_parent(node: &NodeRef, parent: Option<&NodeRef>) {
        if let Node::Element(elem) = &mut *node.borrow_mut() {
            elem.parent = parent.map(Rc::downgrade);
        }
    }

    fn relink_siblings(children: &[NodeRef]) {
        let mut prev_element: Option<&NodeRef> = None;
        for child in children {
            if let Node::Element(elem) = &mut *child.borrow_mut() {
                elem.prev_sibling = prev_element.map(Rc::downgrade);
            } else {
                continue;
            }
            prev_element = Some(child);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(node: &NodeRef) -> String {
        let mut out = String::new();
        collect_text(node, &mut out);
        out
    }

    fn collect_text(node: &NodeRef, out: &mut String) {
        match &*node.borrow() {
            Node::Text(text) => out.push_str(text),
            other => {
                if let Some(children) = other.children() {
                    for child in children {
                        collect_text(child, out);
                    }
                }
            }
        }
    }

    /// Every element below `node`, in tree order.
    pub fn descendant_elements(node: &NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        collect_elements(node, &mut out);
        out
    }

    fn collect_elements(node: &NodeRef, out: &mut Vec<NodeRef>) {
        if let Some(children) = node.borrow().children() {
            for child in children {
                if matches!(*child.borrow(), Node::Element(_)) {
                    out.push(Rc::clone(child));
                }
                collect_elements(child, out);
            }
        }
    }

    impl Document {
        pub fn set_base_url(&self, url: Option<Url>) {
            *self.base_url.borrow_mut() = url;
        }

        /// The `<html>` element, if the document has one.
        pub fn document_element(&self) -> Option<NodeRef> {
            self.root.borrow().children().and_then(|children| {
                children
                    .iter()
                    .find(|c| matches!(*c.borrow(), Node::Element(_)))
                    .cloned()
            })
        }

        pub fn head(&self) -> Option<NodeRef> {
            self.child_of_document_element("head")
        }

        pub fn body(&self) -> Option<NodeRef> {
            self.child_of_document_element("body")
        }

        fn child_of_document_element(&self, tag: &str) -> Option<NodeRef> {
            let html = self.document_element()?;
            let html_borrow = html.borrow();
            let found = html_borrow
                .children()?
                .iter()
                .find(|c| {
                    c.borrow()
                        .as_element()
                        .is_some_and(|elem| elem.tag.eq_ignore_ascii_case(tag))
                })
                .cloned();
            found
        }

        pub fn elements(&self) -> Vec<NodeRef> {
            descendant_elements(&self.root)
        }

        pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeRef> {
            self.elements()
                .into_iter()
                .filter(|node| {
                    node.borrow()
                        .as_element()
                        .is_some_and(|elem| elem.tag.eq_ignore_ascii_case(tag))
                })
                .collect()
        }

        /// First element in tree order matching `selector`.
        pub fn query_selector(&self, selector: &str) -> Option<NodeRef> {
            let selectors = parse_selector_list(selector);
            if selectors.is_empty() {
                return None;
            }
            self.elements()
                .into_iter()
                .find(|node| matches_selector_list(node, &selectors, None))
        }

        /// `href` values of every `<link>` whose `rel` list contains `stylesheet`.
        pub fn stylesheet_links(&self) -> Vec<String> {
            self.elements_by_tag("link")
                .iter()
                .filter_map(|node| {
                    let node = node.borrow();
                    let elem = node.as_element()?;
                    let rel = elem.attributes.get("rel")?;
                    let is_stylesheet = rel
                        .split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("stylesheet"));
                    if !is_stylesheet {
                        return None;
                    }
                    elem.attributes.get("href").cloned()
                })
                .collect()
        }

        /// CSS text of every `<style>` element, in tree order.
        pub fn style_texts(&self) -> Vec<String> {
            self.elements_by_tag("style")
                .iter()
                .map(text_content)
                .collect()
        }
    }
}
