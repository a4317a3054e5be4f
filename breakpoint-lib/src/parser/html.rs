//! Parses HTML into the crate's DOM tree.
//!
//! html5ever drives a custom `TreeSink` that builds the `Rc<RefCell<Node>>`
//! tree defined in `crate::dom::dom_tree`, keeping parent and sibling links
//! up to date so selectors can be matched right-to-left.

use crate::dom::dom_tree;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

/// Creates a DOM tree from the provided HTML content.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = BreakpointTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// Parses `html_content` and records `base_url` for resolving `<link href>`s.
pub fn create_dom_tree_with_base(html_content: &str, base_url: Option<Url>) -> dom_tree::Document {
    let document = create_dom_tree(html_content);
    document.set_base_url(base_url);
    document
}

/// A `TreeSink` building the document used by the detector.
pub struct BreakpointTreeSink {
    document: dom_tree::Document,
    quirks_mode: RefCell<QuirksMode>,
}

impl BreakpointTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }
}

impl Default for BreakpointTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct BreakpointElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for BreakpointElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

fn into_node(child: NodeOrText<Rc<RefCell<dom_tree::Node>>>) -> Rc<RefCell<dom_tree::Node>> {
    match child {
        NodeOrText::AppendNode(node) => node,
        NodeOrText::AppendText(text) => dom_tree::create_text(&text),
    }
}

impl TreeSink for BreakpointTreeSink {
    type Handle = Rc<RefCell<dom_tree::Node>>;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = BreakpointElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        debug!("HTML parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            dom_tree::Node::Element(elem) => BreakpointElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            // html5ever only asks for names of handles it created as elements.
            _ => BreakpointElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let mut element_node = dom_tree::ElementNode::new(name.local.to_string(), name);
        element_node.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        Rc::new(RefCell::new(dom_tree::Node::Element(element_node)))
    }

    /// Comments carry nothing the detector needs, so they become empty text.
    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        dom_tree::create_text("")
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        dom_tree::create_text("")
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        dom_tree::append_child(parent, into_node(child));
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if dom_tree::parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        dom_tree::insert_before(sibling, into_node(child));
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let dom_tree::Node::Element(elem) = &mut *target.borrow_mut() {
            for attr in attrs {
                elem.attributes
                    .entry(attr.name.local.to_string())
                    .or_insert_with(|| attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        if let Some(parent) = dom_tree::parent_of(target) {
            dom_tree::remove_child(&parent, target);
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        dom_tree::reparent_children(node, new_parent);
    }
}
