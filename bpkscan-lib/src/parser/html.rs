//! Parsing of HTML into the crate's DOM tree.
//!
//! It uses html5ever as the HTML parser and builds a DOM tree defined in the
//! `crate::dom::dom_tree` module. Element identities are handed out by the
//! document as elements are created, so they follow source order.

use crate::dom::dom_tree::{self, Document, Node, NodeRef};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Creates a DOM tree from the provided HTML content.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
///
/// # Returns
///
/// A `dom_tree::Document` representing the parsed HTML.
pub fn create_dom_tree(html_content: &str) -> Document {
    let tree_sink = BpkTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// A custom TreeSink for building the DOM tree used by the scanner.
///
/// It holds the Document being built and the current quirks mode.
pub struct BpkTreeSink {
    document: Document,
    quirks_mode: RefCell<QuirksMode>,
}

impl BpkTreeSink {
    /// Creates a new `BpkTreeSink` with an empty document.
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    /// Quirks mode reported by the parser so far.
    pub fn quirks_mode(&self) -> QuirksMode {
        *self.quirks_mode.borrow()
    }

    fn parent_of(node: &NodeRef) -> Option<NodeRef> {
        node.borrow().as_element().and_then(|elem| elem.parent())
    }
}

impl Default for BpkTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned element name handed back to html5ever.
#[derive(Debug)]
pub struct BpkElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for BpkElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for BpkTreeSink {
    type Handle = NodeRef;
    type Output = Document;
    type ElemName<'a>
        = BpkElemName
    where
        Self: 'a;

    /// Finalizes and returns the constructed Document.
    fn finish(self) -> Self::Output {
        self.document
    }

    /// Parse errors are recoverable in HTML; they are only logged.
    fn parse_error(&self, msg: Cow<'static, str>) {
        log::trace!("html parse error: {}", msg);
    }

    /// Returns the handle to the document's root node.
    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    /// Returns the element name for the given element handle.
    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            Node::Element(elem) => BpkElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            _ => panic!("elem_name called on non-element node"),
        }
    }

    /// Creates a new element node with the given name and attributes.
    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect::<HashMap<String, String>>();
        self.document.create_element(name, attributes)
    }

    /// Comments carry no styling information; they become empty text nodes.
    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Text(String::new())))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Text(String::new())))
    }

    /// Appends a child node or text to the given parent node.
    ///
    /// Adjacent text is merged into the previous text node, as the
    /// tree builder expects.
    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => dom_tree::attach(parent, node),
            NodeOrText::AppendText(text) => {
                let last_text = parent
                    .borrow()
                    .children()
                    .last()
                    .filter(|last| matches!(*last.borrow(), Node::Text(_)))
                    .cloned();
                match last_text {
                    Some(last) => {
                        if let Node::Text(ref mut existing) = *last.borrow_mut() {
                            existing.push_str(&text);
                        }
                    }
                    None => dom_tree::attach(
                        parent,
                        Rc::new(RefCell::new(Node::Text(text.to_string()))),
                    ),
                }
            }
        }
    }

    /// Appends to the element's parent when it has one, otherwise to `prev_element`.
    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if Self::parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    /// Appends the DOCTYPE information to the Document.
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

    /// Template contents are kept inline with the template element.
    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    /// Determines if two node handles refer to the same node.
    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    /// Sets the current quirks mode.
    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    /// Inserts a node before an element sibling (foster parenting).
    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = Self::parent_of(sibling) else {
            return;
        };
        let node = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => Rc::new(RefCell::new(Node::Text(text.to_string()))),
        };
        dom_tree::attach_before(&parent, sibling, node);
    }

    /// Adds attributes to the target node if they are missing.
    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let Node::Element(ref mut elem) = *target.borrow_mut() {
            for attr in attrs {
                elem.attributes
                    .entry(attr.name.local.to_string())
                    .or_insert_with(|| attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        if let Some(parent) = Self::parent_of(target) {
            dom_tree::detach(&parent, target);
        }
    }

    /// Moves all children of `node` under `new_parent`.
    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children: Vec<NodeRef> = node.borrow().children().to_vec();
        for child in children {
            dom_tree::detach(node, &child);
            dom_tree::attach(new_parent, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_text_is_merged() {
        let document = create_dom_tree("<style>.a { color: red; }</style><p>x</p>");
        let style = document
            .elements()
            .into_iter()
            .find(|node| node.borrow().as_element().is_some_and(|e| e.tag == "style"))
            .expect("style element");
        assert_eq!(dom_tree::text_content(&style), ".a { color: red; }");
    }

    #[test]
    fn test_parent_pointers_are_set() {
        let document = create_dom_tree(r#"<div id="outer"><span id="inner"></span></div>"#);
        let inner = document.element_by_id_attr("inner").expect("inner");
        let parent = BpkTreeSink::parent_of(&inner).expect("parent");
        assert_eq!(
            parent.borrow().as_element().and_then(|e| e.attribute("id")),
            Some("outer")
        );
    }

    #[test]
    fn test_element_ids_follow_source_order() {
        let document = create_dom_tree(r#"<div id="a"></div><div id="b"></div>"#);
        let a = dom_tree::element_id(&document.element_by_id_attr("a").unwrap()).unwrap();
        let b = dom_tree::element_id(&document.element_by_id_attr("b").unwrap()).unwrap();
        assert!(a < b);
    }
}
