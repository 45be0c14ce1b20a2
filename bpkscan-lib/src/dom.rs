use html5ever::{LocalName, Namespace, QualName};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

pub mod dom_tree {
    use super::*;

    pub type NodeRef = Rc<RefCell<Node>>;

    /// Stable identity of an element within one document.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ElementId(pub u64);

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
        pub id: ElementId,
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: HashMap<String, String>,
        pub children: Vec<NodeRef>,
        pub parent: Option<Weak<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    /// A record of one change made through the [`Document`] mutation API.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Mutation {
        /// Children were added to or removed from `target` (`None` is the document root).
        ChildList { target: Option<ElementId> },
        Attribute { target: ElementId, name: String },
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: NodeRef,
        pub doctype: RefCell<Option<Doctype>>,
        next_element_id: Cell<u64>,
        mutations: RefCell<Vec<Mutation>>,
    }

    impl Node {
        pub fn as_element(&self) -> Option<&ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn children(&self) -> &[NodeRef] {
            match self {
                Node::DocumentRoot(root) => &root.children,
                Node::Element(elem) => &elem.children,
                Node::Text(_) => &[],
            }
        }

        fn children_mut(&mut self) -> Option<&mut Vec<NodeRef>> {
            match self {
                Node::DocumentRoot(root) => Some(&mut root.children),
                Node::Element(elem) => Some(&mut elem.children),
                Node::Text(_) => None,
            }
        }
    }

    impl ElementNode {
        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes.get(name).map(String::as_str)
        }

        /// Class names in attribute order, duplicates included.
        pub fn classes(&self) -> impl Iterator<Item = &str> {
            self.attribute("class")
                .unwrap_or_default()
                .split_ascii_whitespace()
        }

        pub fn has_class(&self, class_name: &str) -> bool {
            self.classes().any(|class| class == class_name)
        }

        pub fn inline_style(&self) -> Option<&str> {
            self.attribute("style")
        }

        /// Short human label such as `div#main.Card.Bpk_Button`.
        pub fn describe(&self) -> String {
            let mut label = self.tag.clone();
            if let Some(id) = self.attribute("id") {
                label.push('#');
                label.push_str(id);
            }
            for class in self.classes() {
                label.push('.');
                label.push_str(class);
            }
            label
        }

        pub fn parent(&self) -> Option<NodeRef> {
            self.parent.as_ref().and_then(Weak::upgrade)
        }
    }

    impl Document {
        pub fn create_element(
            &self,
            qual_name: QualName,
            attributes: HashMap<String, String>,
        ) -> NodeRef {
            let id = ElementId(self.next_element_id.get());
            self.next_element_id.set(id.0 + 1);
            Rc::new(RefCell::new(Node::Element(ElementNode {
                id,
                tag: qual_name.local.to_string(),
                qual_name,
                attributes,
                children: Vec::new(),
                parent: None,
            })))
        }

        /// Creates an HTML element from a tag name and attribute pairs.
        pub fn create_html_element(&self, tag: &str, attributes: &[(&str, &str)]) -> NodeRef {
            let qual_name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag));
            let attributes = attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.create_element(qual_name, attributes)
        }

        pub fn create_text(&self, text: &str) -> NodeRef {
            Rc::new(RefCell::new(Node::Text(text.to_string())))
        }

        pub fn append_child(&self, parent: &NodeRef, child: NodeRef) {
            attach(parent, child);
            self.record(Mutation::ChildList {
                target: element_id(parent),
            });
        }

        /// Detaches `child` from `parent`. Returns false if it was not a child.
        pub fn remove_child(&self, parent: &NodeRef, child: &NodeRef) -> bool {
            if !detach(parent, child) {
                return false;
            }
            self.record(Mutation::ChildList {
                target: element_id(parent),
            });
            true
        }

        pub fn set_attribute(&self, node: &NodeRef, name: &str, value: &str) {
            let target = {
                let mut node_borrow = node.borrow_mut();
                let Node::Element(elem) = &mut *node_borrow else {
                    return;
                };
                elem.attributes.insert(name.to_string(), value.to_string());
                elem.id
            };
            self.record(Mutation::Attribute {
                target,
                name: name.to_string(),
            });
        }

        pub fn remove_attribute(&self, node: &NodeRef, name: &str) {
            let target = {
                let mut node_borrow = node.borrow_mut();
                let Node::Element(elem) = &mut *node_borrow else {
                    return;
                };
                if elem.attributes.remove(name).is_none() {
                    return;
                }
                elem.id
            };
            self.record(Mutation::Attribute {
                target,
                name: name.to_string(),
            });
        }

        /// Drains the mutation records queued since the last call.
        pub fn take_mutations(&self) -> Vec<Mutation> {
            std::mem::take(&mut *self.mutations.borrow_mut())
        }

        /// All elements in document (pre-)order.
        pub fn elements(&self) -> Vec<NodeRef> {
            let mut out = Vec::new();
            collect_elements(&self.root, &mut out);
            out
        }

        pub fn element_by_id_attr(&self, id_value: &str) -> Option<NodeRef> {
            self.elements().into_iter().find(|node| {
                node.borrow()
                    .as_element()
                    .is_some_and(|elem| elem.attribute("id") == Some(id_value))
            })
        }

        pub fn element_by_element_id(&self, id: ElementId) -> Option<NodeRef> {
            self.elements().into_iter().find(|node| element_id(node) == Some(id))
        }

        fn record(&self, mutation: Mutation) {
            self.mutations.borrow_mut().push(mutation);
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::default()))),
            doctype: RefCell::new(None),
            next_element_id: Cell::new(0),
            mutations: RefCell::new(Vec::new()),
        }
    }

    pub fn element_id(node: &NodeRef) -> Option<ElementId> {
        node.borrow().as_element().map(|elem| elem.id)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(node: &NodeRef) -> String {
        let mut text = String::new();
        push_text(node, &mut text);
        text
    }

    fn push_text(node: &NodeRef, out: &mut String) {
        match &*node.borrow() {
            Node::Text(text) => out.push_str(text),
            other => {
                for child in other.children() {
                    push_text(child, out);
                }
            }
        }
    }

    fn collect_elements(node: &NodeRef, out: &mut Vec<NodeRef>) {
        let node_borrow = node.borrow();
        if matches!(*node_borrow, Node::Element(_)) {
            out.push(Rc::clone(node));
        }
        for child in node_borrow.children() {
            collect_elements(child, out);
        }
    }

    /// Appends without recording a mutation. Used by the parser and the public API.
    pub(crate) fn attach(parent: &NodeRef, child: NodeRef) {
        if let Node::Element(ref mut child_elem) = *child.borrow_mut() {
            child_elem.parent = Some(Rc::downgrade(parent));
        }
        if let Some(children) = parent.borrow_mut().children_mut() {
            children.push(child);
        }
    }

    /// Inserts `child` right before `sibling` under `parent`.
    pub(crate) fn attach_before(parent: &NodeRef, sibling: &NodeRef, child: NodeRef) {
        if let Node::Element(ref mut child_elem) = *child.borrow_mut() {
            child_elem.parent = Some(Rc::downgrade(parent));
        }
        if let Some(children) = parent.borrow_mut().children_mut() {
            let index = children
                .iter()
                .position(|c| Rc::ptr_eq(c, sibling))
                .unwrap_or(children.len());
            children.insert(index, child);
        }
    }

    pub(crate) fn detach(parent: &NodeRef, child: &NodeRef) -> bool {
        let removed = {
            let mut parent_borrow = parent.borrow_mut();
            let Some(children) = parent_borrow.children_mut() else {
                return false;
            };
            let before = children.len();
            children.retain(|c| !Rc::ptr_eq(c, child));
            before != children.len()
        };
        if removed {
            if let Node::Element(ref mut child_elem) = *child.borrow_mut() {
                child_elem.parent = None;
            }
        }
        removed
    }
}
