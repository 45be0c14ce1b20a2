//! Writes a DOM tree back out as HTML text.

use crate::dom::dom_tree::{Document, Node};
use std::fmt::Write;

/// A list of void (self-closing) elements in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "meta", "img", "br", "hr", "input", "link", "area", "base", "col", "embed", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

/// Serializes the entire Document including its DOCTYPE (if any).
pub fn serialize_document(document: &Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = &*document.doctype.borrow() {
        let _ = write!(out, "<!DOCTYPE {}>", doctype.name);
    }
    serialize_node(&document.root.borrow(), false, &mut out);
    out
}

fn serialize_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::DocumentRoot(root) => {
            for child in &root.children {
                serialize_node(&child.borrow(), false, out);
            }
        }
        Node::Element(elem) => {
            let _ = write!(out, "<{}", elem.tag);
            // HashMap order is unstable; sort so output is reproducible.
            let mut attributes: Vec<_> = elem.attributes.iter().collect();
            attributes.sort();
            for (key, value) in attributes {
                let _ = write!(out, " {}=\"{}\"", key, escape(value, true));
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&elem.tag.as_str());
            for child in &elem.children {
                serialize_node(&child.borrow(), raw, out);
            }
            let _ = write!(out, "</{}>", elem.tag);
        }
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => out.push_str(&escape(text, false)),
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' if attribute => escaped.push_str("&quot;"),
            '<' if !attribute => escaped.push_str("&lt;"),
            '>' if !attribute => escaped.push_str("&gt;"),
            '\u{a0}' => escaped.push_str("&nbsp;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_keeps_structure() {
        let html = r#"<!DOCTYPE html><html><head><style>.a > .b { color: red; }</style></head><body><div class="a" id="x"><br><p>1 &lt; 2</p></div></body></html>"#;
        let document = create_dom_tree(html);
        assert_eq!(
            serialize_document(&document),
            r#"<!DOCTYPE html><html><head><style>.a > .b { color: red; }</style></head><body><div class="a" id="x"><br><p>1 &lt; 2</p></div></body></html>"#
        );
    }

    #[test]
    fn test_attribute_quotes_are_escaped() {
        let document = create_dom_tree(r#"<div title='say "hi"'></div>"#);
        let out = serialize_document(&document);
        assert!(out.contains(r#"title="say &quot;hi&quot;""#), "{out}");
    }
}
