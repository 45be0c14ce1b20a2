use bpkscan_lib::dom::dom_tree::{self, Node, NodeRef};
use bpkscan_lib::parser::html::create_dom_tree;
use bpkscan_lib::parser::serialize::serialize_document;
use pretty_assertions::assert_eq;

fn collect_structure(node: &NodeRef) -> String {
    let mut output = String::new();
    traverse_node(node, 0, &mut output);
    output
}

fn traverse_node(node: &NodeRef, depth: usize, output: &mut String) {
    let node_ref = node.borrow();
    match &*node_ref {
        Node::DocumentRoot(root_node) => {
            for child in &root_node.children {
                traverse_node(child, depth, output);
            }
        }
        Node::Element(elem_node) => {
            *output += &format!("{}<{}>\n", "  ".repeat(depth), elem_node.tag);
            for child in &elem_node.children {
                traverse_node(child, depth + 1, output);
            }
        }
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                *output += &format!("{}{}\n", "  ".repeat(depth), trimmed);
            }
        }
    }
}

#[test]
fn test_basic_structure() {
    let html = r#"
        <!DOCTYPE html>
        <html>
            <head>
                <title>Test</title>
            </head>
            <body>
                <h1>Hello</h1>
                <p>World</p>
            </body>
        </html>
    "#;

    let document = create_dom_tree(html);
    let expected = r#"
<html>
  <head>
    <title>
      Test
  <body>
    <h1>
      Hello
    <p>
      World
"#;
    assert_eq!(collect_structure(&document.root).trim(), expected.trim());
    assert_eq!(
        document.doctype.borrow().as_ref().map(|d| d.name.clone()),
        Some("html".to_string())
    );
}

#[test]
fn test_misnested_markup_is_repaired() {
    let html = "<p>one<p>two<table><tr><td>cell</table>";
    let document = create_dom_tree(html);
    let expected = r#"
<html>
  <head>
  <body>
    <p>
      one
    <p>
      two
      <table>
        <tbody>
          <tr>
            <td>
              cell
"#;
    assert_eq!(collect_structure(&document.root).trim(), expected.trim());
}

#[test]
fn test_attributes_and_classes() {
    let html = r#"<a id="go" href="https://example.com" class=" Card  Bpk_Link " data-test="123">Link</a>"#;
    let document = create_dom_tree(html);
    let link = document.element_by_id_attr("go").unwrap();
    let link_ref = link.borrow();
    let elem = link_ref.as_element().unwrap();

    assert_eq!(elem.attribute("href"), Some("https://example.com"));
    assert_eq!(elem.attribute("data-test"), Some("123"));
    assert_eq!(elem.classes().collect::<Vec<_>>(), vec!["Card", "Bpk_Link"]);
    assert_eq!(elem.describe(), "a#go.Card.Bpk_Link");
    assert_eq!(dom_tree::text_content(&link), "Link");
}

#[test]
fn test_serialized_page_parses_to_same_structure() {
    let html = r#"<!DOCTYPE html><html><head><style>.a > .b { color: red; }</style></head>
<body><div class="a"><span class="b">x &amp; y</span><br><img src="i.png"></div></body></html>"#;
    let document = create_dom_tree(html);
    let serialized = serialize_document(&document);
    assert!(serialized.contains("<style>.a > .b { color: red; }</style>"));
    assert!(serialized.contains("x &amp; y"));
    assert!(!serialized.contains("</br>"));

    let reparsed = create_dom_tree(&serialized);
    assert_eq!(collect_structure(&reparsed.root), collect_structure(&document.root));
}
