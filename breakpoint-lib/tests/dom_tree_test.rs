use breakpoint_lib::dom::dom_tree::{self, Node, NodeRef};
use breakpoint_lib::parser::html::{create_dom_tree, create_dom_tree_with_base};
use pretty_assertions::assert_eq;
use url::Url;

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
                <link rel="stylesheet" href="site.css">
            </head>
            <body>
                <main>Hello</main>
            </body>
        </html>
    "#;

    let document = create_dom_tree(html);
    let expected = r#"
<html>
  <head>
    <link>
  <body>
    <main>
      Hello
"#;
    assert_eq!(collect_structure(&document.root).trim(), expected.trim());
    assert_eq!(document.doctype.borrow().as_ref().map(|d| d.name.clone()), Some("html".to_string()));
}

#[test]
fn test_stylesheet_links() {
    let html = r#"
        <head>
            <link rel="stylesheet" href="a.css">
            <link rel="icon" href="favicon.ico">
            <link rel="alternate STYLESHEET" href="b.css">
            <link rel="preload stylesheet">
        </head>
    "#;

    let document = create_dom_tree(html);
    assert_eq!(
        document.stylesheet_links(),
        vec!["a.css".to_string(), "b.css".to_string()]
    );
}

#[test]
fn test_style_texts_in_tree_order() {
    let html = r#"
        <head><style>.a { color: red; }</style></head>
        <body><style>.b { color: blue; }</style></body>
    "#;

    let document = create_dom_tree(html);
    assert_eq!(
        document.style_texts(),
        vec![".a { color: red; }".to_string(), ".b { color: blue; }".to_string()]
    );
}

#[test]
fn test_query_selector() {
    let html = r#"
        <body>
            <nav id="menu" class="bar"><a href="/">Home</a></nav>
            <section lang="en-US"><p class="note">One</p><p class="note wide">Two</p></section>
        </body>
    "#;

    let document = create_dom_tree(html);
    let text_of = |selector: &str| document.query_selector(selector).map(|n| dom_tree::text_content(&n));

    assert_eq!(text_of("#menu a").as_deref(), Some("Home"));
    assert_eq!(text_of("section > .note").as_deref(), Some("One"));
    assert_eq!(text_of(".note + .wide").as_deref(), Some("Two"));
    assert_eq!(text_of("[lang|=en] p.wide").as_deref(), Some("Two"));
    assert_eq!(text_of("nav.missing"), None);
}

#[test]
fn test_base_url_is_kept() {
    let base = Url::parse("https://example.com/docs/").unwrap();
    let document = create_dom_tree_with_base("<p>x</p>", Some(base.clone()));
    assert_eq!(document.base_url.borrow().as_ref(), Some(&base));
}

#[test]
fn test_malformed_html() {
    let html = r#"
        <div>
            <p>Unclosed
            <img>
            </div>
    "#;

    let document = create_dom_tree(html);
    let expected = r#"
<html>
  <head>
  <body>
    <div>
      <p>
        Unclosed
        <img>
"#;
    assert_eq!(collect_structure(&document.root).trim(), expected.trim());
}
