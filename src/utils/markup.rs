//! Markup I/O
//!
//! Parses an XML-well-formed HTML subset into owned [`ViewNode`] trees with
//! `roxmltree`, and serializes view trees back to markup. The input is a
//! fragment: it may hold several top-level nodes. `&nbsp;` is the only HTML
//! entity accepted beyond the XML ones.

use std::collections::BTreeMap;

use roxmltree::{Document, Node, NodeType};

use crate::core::view::{ViewElement, ViewNode};
use crate::utils::error::{EditorError, EditorResult};

const FRAGMENT_ROOT: &str = "tabledit-fragment";

/// Elements written without a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "col"];

/// Parse a markup fragment
pub fn parse_markup(input: &str) -> EditorResult<Vec<ViewNode>> {
    let prepared = format!(
        "<{root}>{body}</{root}>",
        root = FRAGMENT_ROOT,
        body = input.replace("&nbsp;", "&#160;")
    );
    let doc = Document::parse(&prepared).map_err(|err| {
        let pos = err.pos();
        // The wrapper start tag shares the first line with the input
        let column = if pos.row == 1 {
            (pos.col as usize).saturating_sub(FRAGMENT_ROOT.len() + 2).max(1)
        } else {
            pos.col as usize
        };
        EditorError::parse_at(err.to_string(), pos.row as usize, column)
    })?;

    Ok(doc
        .root_element()
        .children()
        .filter_map(build_node)
        .collect())
}

fn build_node(node: Node<'_, '_>) -> Option<ViewNode> {
    match node.node_type() {
        NodeType::Element => {
            let attributes: BTreeMap<String, String> = node
                .attributes()
                .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                .collect();
            Some(ViewNode::Element(ViewElement {
                name: node.tag_name().name().to_ascii_lowercase(),
                attributes,
                children: node.children().filter_map(build_node).collect(),
            }))
        }
        NodeType::Text => node
            .text()
            .filter(|t| !t.is_empty())
            .map(|t| ViewNode::Text(t.replace("\r\n", "\n"))),
        _ => None,
    }
}

/// Serialize view nodes to markup
pub fn to_markup(nodes: &[ViewNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &ViewNode) {
    match node {
        ViewNode::Text(text) => escape_into(out, text, false),
        ViewNode::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (key, value) in &el.attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_into(out, value, true);
                out.push('"');
            }
            if el.children.is_empty() && VOID_ELEMENTS.contains(&el.name.as_str()) {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in &el.children {
                write_node(out, child);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fragment() {
        let nodes = parse_markup(r#"<p>a&nbsp;b</p><table border="1"><tr><td>x</td></tr></table>"#)
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[0],
            ViewNode::Element(
                ViewElement::new("p").with_children(vec![ViewNode::Text("a\u{a0}b".to_string())])
            )
        );
        let table = nodes[1].as_element().unwrap();
        assert_eq!(table.attribute("border"), Some("1"));
        assert_eq!(table.text_content(), "x");
    }

    #[test]
    fn test_serialize_escapes_and_sorts_attributes() {
        let el = ViewElement::new("td")
            .with_attribute("rowspan", "2")
            .with_attribute("colspan", "3")
            .with_attribute("title", "a\"b")
            .with_children(vec![ViewNode::Text("1 < 2 & 3".to_string())]);
        assert_eq!(
            to_markup(&[ViewNode::Element(el)]),
            r#"<td colspan="3" rowspan="2" title="a&quot;b">1 &lt; 2 &amp; 3</td>"#
        );
    }

    #[test]
    fn test_round_trip() {
        let input = r#"<figure class="table"><table><tbody><tr><td>a</td><td></td></tr></tbody></table></figure>"#;
        assert_eq!(to_markup(&parse_markup(input).unwrap()), input);
    }

    #[test]
    fn test_parse_error_has_location() {
        match parse_markup("<p>unclosed") {
            Err(EditorError::Parse { line, column, .. }) => {
                assert!(line.is_some());
                assert!(column.is_some());
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_void_elements() {
        assert_eq!(to_markup(&parse_markup("<p>a<br/>b</p>").unwrap()), "<p>a<br/>b</p>");
    }
}
