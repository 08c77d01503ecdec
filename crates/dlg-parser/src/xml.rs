use std::collections::BTreeMap;

use dlg_core::{DialogueError, SourceLocation, SourceSpan};
use roxmltree::{Document, Node, NodeType};

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElementNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElementNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlElementNode>,
    /// Source text of the start tag, e.g. `<give x="1">`.
    pub opening_tag: String,
    pub location: SourceSpan,
}

impl XmlElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &XmlElementNode> {
        self.children.iter()
    }

    /// Depth-first walk over every element below this one, excluding itself.
    pub fn descendants(&self) -> Vec<&XmlElementNode> {
        let mut out = Vec::new();
        for child in self.element_children() {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }
}

pub fn parse_xml_document(source: &str) -> Result<XmlDocument, DialogueError> {
    let document = Document::parse(source)
        .map_err(|error| DialogueError::new("XML_PARSE_ERROR", error.to_string()))?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(DialogueError::new(
            "XML_ROOT_MISSING",
            "XML document must contain a root element.",
        ));
    };

    Ok(XmlDocument {
        root: parse_element(&document, source, root),
    })
}

fn parse_element(document: &Document<'_>, source: &str, node: Node<'_, '_>) -> XmlElementNode {
    let mut attributes = BTreeMap::new();
    for attribute in node.attributes() {
        attributes.insert(attribute.name().to_string(), attribute.value().to_string());
    }

    // Scene markup carries everything in attributes; text content is ignored.
    let children = node
        .children()
        .filter(|child| child.node_type() == NodeType::Element)
        .map(|child| parse_element(document, source, child))
        .collect();

    XmlElementNode {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        opening_tag: opening_tag(source, node.range().start, node.range().end),
        location: node_span(document, node.range().start, node.range().end),
    }
}

fn opening_tag(source: &str, start: usize, end: usize) -> String {
    let Some(outer) = source.get(start..end) else {
        return String::new();
    };
    match outer.find('>') {
        Some(close) => outer[..=close].to_string(),
        None => outer.to_string(),
    }
}

fn node_span(document: &Document<'_>, start: usize, end: usize) -> SourceSpan {
    let start_pos = document.text_pos_at(start);
    let end_pos = document.text_pos_at(end);
    SourceSpan {
        start: SourceLocation {
            line: start_pos.row as usize,
            column: start_pos.col as usize,
        },
        end: SourceLocation {
            line: end_pos.row as usize,
            column: end_pos.col as usize,
        },
    }
}
