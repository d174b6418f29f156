use super::node::{HtmlElement, HtmlNode};
use ego_tree::NodeRef;
use rustc_hash::FxHashMap;
use scraper::{ElementRef, Html, Node, Selector};

/// The parts of a parsed document the converter works on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub head: Option<HtmlElement>,
    pub body: Vec<HtmlNode>,
    /// Number of subtrees that were collapsed to text because they exceeded the nesting limit.
    pub collapsed_subtrees: usize,
}

struct Mapper {
    max_depth: usize,
    collapsed_subtrees: usize,
}

impl Mapper {
    fn map_node(&mut self, node: NodeRef<'_, Node>, depth: usize) -> Option<HtmlNode> {
        match node.value() {
            Node::Text(text) => Some(HtmlNode::Text(text.text.to_string())),
            Node::Comment(comment) => Some(HtmlNode::Comment(comment.comment.to_string())),
            Node::Element(element) => {
                if depth >= self.max_depth {
                    self.collapsed_subtrees += 1;
                    return Some(HtmlNode::Text(collapse_to_text(node)));
                }

                let attributes = element
                    .attrs()
                    .map(|(name, value)| (name.to_string(), Some(value.to_string())))
                    .collect::<FxHashMap<_, _>>();
                let children = self.map_children(node, depth + 1);

                Some(HtmlNode::Element(HtmlElement::new(
                    element.name(),
                    attributes,
                    children,
                )))
            }
            Node::Document | Node::Fragment | Node::Doctype(_) | Node::ProcessingInstruction(_) => {
                None
            }
        }
    }

    fn map_children(&mut self, node: NodeRef<'_, Node>, depth: usize) -> Vec<HtmlNode> {
        node.children()
            .filter_map(|child| self.map_node(child, depth))
            .collect()
    }
}

fn collapse_to_text(node: NodeRef<'_, Node>) -> String {
    node.descendants()
        .filter_map(|n| n.value().as_text().map(|t| t.text.to_string()))
        .collect()
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

/// Parses `html_input` and maps `<head>` and the children of `<body>` into owned nodes.
///
/// Elements nested deeper than `max_depth` below `<body>` are replaced by their text.
pub fn parse_html(html_input: &str, max_depth: usize) -> ParsedDocument {
    let document = Html::parse_document(html_input);
    let mut mapper = Mapper {
        max_depth: max_depth.max(1),
        collapsed_subtrees: 0,
    };

    let head = select_first(&document, "head")
        .and_then(|head| mapper.map_node(*head, 0))
        .and_then(|node| match node {
            HtmlNode::Element(el) => Some(el),
            _ => None,
        });
    mapper.collapsed_subtrees = 0;

    let body = match select_first(&document, "body") {
        Some(body) => mapper.map_children(*body, 0),
        None => mapper.map_children(*document.root_element(), 0),
    };

    ParsedDocument {
        head,
        body,
        collapsed_subtrees: mapper.collapsed_subtrees,
    }
}
