use super::node::{HtmlElement, HtmlNode};

/// A leaf of an element subtree, paired with the elements enclosing it.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafUnit<'a> {
    Text {
        content: &'a str,
        chain: Vec<&'a HtmlElement>,
    },
    /// Continues the previous run on a new line; carries no style.
    LineBreak,
    Image {
        src: &'a str,
        /// Ends with the `<img>` element itself.
        chain: Vec<&'a HtmlElement>,
    },
}

enum Frame<'a> {
    Enter(&'a HtmlElement, Vec<&'a HtmlElement>),
    Text(&'a str, Vec<&'a HtmlElement>),
    Break,
}

/// Walks `root` depth-first and returns its leaves in document order.
///
/// The chain of every leaf starts at `root` and ends at the leaf's immediate
/// container. Whitespace-only text is dropped and `<img>` elements are not
/// descended into.
pub fn extract_leaf_units(root: &HtmlElement) -> Vec<LeafUnit<'_>> {
    let mut leaves = Vec::new();
    let mut stack = vec![Frame::Enter(root, Vec::new())];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Text(content, chain) => leaves.push(LeafUnit::Text { content, chain }),
            Frame::Break => leaves.push(LeafUnit::LineBreak),
            Frame::Enter(element, mut chain) => {
                chain.push(element);

                if element.is("img") {
                    leaves.push(LeafUnit::Image {
                        src: element.attr("src").unwrap_or_default(),
                        chain,
                    });
                    continue;
                }

                for child in element.children.iter().rev() {
                    match child {
                        HtmlNode::Text(text) if !text.trim().is_empty() => {
                            stack.push(Frame::Text(text.as_str(), chain.clone()));
                        }
                        HtmlNode::Element(el) if el.is("br") => {
                            stack.push(Frame::Break);
                        }
                        HtmlNode::Element(el) => stack.push(Frame::Enter(el, chain.clone())),
                        HtmlNode::Text(_) | HtmlNode::Comment(_) => {}
                    }
                }
            }
        }
    }

    leaves
}
