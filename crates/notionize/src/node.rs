use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Text(String),
    Element(HtmlElement),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    pub tag_name: String,
    pub attributes: FxHashMap<String, Option<String>>,
    pub children: Vec<HtmlNode>,
}

impl HtmlNode {
    pub fn as_element(&self) -> Option<&HtmlElement> {
        match self {
            HtmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_blank_text(&self) -> bool {
        matches!(self, HtmlNode::Text(text) if text.trim().is_empty())
    }
}

impl HtmlElement {
    pub fn new(
        tag_name: &str,
        attributes: FxHashMap<String, Option<String>>,
        children: Vec<HtmlNode>,
    ) -> Self {
        HtmlElement {
            tag_name: tag_name.to_lowercase(),
            attributes,
            children,
        }
    }

    /// Returns the attribute value, treating valueless attributes as absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.as_deref())
    }

    /// Returns the attribute value only when it is present and non-empty.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn is(&self, tag_name: &str) -> bool {
        self.tag_name == tag_name
    }

    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &HtmlElement> {
        self.children.iter().filter_map(HtmlNode::as_element)
    }

    /// First descendant (not including `self`) with the given tag, in document order.
    pub fn find(&self, tag_name: &str) -> Option<&HtmlElement> {
        self.find_all(&[tag_name]).into_iter().next()
    }

    /// All descendants (not including `self`) whose tag is one of `tag_names`, in document order.
    pub fn find_all(&self, tag_names: &[&str]) -> Vec<&HtmlElement> {
        let mut found = Vec::new();
        let mut stack: Vec<&HtmlElement> = self.child_elements().rev().collect();

        while let Some(el) = stack.pop() {
            if tag_names.contains(&el.tag_name.as_str()) {
                found.push(el);
            }
            stack.extend(el.child_elements().rev());
        }

        found
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                HtmlNode::Text(t) => text.push_str(t),
                HtmlNode::Element(el) => text.push_str(&el.text_content()),
                HtmlNode::Comment(_) => {}
            }
        }
        text
    }

    /// Every descendant text node trimmed, empty pieces dropped, joined without a separator.
    pub fn stripped_text(&self) -> String {
        let mut text = String::new();
        let mut stack: Vec<&HtmlNode> = self.children.iter().rev().collect();

        while let Some(node) = stack.pop() {
            match node {
                HtmlNode::Text(t) => text.push_str(t.trim()),
                HtmlNode::Element(el) => stack.extend(el.children.iter().rev()),
                HtmlNode::Comment(_) => {}
            }
        }

        text
    }

    /// Replaces every descendant whose tag is in `tag_names` by its own children.
    pub fn unwrap_tags(&mut self, tag_names: &[&str]) {
        let mut unwrapped = Vec::with_capacity(self.children.len());

        for child in self.children.drain(..) {
            match child {
                HtmlNode::Element(mut el) => {
                    el.unwrap_tags(tag_names);
                    if tag_names.contains(&el.tag_name.as_str()) {
                        unwrapped.extend(el.children);
                    } else {
                        unwrapped.push(HtmlNode::Element(el));
                    }
                }
                other => unwrapped.push(other),
            }
        }

        self.children = unwrapped;
    }
}
