use std::collections::BTreeMap;

use serde::Serialize;

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "source", "wbr"];

/// An element of the hypertext tree: tag name, attributes, ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<HNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<HNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: HNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Adds `class` to the class list unless it is already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attributes.get("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.attributes.insert("class".into(), classes);
    }
}

impl From<Element> for HNode {
    fn from(element: Element) -> Self {
        HNode::Element(element)
    }
}

/// A node of the generic hypertext tree handed to the host renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HNode {
    Text { value: String },
    Element(Element),
    Fragment { children: Vec<HNode> },
    /// Raw markup passed through from the source document.
    Raw { html: String },
}

impl HNode {
    pub fn text(value: impl Into<String>) -> Self {
        HNode::Text {
            value: value.into(),
        }
    }

    pub fn fragment(children: Vec<HNode>) -> Self {
        HNode::Fragment { children }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            HNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn children(&self) -> &[HNode] {
        match self {
            HNode::Element(element) => &element.children,
            HNode::Fragment { children } => children,
            _ => &[],
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        match self {
            HNode::Text { value } => value.clone(),
            HNode::Raw { .. } => String::new(),
            _ => self.children().iter().map(HNode::text_content).collect(),
        }
    }

    /// Depth-first search for elements with the given tag.
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if let HNode::Element(element) = self
            && element.tag == tag
        {
            out.push(element);
        }
        for child in self.children() {
            child.find_all(tag, out);
        }
    }

    /// Serializes the tree as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            HNode::Text { value } => out.push_str(&html_escape::encode_text(value)),
            HNode::Raw { html } => out.push_str(html),
            HNode::Fragment { children } => {
                for child in children {
                    child.write_html(out);
                }
            }
            HNode::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    return;
                }
                for child in &element.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}
