use crate::models::{Element, HNode};

use super::RenderContext;

pub const WRAPPER_CLASS: &str = "table-wrapper";

/// Wraps every table in a `div.table-wrapper`, unless it already is.
pub fn run(nodes: Vec<HNode>, _ctx: &mut RenderContext) -> Vec<HNode> {
    wrap(nodes, false)
}

fn is_wrapper(element: &Element) -> bool {
    element.tag == "div" && element.has_class(WRAPPER_CLASS)
}

fn wrap(nodes: Vec<HNode>, inside_wrapper: bool) -> Vec<HNode> {
    nodes
        .into_iter()
        .map(|node| match node {
            HNode::Element(mut element) => {
                let wrapper = is_wrapper(&element);
                element.children = wrap(std::mem::take(&mut element.children), wrapper);
                if element.tag == "table" && !inside_wrapper {
                    Element::new("div")
                        .with_attr("class", WRAPPER_CLASS)
                        .with_child(element.into())
                        .into()
                } else {
                    element.into()
                }
            }
            HNode::Fragment { children } => HNode::Fragment {
                children: wrap(children, inside_wrapper),
            },
            other => other,
        })
        .collect()
}
