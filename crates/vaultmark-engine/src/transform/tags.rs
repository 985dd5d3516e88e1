use crate::models::SyntaxNode;
use crate::parsing::inline::{InlineNode, parse_tags};

use super::{SyntaxContext, visit_sequences};

/// Splits `#name` out of text nodes into [`SyntaxNode::Tag`].
pub fn run(mut nodes: Vec<SyntaxNode>, _ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    visit_sequences(&mut nodes, &mut |sequence| {
        if !sequence
            .iter()
            .any(|node| matches!(node, SyntaxNode::Text { value } if value.contains('#')))
        {
            return;
        }
        let old = std::mem::take(sequence);
        for node in old {
            match node {
                SyntaxNode::Text { value } => sequence.extend(split_tags(&value)),
                other => sequence.push(other),
            }
        }
    });
    nodes
}

fn split_tags(value: &str) -> Vec<SyntaxNode> {
    parse_tags(value)
        .into_iter()
        .map(|segment| match segment {
            InlineNode::Tag { name, .. } => SyntaxNode::Tag {
                name: name.slice(value).to_string(),
            },
            other => SyntaxNode::text(other.full().slice(value)),
        })
        .collect()
}
