use crate::models::SyntaxNode;
use crate::parsing::inline::kinds::{Callout, CalloutHeader};

use super::{SyntaxContext, visit_sequences};

/// Turns block quotes opening with `[!type]` into [`SyntaxNode::Callout`].
///
/// The rest of the marker line is the title (default: the capitalised
/// type); everything after it is the callout body.
pub fn run(mut nodes: Vec<SyntaxNode>, _ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    visit_sequences(&mut nodes, &mut |sequence| {
        for node in sequence.iter_mut() {
            if matches!(node, SyntaxNode::BlockQuote { .. }) {
                let quote = std::mem::replace(node, SyntaxNode::Rule);
                *node = convert(quote);
            }
        }
    });
    nodes
}

fn header_of(children: &[SyntaxNode]) -> Option<CalloutHeader> {
    let Some(SyntaxNode::Paragraph { children: first }) = children.first() else {
        return None;
    };
    match first.first() {
        Some(SyntaxNode::Text { value }) => Callout::parse_header(value),
        _ => None,
    }
}

fn convert(quote: SyntaxNode) -> SyntaxNode {
    let SyntaxNode::BlockQuote { mut children } = quote else {
        return quote;
    };
    let Some(header) = header_of(&children) else {
        return SyntaxNode::BlockQuote { children };
    };
    let SyntaxNode::Paragraph { children: line } = children.remove(0) else {
        return SyntaxNode::BlockQuote { children };
    };

    let mut inline = line.into_iter();
    let mut title = Vec::new();
    if let Some(SyntaxNode::Text { value }) = inline.next() {
        let rest = value[header.marker_len..].trim_start();
        if !rest.is_empty() {
            title.push(SyntaxNode::text(rest));
        }
    }
    for node in inline.by_ref() {
        if matches!(node, SyntaxNode::SoftBreak | SyntaxNode::HardBreak) {
            break;
        }
        title.push(node);
    }
    if title.iter().all(SyntaxNode::is_blank) {
        title = vec![SyntaxNode::text(Callout::default_title(&header.kind))];
    }

    let mut body: Vec<SyntaxNode> = Vec::with_capacity(children.len() + 1);
    let remainder: Vec<SyntaxNode> = inline.collect();
    if !remainder.is_empty() {
        body.push(SyntaxNode::paragraph(remainder));
    }
    body.extend(children);

    SyntaxNode::Callout {
        kind: header.kind,
        title,
        fold: header.fold,
        children: body,
    }
}
