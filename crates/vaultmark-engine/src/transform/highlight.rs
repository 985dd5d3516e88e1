//! `==text==` highlights.
//!
//! Marks are paired left to right within one node sequence, so a highlight
//! may wrap emphasis, links or code between its marks. An unpaired last
//! mark stays literal text, as does an empty pair (`====`).

use crate::models::{SyntaxNode, push_merged};
use crate::parsing::inline::find_highlight_marks;
use crate::parsing::inline::kinds::Highlight;

use super::{SyntaxContext, visit_sequences};

pub fn run(mut nodes: Vec<SyntaxNode>, _ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    visit_sequences(&mut nodes, &mut |sequence| {
        let total: usize = sequence
            .iter()
            .map(|node| match node {
                SyntaxNode::Text { value } => find_highlight_marks(value).len(),
                _ => 0,
            })
            .sum();
        if total < 2 {
            return;
        }
        let old = std::mem::take(sequence);
        *sequence = pair_marks(old, total - total % 2);
    });
    nodes
}

fn mark_text() -> String {
    String::from_utf8_lossy(Highlight::MARK).into_owned()
}

/// Rebuilds `nodes`, treating the first `usable` marks as delimiters.
fn pair_marks(nodes: Vec<SyntaxNode>, usable: usize) -> Vec<SyntaxNode> {
    let mut out = Vec::new();
    let mut open: Option<Vec<SyntaxNode>> = None;
    let mut used = 0;

    let push = |open: &mut Option<Vec<SyntaxNode>>, out: &mut Vec<SyntaxNode>, node: SyntaxNode| {
        match open {
            Some(inner) => push_merged(inner, node),
            None => push_merged(out, node),
        }
    };

    for node in nodes {
        let SyntaxNode::Text { value } = node else {
            push(&mut open, &mut out, node);
            continue;
        };
        let mut last = 0;
        for mark in find_highlight_marks(&value) {
            if used == usable {
                break;
            }
            push(&mut open, &mut out, SyntaxNode::text(&value[last..mark.start]));
            last = mark.end;
            used += 1;
            match open.take() {
                None => open = Some(Vec::new()),
                Some(inner) if inner.is_empty() => {
                    push_merged(&mut out, SyntaxNode::text(mark_text().repeat(2)))
                }
                Some(children) => out.push(SyntaxNode::Highlight { children }),
            }
        }
        push(&mut open, &mut out, SyntaxNode::text(&value[last..]));
    }

    // Unbalanced: restore the opening mark.
    if let Some(inner) = open {
        push_merged(&mut out, SyntaxNode::text(mark_text()));
        for node in inner {
            push_merged(&mut out, node);
        }
    }
    out
}
