use serde::Serialize;

use crate::models::SyntaxNode;
use crate::placeholder::{Deferred, PlaceholderKind};

use super::{SyntaxContext, flat_map_nodes};

/// Fence languages handed to the diagram renderer.
pub const DIAGRAM_LANGUAGES: &[&str] = &["mermaid"];

/// Source of one diagram, as handed to the diagram-rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramSpec {
    pub id: String,
    pub language: String,
    /// Fence body, verbatim.
    pub source_code: String,
}

pub fn run(nodes: Vec<SyntaxNode>, ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    flat_map_nodes(nodes, &mut |node| match node {
        SyntaxNode::CodeBlock {
            language: Some(language),
            raw,
        } if DIAGRAM_LANGUAGES.contains(&language.as_str()) => {
            let base = format!("diagram-{}", ctx.arena.next_id().index());
            let id = ctx.claim_component_id(base);
            let id = ctx.arena.mint(Deferred::Diagram(DiagramSpec {
                id,
                language,
                source_code: raw,
            }));
            vec![SyntaxNode::Placeholder {
                kind: PlaceholderKind::Diagram,
                id,
            }]
        }
        other => vec![other],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_markdown;
    use pretty_assertions::assert_eq;

    #[test]
    fn mermaid_fence_becomes_placeholder() {
        let mut ctx = SyntaxContext::new("/x.md");
        let nodes = run(
            parse_markdown("Before\n\n```mermaid\ngraph TD\n  A --> B\n```\n"),
            &mut ctx,
        );
        let SyntaxNode::Placeholder { kind, id } = &nodes[1] else {
            panic!("expected placeholder, got {nodes:?}");
        };
        assert_eq!(*kind, PlaceholderKind::Diagram);
        assert_eq!(
            ctx.arena.get(*id),
            Some(&Deferred::Diagram(DiagramSpec {
                id: "diagram-0".into(),
                language: "mermaid".into(),
                source_code: "graph TD\n  A --> B\n".into(),
            }))
        );
    }

    #[test]
    fn diagrams_inside_list_items() {
        let mut ctx = SyntaxContext::new("/x.md");
        run(
            parse_markdown("- item\n\n  ```mermaid\n  pie\n  ```\n"),
            &mut ctx,
        );
        assert_eq!(ctx.arena.live_count(), 1);
    }

    #[test]
    fn diagram_id_taken_by_a_map_is_suffixed() {
        let mut ctx = SyntaxContext::new("/x.md");
        ctx.claim_component_id("diagram-0".into());
        let nodes = run(parse_markdown("```mermaid\npie\n```\n"), &mut ctx);
        let SyntaxNode::Placeholder { id, .. } = &nodes[0] else {
            panic!("expected placeholder, got {nodes:?}");
        };
        match ctx.arena.get(*id) {
            Some(Deferred::Diagram(spec)) => assert_eq!(spec.id, "diagram-0-1"),
            other => panic!("expected diagram, got {other:?}"),
        }
    }

    #[test]
    fn other_fences_stay_code() {
        let mut ctx = SyntaxContext::new("/x.md");
        let nodes = run(parse_markdown("```rust\nfn main() {}\n```\n"), &mut ctx);
        assert!(matches!(nodes[0], SyntaxNode::CodeBlock { .. }));
        assert_eq!(ctx.arena.live_count(), 0);
    }
}
