use std::collections::HashSet;

use crate::models::{HeadingRecord, LinkRecord, SyntaxNode, plain_text};
use crate::placeholder::Deferred;
use crate::track::TrackSpec;

use super::{SyntaxContext, unique_id};
use super::resolve::asset_url;

/// Anchor slug of a heading: lowercase alphanumerics, runs of whitespace,
/// `-` and `_` joined by a single `-`, everything else dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

/// Assigns unique heading anchors and records headings, links and tags in
/// document order.
pub fn run(mut nodes: Vec<SyntaxNode>, ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    let mut taken = ctx.component_ids.clone();
    collect(&mut nodes, ctx, &mut taken);
    nodes
}

fn collect(nodes: &mut [SyntaxNode], ctx: &mut SyntaxContext<'_>, taken: &mut HashSet<String>) {
    for node in nodes.iter_mut() {
        match node {
            SyntaxNode::Heading {
                level,
                anchor,
                children,
            } => {
                let text = plain_text(children).trim().to_string();
                let base = anchor.take().unwrap_or_else(|| slugify(&text));
                let anchor_id = unique_id(base, taken);
                *anchor = Some(anchor_id.clone());
                ctx.metadata.headings.push(HeadingRecord {
                    level: *level,
                    text,
                    anchor_id,
                });
            }
            SyntaxNode::Link {
                url,
                wiki,
                children,
                ..
            } => {
                ctx.metadata.links.push(LinkRecord {
                    href: url.clone(),
                    text: plain_text(children),
                    resolved_path: wiki.as_ref().map(|w| w.resolved_path.clone()),
                });
                continue;
            }
            SyntaxNode::Embed {
                url, path, target, ..
            } => ctx.metadata.links.push(LinkRecord {
                href: url.clone(),
                text: target.clone(),
                resolved_path: Some(path.clone()),
            }),
            SyntaxNode::Placeholder { id, .. } => {
                if let Some(Deferred::TrackMap(spec)) = ctx.arena.get(*id) {
                    let mut records = Vec::new();
                    track_links(spec, ctx.asset_base_url, &mut records);
                    ctx.metadata.links.extend(records);
                }
            }
            SyntaxNode::Tag { name } => {
                ctx.metadata.tags.insert(name.clone());
            }
            _ => {}
        }
        for list in node.child_lists_mut() {
            collect(list, ctx, taken);
        }
    }
}

fn track_links(spec: &TrackSpec, asset_base_url: &str, out: &mut Vec<LinkRecord>) {
    if let (Some(file_path), Some(resolved)) = (&spec.file_path, &spec.resolved_path) {
        out.push(LinkRecord {
            href: asset_url(asset_base_url, resolved),
            text: file_path.clone(),
            resolved_path: Some(resolved.clone()),
        });
    }
    for member in &spec.tracks {
        track_links(member, asset_base_url, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileIndex, IndexEntry};
    use crate::parsing::parse_markdown;
    use crate::transform::{tags, tracks, wikilinks};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Getting Started", "getting-started")]
    #[case("  Día 2: Col du Galibier!  ", "día-2-col-du-galibier")]
    #[case("snake_case -- and  more", "snake-case-and-more")]
    #[case("C++ & Rust", "c-rust")]
    #[case("???", "section")]
    fn slugs(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(slugify(text), expected);
    }

    #[test]
    fn duplicate_headings_get_numeric_suffixes() {
        let mut ctx = SyntaxContext::new("/x.md");
        let nodes = run(
            parse_markdown("# Notes\n\n## Notes\n\n### Notes 1\n\n## Notes\n"),
            &mut ctx,
        );
        let anchors: Vec<&str> = ctx
            .metadata
            .headings
            .iter()
            .map(|h| h.anchor_id.as_str())
            .collect();
        assert_eq!(anchors, vec!["notes", "notes-1", "notes-1-1", "notes-2"]);
        assert!(matches!(
            &nodes[1],
            SyntaxNode::Heading { anchor: Some(a), .. } if a == "notes-1"
        ));
    }

    #[test]
    fn anchors_skip_component_ids() {
        let mut ctx = SyntaxContext::new("/x.md");
        let nodes = tracks::run(parse_markdown("# Track 0\n\n```gpx\n<gpx/>\n```\n"), &mut ctx);
        run(nodes, &mut ctx);
        assert_eq!(ctx.metadata.headings[0].anchor_id, "track-0-1");
    }

    #[test]
    fn collects_links_tags_and_track_files() {
        let index = FileIndex::from_entries(vec![IndexEntry::from("Gear/Packing List.md")]);
        let mut ctx = SyntaxContext::new("/Trips/Alps.md").with_index(&index);
        let mut nodes = parse_markdown(
            "# Alps #summer\n\nSee [[Packing List]], [docs](https://x.dev) and [[day1.gpx]].",
        );
        nodes = wikilinks::run(nodes, &mut ctx);
        nodes = tags::run(nodes, &mut ctx);
        nodes = tracks::run(nodes, &mut ctx);
        run(nodes, &mut ctx);

        assert_eq!(
            ctx.metadata.headings,
            vec![HeadingRecord {
                level: 1,
                text: "Alps #summer".into(),
                anchor_id: "alps-summer".into(),
            }]
        );
        assert_eq!(
            ctx.metadata.tags.iter().collect::<Vec<_>>(),
            vec!["summer"]
        );
        assert_eq!(
            ctx.metadata.outgoing_paths(),
            vec!["/Gear/Packing List.md", "/Trips/day1.gpx"]
        );
        assert_eq!(ctx.metadata.links[1].resolved_path, None);
        assert_eq!(ctx.metadata.links[2].href, "/vault/Trips/day1.gpx");
    }
}
