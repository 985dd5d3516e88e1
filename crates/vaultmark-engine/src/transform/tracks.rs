//! Track-reference detection.
//!
//! Three forms become one `trackMap` placeholder each:
//!
//! - a track embed left by the wiki-link pass (`[[ride.gpx]]`, `![[ride.kml]]`)
//! - a `gpx` / `kml` fence holding the file content inline
//! - a `leaflet` / `footprints` fence whose YAML body lists track files
//!
//! Aggregate bodies are tolerant: values may be wrapped in wiki-link
//! brackets, carry a `|display` suffix, or nest in lists. Only `.gpx` and
//! `.kml` values count. A body that is not valid YAML drops the block.

use serde_yaml::Value;

use crate::models::SyntaxNode;
use crate::parsing::inline::kinds::WikiLink;
use crate::placeholder::{Deferred, PlaceholderKind};
use crate::track::{TrackFormat, TrackSpec};

use super::resolve::{LinkKind, resolve_path};
use super::{SyntaxContext, flat_map_nodes};

/// Fence languages whose body is an aggregate map configuration.
pub const AGGREGATE_LANGUAGES: &[&str] = &["leaflet", "footprints"];

const ID_KEY: &str = "id";

pub fn run(nodes: Vec<SyntaxNode>, ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    flat_map_nodes(nodes, &mut |node| detect(node, ctx))
}

/// Claims the map's element id: `preferred` when the config names one,
/// otherwise `track-{n}` after the handle about to be minted.
fn claim_id(ctx: &mut SyntaxContext<'_>, preferred: Option<String>) -> String {
    let base = preferred.unwrap_or_else(|| format!("track-{}", ctx.arena.next_id().index()));
    ctx.claim_component_id(base)
}

fn mint(ctx: &mut SyntaxContext<'_>, spec: TrackSpec) -> SyntaxNode {
    let id = ctx.arena.mint(Deferred::TrackMap(spec));
    SyntaxNode::Placeholder {
        kind: PlaceholderKind::TrackMap,
        id,
    }
}

fn detect(node: SyntaxNode, ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    match node {
        SyntaxNode::Embed {
            kind: LinkKind::Track,
            url,
            path,
            target,
            subtype,
        } => {
            let Some(format) = TrackFormat::from_extension(&subtype) else {
                return vec![SyntaxNode::Embed {
                    kind: LinkKind::Track,
                    url,
                    path,
                    target,
                    subtype,
                }];
            };
            let id = claim_id(ctx, None);
            vec![mint(ctx, TrackSpec::file(id, format, target, path))]
        }
        SyntaxNode::CodeBlock {
            language: Some(language),
            raw,
        } => {
            if let Some(format) = TrackFormat::from_extension(&language) {
                let id = claim_id(ctx, None);
                return vec![mint(ctx, TrackSpec::inline(id, format, raw))];
            }
            if !AGGREGATE_LANGUAGES.contains(&language.as_str()) {
                return vec![SyntaxNode::CodeBlock {
                    language: Some(language),
                    raw,
                }];
            }
            match parse_aggregate(&raw) {
                Err(err) => {
                    log::warn!(
                        "Dropping malformed {language} block in {}: {err}",
                        ctx.document_path
                    );
                    vec![]
                }
                Ok(config) if config.members.is_empty() => vec![SyntaxNode::CodeBlock {
                    language: Some(language),
                    raw,
                }],
                Ok(config) => vec![aggregate(config, ctx)],
            }
        }
        other => vec![other],
    }
}

#[derive(Debug, PartialEq)]
enum Member {
    File(TrackFormat, String),
    Inline(TrackFormat, String),
}

#[derive(Debug, Default, PartialEq)]
struct AggregateConfig {
    id: Option<String>,
    members: Vec<Member>,
}

fn parse_aggregate(raw: &str) -> Result<AggregateConfig, serde_yaml::Error> {
    let value: Value = serde_yaml::from_str(raw)?;
    let mut config = AggregateConfig::default();
    match value {
        Value::Mapping(map) => {
            for (key, value) in &map {
                if key.as_str() == Some(ID_KEY) {
                    config.id = scalar_string(value);
                } else {
                    collect_members(value, &mut config.members);
                }
            }
        }
        other => collect_members(&other, &mut config.members),
    }
    Ok(config)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn collect_members(value: &Value, out: &mut Vec<Member>) {
    match value {
        Value::String(s) => out.extend(member_of(s)),
        Value::Sequence(items) => items.iter().for_each(|item| collect_members(item, out)),
        Value::Mapping(map) => map.values().for_each(|item| collect_members(item, out)),
        Value::Tagged(tagged) => collect_members(&tagged.value, out),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn member_of(value: &str) -> Option<Member> {
    let value = value.trim();
    if value.starts_with('<') {
        return TrackFormat::sniff(value).map(|format| Member::Inline(format, value.to_string()));
    }
    let path = normalize_reference(value);
    TrackFormat::from_path(path).map(|format| Member::File(format, path.to_string()))
}

/// `![[rides/day1.gpx|Day 1]]` -> `rides/day1.gpx`.
fn normalize_reference(value: &str) -> &str {
    let open = String::from_utf8_lossy(WikiLink::OPEN);
    let close = String::from_utf8_lossy(WikiLink::CLOSE);
    let value = value.strip_prefix(WikiLink::EMBED as char).unwrap_or(value);
    let value = value
        .strip_prefix(open.as_ref())
        .and_then(|inner| inner.strip_suffix(close.as_ref()))
        .unwrap_or(value);
    let value = value
        .split_once(WikiLink::ALIAS as char)
        .map_or(value, |(target, _)| target);
    value.trim()
}

fn aggregate(config: AggregateConfig, ctx: &mut SyntaxContext<'_>) -> SyntaxNode {
    let id = claim_id(ctx, config.id);
    let tracks = config
        .members
        .into_iter()
        .enumerate()
        .map(|(i, member)| {
            let member_id = format!("{id}-{i}");
            match member {
                Member::File(format, path) => {
                    let resolved = resolve_path(&path, ctx.document_path, ctx.file_index);
                    TrackSpec::file(member_id, format, path, resolved)
                }
                Member::Inline(format, payload) => TrackSpec::inline(member_id, format, payload),
            }
        })
        .collect();
    mint(ctx, TrackSpec::aggregate(id, tracks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_markdown;
    use crate::track::{TrackSource, TrackSpecKind};
    use crate::transform::wikilinks;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn detect_all(text: &str, ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
        let nodes = wikilinks::run(parse_markdown(text), ctx);
        run(nodes, ctx)
    }

    fn spec_at(ctx: &SyntaxContext<'_>, node: &SyntaxNode) -> TrackSpec {
        let SyntaxNode::Placeholder { id, .. } = node else {
            panic!("expected placeholder, got {node:?}");
        };
        match ctx.arena.get(*id) {
            Some(Deferred::TrackMap(spec)) => spec.clone(),
            other => panic!("expected track map, got {other:?}"),
        }
    }

    #[test]
    fn mid_sentence_embed_splits_paragraph() {
        let mut ctx = SyntaxContext::new("/Welcome.md");
        let nodes = detect_all("Day one [[trip.gpx]] was long.", &mut ctx);
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[0],
            SyntaxNode::paragraph(vec![SyntaxNode::text("Day one ")])
        );
        assert_eq!(
            spec_at(&ctx, &nodes[1]),
            TrackSpec::file("track-0", TrackFormat::Gpx, "trip.gpx", "/trip.gpx")
        );
        assert_eq!(
            nodes[2],
            SyntaxNode::paragraph(vec![SyntaxNode::text(" was long.")])
        );
    }

    #[test]
    fn embed_in_list_item() {
        let mut ctx = SyntaxContext::new("/Trips/Index.md");
        let nodes = detect_all("- ![[alps.kml]]\n- other\n", &mut ctx);
        let SyntaxNode::List { items, .. } = &nodes[0] else {
            panic!("expected list, got {nodes:?}");
        };
        let spec = spec_at(&ctx, &items[0][0]);
        assert_eq!(spec.format, Some(TrackFormat::Kml));
        assert_eq!(spec.resolved_path.as_deref(), Some("/Trips/alps.kml"));
    }

    #[test]
    fn inline_fence_keeps_payload() {
        let mut ctx = SyntaxContext::new("/x.md");
        let nodes = detect_all("```gpx\n<gpx><trk/></gpx>\n```\n", &mut ctx);
        let spec = spec_at(&ctx, &nodes[0]);
        assert_eq!(spec.source, TrackSource::Inline);
        assert_eq!(spec.payload.as_deref(), Some("<gpx><trk/></gpx>\n"));
    }

    #[test]
    fn aggregate_block_normalizes_wiki_brackets() {
        let mut ctx = SyntaxContext::new("/Trips/Plan.md");
        let text = "```leaflet\nid: alps\ngpx:\n  - [[day1.gpx]]\n  - \"[[day2.kml|Day two]]\"\nheight: 400px\n```\n";
        let nodes = detect_all(text, &mut ctx);
        let spec = spec_at(&ctx, &nodes[0]);
        assert_eq!(spec.kind, TrackSpecKind::Aggregate);
        assert_eq!(spec.id, "alps");
        assert_eq!(spec.format, None);
        assert_eq!(
            spec.tracks,
            vec![
                TrackSpec::file("alps-0", TrackFormat::Gpx, "day1.gpx", "/Trips/day1.gpx"),
                TrackSpec::file("alps-1", TrackFormat::Kml, "day2.kml", "/Trips/day2.kml"),
            ]
        );
    }

    #[test]
    fn malformed_aggregate_is_dropped() {
        let mut ctx = SyntaxContext::new("/x.md");
        let nodes = detect_all("Before\n\n```footprints\ngpx: [unclosed\n```\n\nAfter", &mut ctx);
        assert_eq!(
            nodes,
            vec![
                SyntaxNode::paragraph(vec![SyntaxNode::text("Before")]),
                SyntaxNode::paragraph(vec![SyntaxNode::text("After")]),
            ]
        );
        assert_eq!(ctx.arena.live_count(), 0);
    }

    #[test]
    fn aggregate_without_tracks_stays_code() {
        let mut ctx = SyntaxContext::new("/x.md");
        let nodes = detect_all("```leaflet\nlat: 45\nimage: map.png\n```\n", &mut ctx);
        assert!(matches!(nodes[0], SyntaxNode::CodeBlock { .. }));
    }

    #[test]
    fn shared_config_ids_are_suffixed() {
        let mut ctx = SyntaxContext::new("/Trips/Plan.md");
        let text = "```leaflet\nid: map\ngpx: [a.gpx]\n```\n\n```leaflet\nid: map\ngpx: [b.gpx]\n```\n";
        let nodes = detect_all(text, &mut ctx);
        let first = spec_at(&ctx, &nodes[0]);
        let second = spec_at(&ctx, &nodes[1]);
        assert_eq!(first.id, "map");
        assert_eq!(second.id, "map-1");
        assert_eq!(second.tracks[0].id, "map-1-0");
        assert_eq!(second.tracks[0].file_path.as_deref(), Some("b.gpx"));
    }

    #[test]
    fn config_id_cannot_shadow_generated_id() {
        let mut ctx = SyntaxContext::new("/x.md");
        let text = "```leaflet\nid: track-1\ngpx: [a.gpx]\n```\n\n[[b.gpx]]\n";
        let nodes = detect_all(text, &mut ctx);
        assert_eq!(spec_at(&ctx, &nodes[0]).id, "track-1");
        assert_eq!(spec_at(&ctx, &nodes[1]).id, "track-1-1");
    }

    #[rstest]
    #[case("day.gpx", Some(Member::File(TrackFormat::Gpx, "day.gpx".into())))]
    #[case("![[a/b.KML]]", Some(Member::File(TrackFormat::Kml, "a/b.KML".into())))]
    #[case("[[x.gpx|Label]]", Some(Member::File(TrackFormat::Gpx, "x.gpx".into())))]
    #[case("<kml></kml>", Some(Member::Inline(TrackFormat::Kml, "<kml></kml>".into())))]
    #[case("notes.md", None)]
    #[case("<div/>", None)]
    fn member_values(#[case] value: &str, #[case] expected: Option<Member>) {
        assert_eq!(member_of(value), expected);
    }
}
