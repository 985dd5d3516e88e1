//! Deferred-component substitution.
//!
//! Each placeholder marker left by lowering is replaced by the component
//! built from its arena entry, and the entry is consumed. Markers whose
//! handle has no live entry stay in the tree.

use crate::models::{Element, HNode};
use crate::placeholder::{Deferred, PlaceholderId};
use crate::track::{TrackSource, TrackSpec, TrackSpecKind};
use crate::transform::diagrams::DiagramSpec;

use super::{RenderContext, flat_map_hnodes};

pub const TRACK_MAP_CLASS: &str = "track-map";
pub const DIAGRAM_CLASS: &str = "diagram";

pub fn run(nodes: Vec<HNode>, ctx: &mut RenderContext) -> Vec<HNode> {
    flat_map_hnodes(nodes, &mut |node| vec![substitute(node, ctx)])
}

fn substitute(node: HNode, ctx: &mut RenderContext) -> HNode {
    let Some(id) = node.as_element().and_then(PlaceholderId::from_marker) else {
        return node;
    };
    match ctx.arena.take(id) {
        Some(deferred) => component(deferred, ctx),
        None => {
            log::warn!("Unresolved placeholder {id} left in place");
            node
        }
    }
}

fn component(deferred: Deferred, ctx: &mut RenderContext) -> HNode {
    match deferred {
        Deferred::Diagram(spec) => {
            let node = diagram_element(&spec);
            ctx.diagrams.push(spec);
            node
        }
        Deferred::TrackMap(spec) => {
            let node = track_map_element(&spec);
            ctx.tracks.push(spec);
            node
        }
    }
}

/// Diagram container; the source stays readable until the diagram renderer
/// replaces it.
pub fn diagram_element(spec: &DiagramSpec) -> HNode {
    let source = Element::new("pre")
        .with_attr("class", "diagram-source")
        .with_child(HNode::text(spec.source_code.clone()));
    Element::new("div")
        .with_attr("class", DIAGRAM_CLASS)
        .with_attr("id", spec.id.clone())
        .with_attr("data-language", spec.language.clone())
        .with_child(source.into())
        .into()
}

/// Map container describing the track reference for the map renderer.
pub fn track_map_element(spec: &TrackSpec) -> HNode {
    let kind = match spec.kind {
        TrackSpecKind::SingleTrack => "single-track",
        TrackSpecKind::Aggregate => "aggregate",
    };
    let source = match spec.source {
        TrackSource::Inline => "inline",
        TrackSource::File => "file",
        TrackSource::Mixed => "mixed",
    };
    let mut element = Element::new("div")
        .with_attr("class", TRACK_MAP_CLASS)
        .with_attr("id", spec.id.clone())
        .with_attr("data-type", kind)
        .with_attr("data-source", source);
    if let Some(format) = spec.format {
        element = element.with_attr("data-format", format.to_string());
    }
    if let Some(path) = &spec.resolved_path {
        element = element.with_attr("data-path", path.clone());
    }
    if spec.kind == TrackSpecKind::Aggregate {
        element = element.with_attr("data-track-count", spec.tracks.len().to_string());
    }
    element.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::{MARKER_TAG, PlaceholderArena, PlaceholderKind};
    use crate::track::TrackFormat;
    use pretty_assertions::assert_eq;

    fn context() -> (RenderContext, PlaceholderId, PlaceholderId) {
        let mut arena = PlaceholderArena::new();
        let diagram = arena.mint(Deferred::Diagram(DiagramSpec {
            id: "diagram-0".into(),
            language: "mermaid".into(),
            source_code: "graph TD".into(),
        }));
        let track = arena.mint(Deferred::TrackMap(TrackSpec::file(
            "track-1",
            TrackFormat::Gpx,
            "a.gpx",
            "/a.gpx",
        )));
        (RenderContext::new(arena), diagram, track)
    }

    #[test]
    fn marker_is_replaced() {
        let (mut ctx, diagram, _) = context();
        let out = run(vec![diagram.marker(PlaceholderKind::Diagram)], &mut ctx);
        assert_eq!(out.len(), 1);
        let element = out[0].as_element().expect("element");
        assert!(element.has_class(DIAGRAM_CLASS));
        assert_eq!(ctx.diagrams.len(), 1);
        assert_eq!(ctx.arena.live_count(), 1);
    }

    #[test]
    fn marker_between_text_keeps_neighbours() {
        let (mut ctx, _, track) = context();
        let out = run(
            vec![
                Element::new("div")
                    .with_child(HNode::text("before "))
                    .with_child(track.marker(PlaceholderKind::TrackMap))
                    .with_child(HNode::text(" after"))
                    .into(),
            ],
            &mut ctx,
        );
        let children = out[0].children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], HNode::text("before "));
        assert!(children[1].as_element().is_some_and(|e| e.has_class(TRACK_MAP_CLASS)));
        assert_eq!(children[2], HNode::text(" after"));
        assert_eq!(ctx.tracks[0].id, "track-1");
    }

    #[test]
    fn consumed_markers_stay_in_place() {
        let (mut ctx, diagram, _) = context();
        let out = run(
            vec![
                diagram.marker(PlaceholderKind::Diagram),
                diagram.marker(PlaceholderKind::Diagram),
            ],
            &mut ctx,
        );
        assert!(out[0].as_element().is_some_and(|e| e.has_class(DIAGRAM_CLASS)));
        assert_eq!(out[1].as_element().map(|e| e.tag.as_str()), Some(MARKER_TAG));
        assert_eq!(ctx.diagrams.len(), 1);
    }

    #[test]
    fn private_use_text_is_not_a_placeholder() {
        let (mut ctx, diagram, _) = context();
        let forged = format!("\u{E000}{}\u{E001}", diagram.index());
        let out = run(vec![HNode::text(forged.clone())], &mut ctx);
        assert_eq!(out, vec![HNode::text(forged)]);
        assert_eq!(ctx.arena.live_count(), 2);
    }

    #[test]
    fn track_map_attributes() {
        let spec = TrackSpec::file("track-0", TrackFormat::Kml, "r.kml", "/Trips/r.kml");
        insta::assert_snapshot!(
            track_map_element(&spec).to_html(),
            @r#"<div class="track-map" data-format="kml" data-path="/Trips/r.kml" data-source="file" data-type="single-track" id="track-0"></div>"#
        );
    }
}
