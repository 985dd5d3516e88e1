//! # Compilation Pipeline
//!
//! raw text -> [`Document`] (front matter split) -> syntax tree ->
//! stage-1 passes -> lowering -> stage-2 passes -> hypertext tree.
//!
//! A [`Pipeline`] is just the two ordered pass lists; [`Pipeline::compile`]
//! folds the input through them. Every tree, arena and metadata record is
//! created fresh per call, so one pipeline can compile many documents
//! concurrently.

use crate::io::AssetSource;
use crate::models::{Document, FileIndex, HNode, Metadata};
use crate::parsing::parse_markdown;
use crate::render::components::TRACK_MAP_CLASS;
use crate::render::{self, HypertextPass, RenderContext, flat_map_hnodes};
use crate::track::{TrackSpec, realize_node};
use crate::transform::diagrams::DiagramSpec;
use crate::transform::{self, DEFAULT_ASSET_BASE_URL, SyntaxContext, SyntaxPass};

/// Per-call inputs of [`Pipeline::compile`].
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions<'a> {
    /// Rooted vault path of the document, e.g. `/Notes/Trip.md`.
    pub document_path: &'a str,
    pub file_index: Option<&'a FileIndex>,
    pub asset_base_url: &'a str,
    pub external_links_new_tab: bool,
}

impl<'a> CompileOptions<'a> {
    pub fn new(document_path: &'a str) -> Self {
        Self {
            document_path,
            file_index: None,
            asset_base_url: DEFAULT_ASSET_BASE_URL,
            external_links_new_tab: true,
        }
    }

    pub fn with_index(mut self, index: &'a FileIndex) -> Self {
        self.file_index = Some(index);
        self
    }

    pub fn with_asset_base_url(mut self, base: &'a str) -> Self {
        self.asset_base_url = base;
        self
    }

    pub fn with_external_links_new_tab(mut self, new_tab: bool) -> Self {
        self.external_links_new_tab = new_tab;
        self
    }
}

/// Everything one compile call produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub document: Document,
    /// Root fragment of the final hypertext tree.
    pub tree: HNode,
    pub metadata: Metadata,
    /// Diagram sources for the diagram renderer, in document order.
    pub diagrams: Vec<DiagramSpec>,
    /// Track references for the map renderer, in document order.
    pub tracks: Vec<TrackSpec>,
}

impl Compiled {
    pub fn to_html(&self) -> String {
        self.tree.to_html()
    }

    /// Replaces every track-map placeholder element in the tree with its
    /// realized map, or an error box when loading fails.
    pub fn realize_tracks<S: AssetSource + ?Sized>(&mut self, source: &S) {
        let tracks = &self.tracks;
        let tree = std::mem::replace(&mut self.tree, HNode::fragment(Vec::new()));
        let mut realized = flat_map_hnodes(vec![tree], &mut |node| {
            let spec = node
                .as_element()
                .filter(|element| element.has_class(TRACK_MAP_CLASS))
                .and_then(|element| element.attr("id"))
                .and_then(|id| tracks.iter().find(|spec| spec.id == id));
            match spec {
                Some(spec) => vec![realize_node(spec, source)],
                None => vec![node],
            }
        });
        self.tree = realized.pop().unwrap_or_else(|| HNode::fragment(Vec::new()));
    }
}

/// Ordered stage-1 and stage-2 pass lists.
#[derive(Debug, Clone)]
pub struct Pipeline {
    syntax_passes: Vec<SyntaxPass>,
    hypertext_passes: Vec<HypertextPass>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    pub fn standard() -> Self {
        Self {
            syntax_passes: transform::standard_passes(),
            hypertext_passes: render::standard_passes(),
        }
    }

    pub fn new(syntax_passes: Vec<SyntaxPass>, hypertext_passes: Vec<HypertextPass>) -> Self {
        Self {
            syntax_passes,
            hypertext_passes,
        }
    }

    /// Removes the pass called `name` from either stage. Unknown names are
    /// logged and ignored.
    pub fn without(mut self, name: &str) -> Self {
        let before = self.syntax_passes.len() + self.hypertext_passes.len();
        self.syntax_passes.retain(|pass| pass.name != name);
        self.hypertext_passes.retain(|pass| pass.name != name);
        if self.syntax_passes.len() + self.hypertext_passes.len() == before {
            log::warn!("No transform pass named {name:?}");
        }
        self
    }

    /// Names of all passes, stage 1 first, in application order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.syntax_passes
            .iter()
            .map(|pass| pass.name)
            .chain(self.hypertext_passes.iter().map(|pass| pass.name))
            .collect()
    }

    pub fn compile(&self, text: &str, options: &CompileOptions<'_>) -> Compiled {
        let document = Document::parse(text);

        let mut syntax_ctx = SyntaxContext::new(options.document_path)
            .with_asset_base_url(options.asset_base_url);
        if let Some(index) = options.file_index {
            syntax_ctx = syntax_ctx.with_index(index);
        }
        let nodes = self
            .syntax_passes
            .iter()
            .fold(parse_markdown(&document.body), |nodes, pass| {
                (pass.run)(nodes, &mut syntax_ctx)
            });

        let SyntaxContext {
            arena,
            mut metadata,
            ..
        } = syntax_ctx;
        metadata.tags.extend(document.front_matter_tags());

        let mut render_ctx = RenderContext::new(arena);
        render_ctx.external_links_new_tab = options.external_links_new_tab;
        let tree = self.render(render::lower(nodes), &mut render_ctx);

        let leftover = render_ctx.arena.live_count();
        if leftover > 0 {
            log::debug!(
                "{leftover} placeholder(s) in {} were not substituted",
                options.document_path
            );
        }

        Compiled {
            document,
            tree: HNode::fragment(tree),
            metadata,
            diagrams: render_ctx.diagrams,
            tracks: render_ctx.tracks,
        }
    }

    /// Runs the stage-2 passes over an already-lowered tree.
    pub fn render(&self, nodes: Vec<HNode>, ctx: &mut RenderContext) -> Vec<HNode> {
        self.hypertext_passes
            .iter()
            .fold(nodes, |nodes, pass| (pass.run)(nodes, ctx))
    }
}

/// Compiles `text` with the standard pipeline.
pub fn compile(text: &str, options: &CompileOptions<'_>) -> Compiled {
    Pipeline::standard().compile(text, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn without_removes_named_pass() {
        let pipeline = Pipeline::standard().without("highlights").without("tables");
        assert_eq!(
            pipeline.pass_names(),
            vec![
                "wikilinks",
                "tags",
                "callouts",
                "tracks",
                "diagrams",
                "metadata",
                "components",
                "media",
                "links"
            ]
        );
    }

    #[test]
    fn disabled_pass_leaves_syntax_literal() {
        let options = CompileOptions::new("/x.md");
        let compiled = Pipeline::standard()
            .without("highlights")
            .compile("==kept==", &options);
        assert_eq!(compiled.to_html(), "<p>==kept==</p>");
    }

    #[test]
    fn front_matter_tags_join_inline_tags() {
        let options = CompileOptions::new("/x.md");
        let compiled = compile("---\ntags: [trip, '#alps']\n---\nBody #summer\n", &options);
        assert_eq!(
            compiled.metadata.tags.iter().collect::<Vec<_>>(),
            vec!["alps", "summer", "trip"]
        );
        assert_eq!(compiled.document.compose(), "---\ntags: [trip, '#alps']\n---\nBody #summer\n");
    }

    #[test]
    fn stage_two_is_idempotent() {
        let pipeline = Pipeline::standard();
        let options = CompileOptions::new("/Trips/Alps.md");
        let compiled = pipeline.compile(
            "# Alps\n\n> [!note] Plan\n> ![[map.pdf]] and [site](https://x.dev)\n\n| a |\n|---|\n| [[day.gpx]] |\n\n```mermaid\ngraph TD\n```\n",
            &options,
        );
        let once = compiled.tree.children().to_vec();
        let mut ctx = RenderContext::new(Default::default());
        let twice = pipeline.render(once.clone(), &mut ctx);
        assert_eq!(twice, once);
        assert!(ctx.diagrams.is_empty());
    }

    #[test]
    fn realize_tracks_swaps_placeholders_for_maps() {
        let options = CompileOptions::new("/Trips/Alps.md");
        let mut compiled = compile(
            concat!(
                "Route:\n\n```gpx\n",
                "<gpx version=\"1.1\" creator=\"t\" xmlns=\"http://www.topografix.com/GPX/1/1\">",
                "<trk><trkseg><trkpt lat=\"1\" lon=\"2\"></trkpt><trkpt lat=\"3\" lon=\"4\"></trkpt>",
                "</trkseg></trk></gpx>\n```\n\n![[missing.gpx]]\n"
            ),
            &options,
        );
        let assets: std::collections::HashMap<String, Vec<u8>> = Default::default();

        compiled.realize_tracks(&assets);

        let mut divs = Vec::new();
        compiled.tree.find_all("div", &mut divs);
        let map = divs
            .iter()
            .find(|div| div.attr("id") == Some("track-0"))
            .expect("realized map");
        assert_eq!(
            map.attr("data-bounds"),
            Some("1.000000,2.000000,3.000000,4.000000")
        );
        assert!(divs.iter().any(|div| div.has_class(render::ERROR_CLASS)));
    }

    fn one_point_gpx(lat: u32, lon: u32) -> Vec<u8> {
        format!(
            "<gpx version=\"1.1\" creator=\"t\" xmlns=\"http://www.topografix.com/GPX/1/1\">\
             <trk><trkseg><trkpt lat=\"{lat}\" lon=\"{lon}\"></trkpt></trkseg></trk></gpx>"
        )
        .into_bytes()
    }

    #[test]
    fn maps_sharing_a_config_id_realize_their_own_tracks() {
        let options = CompileOptions::new("/Trips/Plan.md");
        let mut compiled = compile(
            "```leaflet\nid: map\ngpx: [a.gpx]\n```\n\n```leaflet\nid: map\ngpx: [b.gpx]\n```\n",
            &options,
        );
        let ids: Vec<&str> = compiled.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["map", "map-1"]);

        let mut assets = std::collections::HashMap::new();
        assets.insert("/Trips/a.gpx".to_string(), one_point_gpx(1, 1));
        assets.insert("/Trips/b.gpx".to_string(), one_point_gpx(50, 50));
        compiled.realize_tracks(&assets);

        let mut divs = Vec::new();
        compiled.tree.find_all("div", &mut divs);
        let bounds: Vec<(Option<&str>, Option<&str>)> = divs
            .iter()
            .filter(|div| div.has_class(TRACK_MAP_CLASS))
            .map(|div| (div.attr("id"), div.attr("data-bounds")))
            .collect();
        assert_eq!(
            bounds,
            vec![
                (Some("map"), Some("1.000000,1.000000,1.000000,1.000000")),
                (Some("map-1"), Some("50.000000,50.000000,50.000000,50.000000")),
            ]
        );
    }
}
