//! # Lowering and Stage-2 Transforms
//!
//! [`lower`] turns the annotated syntax tree into the generic hypertext
//! tree. The stage-2 passes then run over that tree in order:
//!
//! 1. **`components`**: placeholder markers to diagram and track-map components
//! 2. **`media`**: pdf, video and audio embeds to their players
//! 3. **`tables`**: tables wrapped for horizontal scrolling
//! 4. **`links`**: external links classified
//!
//! Every stage-2 pass is idempotent: running the chain again over its own
//! output changes nothing.

use std::fmt;

use crate::models::{Element, HNode};
use crate::placeholder::PlaceholderArena;
use crate::track::TrackSpec;
use crate::transform::diagrams::DiagramSpec;

pub mod components;
pub mod links;
pub mod lower;
pub mod media;
pub mod tables;

pub use lower::lower;

/// Class of the inline box shown for a failed embed.
pub const ERROR_CLASS: &str = "embed-error";

/// State shared by the stage-2 passes of one compile call.
#[derive(Debug, Default)]
pub struct RenderContext {
    /// Arena handed over from stage 1; substitution consumes its entries.
    pub arena: PlaceholderArena,
    pub external_links_new_tab: bool,
    /// Diagram sources, in document order, for the diagram renderer.
    pub diagrams: Vec<DiagramSpec>,
    /// Track references, in document order, for the map renderer.
    pub tracks: Vec<TrackSpec>,
}

impl RenderContext {
    pub fn new(arena: PlaceholderArena) -> Self {
        Self {
            arena,
            external_links_new_tab: true,
            diagrams: Vec::new(),
            tracks: Vec::new(),
        }
    }
}

pub type HypertextPassFn = fn(Vec<HNode>, &mut RenderContext) -> Vec<HNode>;

/// A named stage-2 pass.
#[derive(Clone, Copy)]
pub struct HypertextPass {
    pub name: &'static str,
    pub run: HypertextPassFn,
}

impl fmt::Debug for HypertextPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HypertextPass").field(&self.name).finish()
    }
}

/// The standard stage-2 chain, in application order.
pub fn standard_passes() -> Vec<HypertextPass> {
    vec![
        HypertextPass {
            name: "components",
            run: components::run,
        },
        HypertextPass {
            name: "media",
            run: media::run,
        },
        HypertextPass {
            name: "tables",
            run: tables::run,
        },
        HypertextPass {
            name: "links",
            run: links::run,
        },
    ]
}

/// Small inline box naming the embed that failed and why.
pub fn error_box(source: &str, cause: &str) -> HNode {
    Element::new("div")
        .with_attr("class", ERROR_CLASS)
        .with_attr("role", "alert")
        .with_child(
            Element::new("strong")
                .with_child(HNode::text(source))
                .into(),
        )
        .with_child(HNode::text(format!(": {cause}")))
        .into()
}

/// Rewrites every node with `f`, children first. `f` returns the
/// replacement nodes for one node.
pub fn flat_map_hnodes(nodes: Vec<HNode>, f: &mut impl FnMut(HNode) -> Vec<HNode>) -> Vec<HNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = match node {
            HNode::Element(mut element) => {
                element.children = flat_map_hnodes(std::mem::take(&mut element.children), f);
                HNode::Element(element)
            }
            HNode::Fragment { children } => HNode::Fragment {
                children: flat_map_hnodes(children, f),
            },
            other => other,
        };
        out.extend(f(node));
    }
    out
}
