//! # Stage-1 Transforms
//!
//! Passes over the annotated syntax tree, applied in order by the pipeline:
//!
//! 1. **`wikilinks`**: `[[target]]` / `![[target]]` to links, images and block embeds
//! 2. **`tags`**: `#name` to tag nodes
//! 3. **`highlight`**: `==text==` to highlight nodes, across sibling nodes
//! 4. **`callouts`**: `> [!type]` block quotes to callouts
//! 5. **`tracks`**: track embeds and track fences to track-map placeholders
//! 6. **`diagrams`**: mermaid fences to diagram placeholders
//! 7. **`metadata`**: heading anchors, headings, links and tags into [`Metadata`]
//!
//! Passes are pure tree-to-tree functions. Everything they share lives in
//! the per-compile [`SyntaxContext`].

use std::collections::HashSet;
use std::fmt;

use crate::models::{FileIndex, Metadata, SyntaxNode};
use crate::placeholder::PlaceholderArena;

pub mod callouts;
pub mod diagrams;
pub mod highlight;
pub mod metadata;
pub mod resolve;
pub mod tags;
pub mod tracks;
pub mod wikilinks;

pub use resolve::{LinkKind, LinkReference};

/// Prefix of asset URLs when no base is configured.
pub const DEFAULT_ASSET_BASE_URL: &str = "/vault";

/// State shared by the stage-1 passes of one compile call.
#[derive(Debug)]
pub struct SyntaxContext<'a> {
    /// Rooted vault path of the document being compiled, e.g. `/Notes/Trip.md`.
    pub document_path: &'a str,
    pub file_index: Option<&'a FileIndex>,
    pub asset_base_url: &'a str,
    pub arena: PlaceholderArena,
    pub metadata: Metadata,
    /// Element ids handed to track maps and diagrams so far.
    pub component_ids: HashSet<String>,
}

impl<'a> SyntaxContext<'a> {
    pub fn new(document_path: &'a str) -> Self {
        Self {
            document_path,
            file_index: None,
            asset_base_url: DEFAULT_ASSET_BASE_URL,
            arena: PlaceholderArena::new(),
            metadata: Metadata::new(),
            component_ids: HashSet::new(),
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

    /// Reserves `base` as a component id, suffixed `-1`, `-2`, ... when an
    /// earlier component already holds it.
    pub fn claim_component_id(&mut self, base: String) -> String {
        unique_id(base, &mut self.component_ids)
    }
}

/// `base`, or the first of `base-1`, `base-2`, ... not yet in `taken`.
/// The returned id is added to `taken`.
pub fn unique_id(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

pub type SyntaxPassFn = fn(Vec<SyntaxNode>, &mut SyntaxContext<'_>) -> Vec<SyntaxNode>;

/// A named stage-1 pass.
#[derive(Clone, Copy)]
pub struct SyntaxPass {
    pub name: &'static str,
    pub run: SyntaxPassFn,
}

impl fmt::Debug for SyntaxPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyntaxPass").field(&self.name).finish()
    }
}

/// The standard stage-1 chain, in application order.
pub fn standard_passes() -> Vec<SyntaxPass> {
    vec![
        SyntaxPass {
            name: "wikilinks",
            run: wikilinks::run,
        },
        SyntaxPass {
            name: "tags",
            run: tags::run,
        },
        SyntaxPass {
            name: "highlights",
            run: highlight::run,
        },
        SyntaxPass {
            name: "callouts",
            run: callouts::run,
        },
        SyntaxPass {
            name: "tracks",
            run: tracks::run,
        },
        SyntaxPass {
            name: "diagrams",
            run: diagrams::run,
        },
        SyntaxPass {
            name: "metadata",
            run: metadata::run,
        },
    ]
}

/// Calls `f` on every node sequence of the tree, parents before children.
///
/// Link children are not visited: link text is left as written.
pub fn visit_sequences(nodes: &mut Vec<SyntaxNode>, f: &mut impl FnMut(&mut Vec<SyntaxNode>)) {
    f(nodes);
    for node in nodes.iter_mut() {
        if matches!(node, SyntaxNode::Link { .. }) {
            continue;
        }
        for list in node.child_lists_mut() {
            visit_sequences(list, f);
        }
    }
}

/// Rewrites every node in the tree with `f`, children first. `f` returns
/// the replacement nodes for one node.
pub fn flat_map_nodes(
    nodes: Vec<SyntaxNode>,
    f: &mut impl FnMut(SyntaxNode) -> Vec<SyntaxNode>,
) -> Vec<SyntaxNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        for list in node.child_lists_mut() {
            let children = std::mem::take(list);
            *list = flat_map_nodes(children, f);
        }
        out.extend(f(node));
    }
    out
}
