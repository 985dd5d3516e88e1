use serde::Serialize;

use crate::placeholder::{PlaceholderId, PlaceholderKind};
use crate::transform::resolve::LinkKind;

/// Column alignment of a table, mirrored from the markup parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

/// Fold state of a callout (`> [!note]-` collapsed, `> [!note]+` expanded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutFold {
    Expanded,
    Collapsed,
}

/// Marks a [`SyntaxNode::Link`] as produced from `[[target]]` syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiTarget {
    /// Target as written, without display text.
    pub raw_target: String,
    /// Vault path the target resolved to (with extension).
    pub resolved_path: String,
    /// True for the `![[note]]` form.
    pub embed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub header: bool,
    pub cells: Vec<Vec<SyntaxNode>>,
}

/// A node of the annotated syntax tree.
///
/// The tree is produced by the markup parser and rewritten in place by the
/// stage-1 passes. Every variant is listed explicitly; constructs without a
/// dedicated variant (footnotes, definition lists, ...) travel as
/// [`SyntaxNode::Opaque`] so their content is still rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyntaxNode {
    Text {
        value: String,
    },
    Code {
        value: String,
    },
    SoftBreak,
    HardBreak,
    Paragraph {
        children: Vec<SyntaxNode>,
    },
    Heading {
        level: u8,
        anchor: Option<String>,
        children: Vec<SyntaxNode>,
    },
    Emphasis {
        children: Vec<SyntaxNode>,
    },
    Strong {
        children: Vec<SyntaxNode>,
    },
    Strikethrough {
        children: Vec<SyntaxNode>,
    },
    Highlight {
        children: Vec<SyntaxNode>,
    },
    Tag {
        name: String,
    },
    Link {
        url: String,
        title: Option<String>,
        wiki: Option<WikiTarget>,
        children: Vec<SyntaxNode>,
    },
    Image {
        url: String,
        alt: String,
        width: Option<u32>,
        height: Option<u32>,
    },
    /// A block-level asset embed (pdf, audio, video, or a track file before
    /// the track detector claims it).
    Embed {
        kind: LinkKind,
        url: String,
        /// Resolved vault path of the asset.
        path: String,
        /// Target as written.
        target: String,
        /// Lowercased file extension.
        subtype: String,
    },
    /// A deferred component whose payload lives in the placeholder arena.
    Placeholder {
        kind: PlaceholderKind,
        id: PlaceholderId,
    },
    CodeBlock {
        language: Option<String>,
        raw: String,
    },
    BlockQuote {
        children: Vec<SyntaxNode>,
    },
    Callout {
        kind: String,
        title: Vec<SyntaxNode>,
        fold: Option<CalloutFold>,
        children: Vec<SyntaxNode>,
    },
    List {
        start: Option<u64>,
        items: Vec<Vec<SyntaxNode>>,
    },
    TaskMarker {
        checked: bool,
    },
    Table {
        alignments: Vec<Align>,
        rows: Vec<TableRow>,
    },
    Html {
        value: String,
    },
    InlineHtml {
        value: String,
    },
    Rule,
    Opaque {
        kind: String,
        children: Vec<SyntaxNode>,
    },
}

impl SyntaxNode {
    pub fn text(value: impl Into<String>) -> Self {
        SyntaxNode::Text {
            value: value.into(),
        }
    }

    pub fn paragraph(children: Vec<SyntaxNode>) -> Self {
        SyntaxNode::Paragraph { children }
    }

    /// Whether the node belongs in an inline run (paragraph content) rather
    /// than in a block sequence.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            SyntaxNode::Text { .. }
                | SyntaxNode::Code { .. }
                | SyntaxNode::SoftBreak
                | SyntaxNode::HardBreak
                | SyntaxNode::Emphasis { .. }
                | SyntaxNode::Strong { .. }
                | SyntaxNode::Strikethrough { .. }
                | SyntaxNode::Highlight { .. }
                | SyntaxNode::Tag { .. }
                | SyntaxNode::Link { .. }
                | SyntaxNode::Image { .. }
                | SyntaxNode::TaskMarker { .. }
                | SyntaxNode::InlineHtml { .. }
        )
    }

    /// Whitespace-only text and breaks carry no prose of their own.
    pub fn is_blank(&self) -> bool {
        match self {
            SyntaxNode::Text { value } => value.trim().is_empty(),
            SyntaxNode::SoftBreak | SyntaxNode::HardBreak => true,
            _ => false,
        }
    }

    /// Every child sequence of this node, in document order.
    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<SyntaxNode>> {
        match self {
            SyntaxNode::Paragraph { children }
            | SyntaxNode::Heading { children, .. }
            | SyntaxNode::Emphasis { children }
            | SyntaxNode::Strong { children }
            | SyntaxNode::Strikethrough { children }
            | SyntaxNode::Highlight { children }
            | SyntaxNode::Link { children, .. }
            | SyntaxNode::BlockQuote { children }
            | SyntaxNode::Opaque { children, .. } => vec![children],
            SyntaxNode::Callout {
                title, children, ..
            } => vec![title, children],
            SyntaxNode::List { items, .. } => items.iter_mut().collect(),
            SyntaxNode::Table { rows, .. } => rows
                .iter_mut()
                .flat_map(|row| row.cells.iter_mut())
                .collect(),
            _ => vec![],
        }
    }

    /// Every child sequence of this node, in document order.
    pub fn child_lists(&self) -> Vec<&Vec<SyntaxNode>> {
        match self {
            SyntaxNode::Paragraph { children }
            | SyntaxNode::Heading { children, .. }
            | SyntaxNode::Emphasis { children }
            | SyntaxNode::Strong { children }
            | SyntaxNode::Strikethrough { children }
            | SyntaxNode::Highlight { children }
            | SyntaxNode::Link { children, .. }
            | SyntaxNode::BlockQuote { children }
            | SyntaxNode::Opaque { children, .. } => vec![children],
            SyntaxNode::Callout {
                title, children, ..
            } => vec![title, children],
            SyntaxNode::List { items, .. } => items.iter().collect(),
            SyntaxNode::Table { rows, .. } => {
                rows.iter().flat_map(|row| row.cells.iter()).collect()
            }
            _ => vec![],
        }
    }

    /// Plain text of this node and its descendants, as a reader would see it.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            SyntaxNode::Text { value } | SyntaxNode::Code { value } => out.push_str(value),
            SyntaxNode::SoftBreak | SyntaxNode::HardBreak => out.push(' '),
            SyntaxNode::Tag { name } => {
                out.push('#');
                out.push_str(name);
            }
            SyntaxNode::Image { alt, .. } => out.push_str(alt),
            _ => {
                for list in self.child_lists() {
                    for child in list {
                        child.push_plain_text(out);
                    }
                }
            }
        }
    }
}

/// Plain text of a node sequence.
pub fn plain_text(nodes: &[SyntaxNode]) -> String {
    nodes.iter().map(SyntaxNode::plain_text).collect()
}

/// Appends `node` to `out`, merging adjacent text nodes.
pub fn push_merged(out: &mut Vec<SyntaxNode>, node: SyntaxNode) {
    if let SyntaxNode::Text { value } = &node
        && let Some(SyntaxNode::Text { value: last }) = out.last_mut()
    {
        last.push_str(value);
        return;
    }
    if matches!(&node, SyntaxNode::Text { value } if value.is_empty()) {
        return;
    }
    out.push(node);
}
