//! Wiki-link resolution.
//!
//! Rewrites `[[target]]` and `![[target]]` inside text runs. Notes become
//! links, images become inline images and block-kind assets (tracks, pdf,
//! audio, video) become [`SyntaxNode::Embed`] blocks. A block embed never
//! stays inside an inline run: the enclosing paragraph (or tight list item
//! run) is split around it. Where a block cannot stand (headings, table
//! cells) the embed degrades to a link to the asset.

use crate::models::{SyntaxNode, WikiTarget, push_merged};
use crate::parsing::inline::{InlineNode, Span, parse_wikilinks};

use super::SyntaxContext;
use super::metadata::slugify;
use super::resolve::{LinkKind, LinkReference, asset_url, note_href, resolve};

/// A rewritten node and whether it must stand as its own block.
#[derive(Debug)]
enum Piece {
    Inline(SyntaxNode),
    Block(SyntaxNode),
}

impl Piece {
    fn is_block(&self) -> bool {
        matches!(self, Piece::Block(_))
    }
}

pub fn run(nodes: Vec<SyntaxNode>, ctx: &mut SyntaxContext<'_>) -> Vec<SyntaxNode> {
    rewrite_sequence(nodes, ctx)
}

fn rewrite_sequence(nodes: Vec<SyntaxNode>, ctx: &SyntaxContext<'_>) -> Vec<SyntaxNode> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut run = Vec::new();

    for node in nodes {
        if node.is_inline() {
            run.push(node);
            continue;
        }
        flush_inline_run(&mut out, std::mem::take(&mut run), ctx);

        match node {
            SyntaxNode::Paragraph { children } => {
                let pieces = rewrite_inlines(children, ctx, true);
                if pieces.iter().any(Piece::is_block) {
                    split_into_blocks(&mut out, pieces);
                } else {
                    out.push(SyntaxNode::paragraph(inline_nodes(pieces)));
                }
            }
            SyntaxNode::Heading {
                level,
                anchor,
                children,
            } => out.push(SyntaxNode::Heading {
                level,
                anchor,
                children: inline_nodes(rewrite_inlines(children, ctx, false)),
            }),
            SyntaxNode::Table {
                alignments,
                mut rows,
            } => {
                for row in &mut rows {
                    for cell in &mut row.cells {
                        let children = std::mem::take(cell);
                        *cell = inline_nodes(rewrite_inlines(children, ctx, false));
                    }
                }
                out.push(SyntaxNode::Table { alignments, rows });
            }
            mut other => {
                for list in other.child_lists_mut() {
                    let children = std::mem::take(list);
                    *list = rewrite_sequence(children, ctx);
                }
                out.push(other);
            }
        }
    }

    flush_inline_run(&mut out, run, ctx);
    out
}

/// Inline nodes sitting directly in a sequence (tight list items, footnotes).
/// They get paragraph wrappers only when a block embed splits them.
fn flush_inline_run(out: &mut Vec<SyntaxNode>, run: Vec<SyntaxNode>, ctx: &SyntaxContext<'_>) {
    if run.is_empty() {
        return;
    }
    let pieces = rewrite_inlines(run, ctx, true);
    if pieces.iter().any(Piece::is_block) {
        split_into_blocks(out, pieces);
    } else {
        out.extend(inline_nodes(pieces));
    }
}

fn split_into_blocks(out: &mut Vec<SyntaxNode>, pieces: Vec<Piece>) {
    let mut run = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Inline(node) => push_merged(&mut run, node),
            Piece::Block(block) => {
                push_paragraph(out, std::mem::take(&mut run));
                out.push(block);
            }
        }
    }
    push_paragraph(out, run);
}

/// Pushes `run` as a paragraph unless it is only whitespace and breaks.
fn push_paragraph(out: &mut Vec<SyntaxNode>, mut run: Vec<SyntaxNode>) {
    while run.first().is_some_and(SyntaxNode::is_blank) {
        run.remove(0);
    }
    while run.last().is_some_and(SyntaxNode::is_blank) {
        run.pop();
    }
    if !run.is_empty() {
        out.push(SyntaxNode::paragraph(run));
    }
}

fn inline_nodes(pieces: Vec<Piece>) -> Vec<SyntaxNode> {
    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Inline(node) | Piece::Block(node) => push_merged(&mut out, node),
        }
    }
    out
}

fn rewrite_inlines(nodes: Vec<SyntaxNode>, ctx: &SyntaxContext<'_>, allow_blocks: bool) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            SyntaxNode::Text { value } => pieces.extend(expand_text(&value, ctx, allow_blocks)),
            SyntaxNode::Emphasis { children } => pieces.extend(rewrap(
                rewrite_inlines(children, ctx, allow_blocks),
                |children| SyntaxNode::Emphasis { children },
            )),
            SyntaxNode::Strong { children } => pieces.extend(rewrap(
                rewrite_inlines(children, ctx, allow_blocks),
                |children| SyntaxNode::Strong { children },
            )),
            SyntaxNode::Strikethrough { children } => pieces.extend(rewrap(
                rewrite_inlines(children, ctx, allow_blocks),
                |children| SyntaxNode::Strikethrough { children },
            )),
            SyntaxNode::Highlight { children } => pieces.extend(rewrap(
                rewrite_inlines(children, ctx, allow_blocks),
                |children| SyntaxNode::Highlight { children },
            )),
            other => pieces.push(Piece::Inline(other)),
        }
    }
    pieces
}

/// Rebuilds an inline container around each inline stretch of `inner`,
/// letting block pieces escape between the stretches.
fn rewrap(inner: Vec<Piece>, make: fn(Vec<SyntaxNode>) -> SyntaxNode) -> Vec<Piece> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for piece in inner {
        match piece {
            Piece::Inline(node) => push_merged(&mut run, node),
            Piece::Block(block) => {
                if !run.is_empty() {
                    out.push(Piece::Inline(make(std::mem::take(&mut run))));
                }
                out.push(Piece::Block(block));
            }
        }
    }
    if !run.is_empty() {
        out.push(Piece::Inline(make(run)));
    }
    out
}

fn expand_text(value: &str, ctx: &SyntaxContext<'_>, allow_blocks: bool) -> Vec<Piece> {
    parse_wikilinks(value)
        .into_iter()
        .map(|segment| match segment {
            InlineNode::Text(span) => Piece::Inline(SyntaxNode::text(span.slice(value))),
            InlineNode::WikiLink {
                full,
                embed,
                target,
                fragment,
                alias,
            } => {
                let link = ParsedLink {
                    literal: full.slice(value),
                    embed,
                    target: target.slice(value).trim(),
                    fragment: non_empty(fragment, value),
                    alias: non_empty(alias, value),
                };
                link.rewrite(ctx, allow_blocks)
            }
            InlineNode::Tag { full, .. } => Piece::Inline(SyntaxNode::text(full.slice(value))),
        })
        .collect()
}

fn non_empty(span: Option<Span>, source: &str) -> Option<&str> {
    span.map(|span| span.slice(source).trim())
        .filter(|text| !text.is_empty())
}

struct ParsedLink<'s> {
    literal: &'s str,
    embed: bool,
    target: &'s str,
    fragment: Option<&'s str>,
    alias: Option<&'s str>,
}

impl ParsedLink<'_> {
    fn rewrite(&self, ctx: &SyntaxContext<'_>, allow_blocks: bool) -> Piece {
        if self.target.is_empty() {
            return Piece::Inline(self.same_document_link(ctx));
        }
        let Some(reference) = resolve(self.target, ctx.document_path, ctx.file_index) else {
            log::debug!("leaving {} as text: unrecognised extension", self.literal);
            return Piece::Inline(SyntaxNode::text(self.literal));
        };

        match reference.kind {
            LinkKind::File => Piece::Inline(self.note_link(&reference)),
            LinkKind::Image => Piece::Inline(self.image(&reference, ctx)),
            _ if allow_blocks => Piece::Block(SyntaxNode::Embed {
                kind: reference.kind,
                url: asset_url(ctx.asset_base_url, &reference.resolved_path),
                path: reference.resolved_path.clone(),
                target: reference.raw_target.clone(),
                subtype: reference.extension.clone().unwrap_or_default(),
            }),
            _ => Piece::Inline(self.asset_link(&reference, ctx)),
        }
    }

    /// `[[#Heading]]`: an anchor in the current document.
    fn same_document_link(&self, ctx: &SyntaxContext<'_>) -> SyntaxNode {
        let Some(fragment) = self.fragment else {
            return SyntaxNode::text(self.literal);
        };
        SyntaxNode::Link {
            url: format!("#{}", slugify(fragment)),
            title: None,
            wiki: Some(WikiTarget {
                raw_target: format!("#{fragment}"),
                resolved_path: ctx.document_path.to_string(),
                embed: self.embed,
            }),
            children: vec![SyntaxNode::text(self.alias.unwrap_or(fragment))],
        }
    }

    fn note_link(&self, reference: &LinkReference) -> SyntaxNode {
        let anchor = self.fragment.map(slugify);
        let display = match (self.alias, self.fragment) {
            (Some(alias), _) => alias.to_string(),
            (None, Some(fragment)) => format!("{} > {fragment}", self.target),
            (None, None) => self.target.to_string(),
        };
        SyntaxNode::Link {
            url: note_href(&reference.resolved_path, anchor.as_deref()),
            title: None,
            wiki: Some(self.wiki_target(reference)),
            children: vec![SyntaxNode::text(display)],
        }
    }

    fn asset_link(&self, reference: &LinkReference, ctx: &SyntaxContext<'_>) -> SyntaxNode {
        SyntaxNode::Link {
            url: asset_url(ctx.asset_base_url, &reference.resolved_path),
            title: None,
            wiki: Some(self.wiki_target(reference)),
            children: vec![SyntaxNode::text(self.alias.unwrap_or(self.target))],
        }
    }

    fn image(&self, reference: &LinkReference, ctx: &SyntaxContext<'_>) -> SyntaxNode {
        let size = self.alias.and_then(parse_size);
        let alt = match (self.alias, size) {
            (Some(alias), None) => alias,
            _ => file_name(self.target),
        };
        SyntaxNode::Image {
            url: asset_url(ctx.asset_base_url, &reference.resolved_path),
            alt: alt.to_string(),
            width: size.map(|(w, _)| w),
            height: size.and_then(|(_, h)| h),
        }
    }

    fn wiki_target(&self, reference: &LinkReference) -> WikiTarget {
        WikiTarget {
            raw_target: reference.raw_target.clone(),
            resolved_path: reference.resolved_path.clone(),
            embed: self.embed,
        }
    }
}

/// `300` or `300x200`.
fn parse_size(text: &str) -> Option<(u32, Option<u32>)> {
    match text.split_once('x') {
        Some((w, h)) => Some((w.trim().parse().ok()?, Some(h.trim().parse().ok()?))),
        None => Some((text.trim().parse().ok()?, None)),
    }
}

fn file_name(target: &str) -> &str {
    target.rsplit('/').next().unwrap_or(target)
}
