//! Syntax tree to hypertext tree.
//!
//! Placeholders become marker elements; the `components` pass finds and
//! substitutes them. Asset embeds become a `vault-embed` element
//! that the `media` pass materializes.

use crate::models::{Align, CalloutFold, Element, HNode, SyntaxNode, TableRow, WikiTarget};

/// Tag of the intermediate element left for asset embeds.
pub const EMBED_TAG: &str = "vault-embed";
/// Attribute marking links produced from wiki-link syntax.
pub const WIKILINK_ATTR: &str = "data-wikilink";

pub fn lower(nodes: Vec<SyntaxNode>) -> Vec<HNode> {
    nodes.into_iter().map(lower_node).collect()
}

fn element(tag: &str, children: Vec<SyntaxNode>) -> HNode {
    Element::new(tag).with_children(lower(children)).into()
}

fn lower_node(node: SyntaxNode) -> HNode {
    match node {
        SyntaxNode::Text { value } => HNode::text(value),
        SyntaxNode::Code { value } => Element::new("code").with_child(HNode::text(value)).into(),
        SyntaxNode::SoftBreak => HNode::text("\n"),
        SyntaxNode::HardBreak => Element::new("br").into(),
        SyntaxNode::Paragraph { children } => element("p", children),
        SyntaxNode::Heading {
            level,
            anchor,
            children,
        } => {
            let mut heading = Element::new(format!("h{}", level.clamp(1, 6)))
                .with_children(lower(children));
            if let Some(anchor) = anchor {
                heading = heading.with_attr("id", anchor);
            }
            heading.into()
        }
        SyntaxNode::Emphasis { children } => element("em", children),
        SyntaxNode::Strong { children } => element("strong", children),
        SyntaxNode::Strikethrough { children } => element("del", children),
        SyntaxNode::Highlight { children } => element("mark", children),
        SyntaxNode::Tag { name } => Element::new("a")
            .with_attr("class", "tag")
            .with_attr("href", format!("#{name}"))
            .with_attr("data-tag", name.clone())
            .with_child(HNode::text(format!("#{name}")))
            .into(),
        SyntaxNode::Link {
            url,
            title,
            wiki,
            children,
        } => lower_link(url, title, wiki, children),
        SyntaxNode::Image {
            url,
            alt,
            width,
            height,
        } => {
            let mut image = Element::new("img").with_attr("src", url).with_attr("alt", alt);
            if let Some(width) = width {
                image = image.with_attr("width", width.to_string());
            }
            if let Some(height) = height {
                image = image.with_attr("height", height.to_string());
            }
            image.into()
        }
        SyntaxNode::Embed {
            kind,
            url,
            path,
            target,
            subtype,
        } => Element::new(EMBED_TAG)
            .with_attr("data-kind", kind.as_str())
            .with_attr("src", url)
            .with_attr("data-path", path)
            .with_attr("data-target", target)
            .with_attr("data-subtype", subtype)
            .into(),
        SyntaxNode::Placeholder { kind, id } => id.marker(kind),
        SyntaxNode::CodeBlock { language, raw } => {
            let mut code = Element::new("code").with_child(HNode::text(raw));
            if let Some(language) = language {
                code = code.with_attr("class", format!("language-{language}"));
            }
            Element::new("pre").with_child(code.into()).into()
        }
        SyntaxNode::BlockQuote { children } => element("blockquote", children),
        SyntaxNode::Callout {
            kind,
            title,
            fold,
            children,
        } => lower_callout(kind, title, fold, children),
        SyntaxNode::List { start, items } => {
            let mut list = match start {
                Some(start) => {
                    let list = Element::new("ol");
                    if start == 1 {
                        list
                    } else {
                        list.with_attr("start", start.to_string())
                    }
                }
                None => Element::new("ul"),
            };
            list.children = items.into_iter().map(lower_item).collect();
            list.into()
        }
        SyntaxNode::TaskMarker { checked } => {
            let mut input = Element::new("input")
                .with_attr("type", "checkbox")
                .with_attr("class", "task-list-item-checkbox")
                .with_attr("disabled", "");
            if checked {
                input = input.with_attr("checked", "");
            }
            input.into()
        }
        SyntaxNode::Table { alignments, rows } => lower_table(&alignments, rows),
        SyntaxNode::Html { value } | SyntaxNode::InlineHtml { value } => HNode::Raw { html: value },
        SyntaxNode::Rule => Element::new("hr").into(),
        SyntaxNode::Opaque { kind, children } => {
            let tag = if children.iter().all(SyntaxNode::is_inline) {
                "span"
            } else {
                "div"
            };
            Element::new(tag)
                .with_attr("data-kind", kind)
                .with_children(lower(children))
                .into()
        }
    }
}

fn lower_link(
    url: String,
    title: Option<String>,
    wiki: Option<WikiTarget>,
    children: Vec<SyntaxNode>,
) -> HNode {
    let mut link = Element::new("a")
        .with_attr("href", url)
        .with_children(lower(children));
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        link = link.with_attr("title", title);
    }
    if let Some(wiki) = wiki {
        link.add_class("internal-link");
        if wiki.embed {
            link.add_class("internal-embed");
        }
        link = link
            .with_attr(WIKILINK_ATTR, wiki.raw_target)
            .with_attr("data-href", wiki.resolved_path);
    }
    link.into()
}

fn lower_callout(
    kind: String,
    title: Vec<SyntaxNode>,
    fold: Option<CalloutFold>,
    children: Vec<SyntaxNode>,
) -> HNode {
    let mut callout = Element::new("div")
        .with_attr("class", "callout")
        .with_attr("data-callout", kind);
    if let Some(fold) = fold {
        let marker = match fold {
            CalloutFold::Expanded => "+",
            CalloutFold::Collapsed => "-",
        };
        callout = callout.with_attr("data-callout-fold", marker);
    }
    let title = Element::new("div").with_attr("class", "callout-title").with_child(
        Element::new("div")
            .with_attr("class", "callout-title-inner")
            .with_children(lower(title))
            .into(),
    );
    let content = Element::new("div")
        .with_attr("class", "callout-content")
        .with_children(lower(children));
    callout.with_child(title.into()).with_child(content.into()).into()
}

/// Task items start with a marker, directly or inside their first paragraph.
fn task_state(item: &[SyntaxNode]) -> Option<bool> {
    match item.first()? {
        SyntaxNode::TaskMarker { checked } => Some(*checked),
        SyntaxNode::Paragraph { children } => match children.first()? {
            SyntaxNode::TaskMarker { checked } => Some(*checked),
            _ => None,
        },
        _ => None,
    }
}

fn lower_item(item: Vec<SyntaxNode>) -> HNode {
    let mut li = Element::new("li");
    if let Some(checked) = task_state(&item) {
        li = li
            .with_attr("class", "task-list-item")
            .with_attr("data-task", if checked { "x" } else { " " });
    }
    li.with_children(lower(item)).into()
}

fn cell_style(align: Option<&Align>) -> Option<&'static str> {
    match align? {
        Align::None => None,
        Align::Left => Some("text-align: left"),
        Align::Center => Some("text-align: center"),
        Align::Right => Some("text-align: right"),
    }
}

fn lower_table(alignments: &[Align], rows: Vec<TableRow>) -> HNode {
    let mut head = Vec::new();
    let mut body = Vec::new();
    for row in rows {
        let cell_tag = if row.header { "th" } else { "td" };
        let cells = row
            .cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| {
                let mut cell_element = Element::new(cell_tag).with_children(lower(cell));
                if let Some(style) = cell_style(alignments.get(i)) {
                    cell_element = cell_element.with_attr("style", style);
                }
                cell_element.into()
            })
            .collect();
        let tr: HNode = Element::new("tr").with_children(cells).into();
        if row.header {
            head.push(tr);
        } else {
            body.push(tr);
        }
    }
    let mut table = Element::new("table");
    if !head.is_empty() {
        table = table.with_child(Element::new("thead").with_children(head).into());
    }
    if !body.is_empty() {
        table = table.with_child(Element::new("tbody").with_children(body).into());
    }
    table.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_markdown;
    use crate::placeholder::{Deferred, PlaceholderArena, PlaceholderKind};
    use crate::track::{TrackFormat, TrackSpec};
    use crate::transform::LinkKind;

    fn html(text: &str) -> String {
        HNode::fragment(lower(parse_markdown(text))).to_html()
    }

    #[test]
    fn basic_blocks() {
        insta::assert_snapshot!(
            html("Some *em* and `code`.\n\n---\n\n1. one\n2. two"),
            @"<p>Some <em>em</em> and <code>code</code>.</p><hr><ol><li>one</li><li>two</li></ol>"
        );
    }

    #[test]
    fn fenced_code_keeps_language_class() {
        assert_eq!(
            html("```rust\nfn a() {}\n```"),
            "<pre><code class=\"language-rust\">fn a() {}\n</code></pre>"
        );
    }

    #[test]
    fn task_items_are_marked() {
        let lowered = lower(parse_markdown("- [x] done\n- [ ] todo"));
        let mut items = Vec::new();
        lowered[0].find_all("li", &mut items);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|li| li.has_class("task-list-item")));
        assert_eq!(items[0].attr("data-task"), Some("x"));
        assert_eq!(items[1].attr("data-task"), Some(" "));

        let mut boxes = Vec::new();
        lowered[0].find_all("input", &mut boxes);
        assert_eq!(boxes[0].attr("checked"), Some(""));
        assert_eq!(boxes[1].attr("checked"), None);
    }

    #[test]
    fn table_sections_and_alignment() {
        insta::assert_snapshot!(
            html("| a | b |\n|:--|--:|\n| 1 | 2 |"),
            @r#"<table><thead><tr><th style="text-align: left">a</th><th style="text-align: right">b</th></tr></thead><tbody><tr><td style="text-align: left">1</td><td style="text-align: right">2</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn callout_structure() {
        let node = SyntaxNode::Callout {
            kind: "tip".into(),
            title: vec![SyntaxNode::text("Tip")],
            fold: Some(CalloutFold::Collapsed),
            children: vec![SyntaxNode::paragraph(vec![SyntaxNode::text("x")])],
        };
        insta::assert_snapshot!(
            HNode::fragment(lower(vec![node])).to_html(),
            @r#"<div class="callout" data-callout="tip" data-callout-fold="-"><div class="callout-title"><div class="callout-title-inner">Tip</div></div><div class="callout-content"><p>x</p></div></div>"#
        );
    }

    #[test]
    fn wiki_links_carry_marker() {
        let node = SyntaxNode::Link {
            url: "/Notes/Other".into(),
            title: None,
            wiki: Some(WikiTarget {
                raw_target: "Other".into(),
                resolved_path: "/Notes/Other.md".into(),
                embed: false,
            }),
            children: vec![SyntaxNode::text("Other")],
        };
        let lowered = lower(vec![node]);
        let link = lowered[0].as_element().expect("element");
        assert_eq!(link.attr(WIKILINK_ATTR), Some("Other"));
        assert!(link.has_class("internal-link"));
    }

    #[test]
    fn placeholders_and_embeds() {
        let mut arena = PlaceholderArena::new();
        let id = arena.mint(Deferred::TrackMap(TrackSpec::file(
            "track-0",
            TrackFormat::Gpx,
            "a.gpx",
            "/a.gpx",
        )));
        let lowered = lower(vec![
            SyntaxNode::Placeholder {
                kind: PlaceholderKind::TrackMap,
                id,
            },
            SyntaxNode::Embed {
                kind: LinkKind::Audio,
                url: "/vault/s.mp3".into(),
                path: "/s.mp3".into(),
                target: "s.mp3".into(),
                subtype: "mp3".into(),
            },
        ]);
        assert_eq!(lowered[0], id.marker(PlaceholderKind::TrackMap));
        let embed = lowered[1].as_element().expect("element");
        assert_eq!(embed.tag, EMBED_TAG);
        assert_eq!(embed.attr("data-kind"), Some("audio"));
    }
}
