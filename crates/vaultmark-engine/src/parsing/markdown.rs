//! Markup parsing: body text to a [`SyntaxNode`] tree.
//!
//! Builds the tree from the `pulldown-cmark` event stream with a frame
//! stack. Adjacent text events are merged so later passes see `[[x]]` as a
//! single run even when the parser split it at bracket characters.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::models::{Align, SyntaxNode, TableRow, push_merged};

pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Parses markdown body text into block-level syntax nodes. Never fails.
pub fn parse_markdown(body: &str) -> Vec<SyntaxNode> {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(body, parser_options()) {
        builder.event(event);
    }
    builder.finish()
}

enum Container {
    Paragraph,
    Heading(u8),
    BlockQuote,
    Item,
    Cell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String, title: Option<String> },
    Image { url: String },
    Opaque(&'static str),
}

enum Frame {
    Root(Vec<SyntaxNode>),
    Container {
        kind: Container,
        children: Vec<SyntaxNode>,
    },
    List {
        start: Option<u64>,
        items: Vec<Vec<SyntaxNode>>,
    },
    Table {
        alignments: Vec<Align>,
        rows: Vec<TableRow>,
    },
    Row {
        header: bool,
        cells: Vec<Vec<SyntaxNode>>,
    },
    Code {
        language: Option<String>,
        raw: String,
    },
    Html(String),
}

struct TreeBuilder {
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::Root(Vec::new())],
        }
    }

    fn open(&mut self, kind: Container) {
        self.stack.push(Frame::Container {
            kind,
            children: Vec::new(),
        });
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.stack.last_mut() {
                Some(Frame::Code { raw, .. }) => raw.push_str(&text),
                Some(Frame::Html(raw)) => raw.push_str(&text),
                _ => self.push(SyntaxNode::text(text.to_string())),
            },
            Event::Code(code) => self.push(SyntaxNode::Code {
                value: code.to_string(),
            }),
            Event::Html(html) => match self.stack.last_mut() {
                Some(Frame::Html(raw)) => raw.push_str(&html),
                _ => self.push(SyntaxNode::Html {
                    value: html.to_string(),
                }),
            },
            Event::InlineHtml(html) => self.push(SyntaxNode::InlineHtml {
                value: html.to_string(),
            }),
            Event::InlineMath(math) | Event::DisplayMath(math) => self.push(SyntaxNode::Code {
                value: math.to_string(),
            }),
            Event::FootnoteReference(label) => self.push(SyntaxNode::Opaque {
                kind: "footnoteReference".into(),
                children: vec![SyntaxNode::text(label.to_string())],
            }),
            Event::SoftBreak => self.push(SyntaxNode::SoftBreak),
            Event::HardBreak => self.push(SyntaxNode::HardBreak),
            Event::Rule => self.push(SyntaxNode::Rule),
            Event::TaskListMarker(checked) => self.push(SyntaxNode::TaskMarker { checked }),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(Container::Paragraph),
            Tag::Heading { level, .. } => self.open(Container::Heading(level as u8)),
            Tag::BlockQuote(_) => self.open(Container::BlockQuote),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_lowercase()),
                    CodeBlockKind::Indented => None,
                };
                self.stack.push(Frame::Code {
                    language,
                    raw: String::new(),
                });
            }
            Tag::HtmlBlock => self.stack.push(Frame::Html(String::new())),
            Tag::List(start) => self.stack.push(Frame::List {
                start,
                items: Vec::new(),
            }),
            Tag::Item => self.open(Container::Item),
            Tag::Table(alignments) => self.stack.push(Frame::Table {
                alignments: alignments.into_iter().map(align).collect(),
                rows: Vec::new(),
            }),
            Tag::TableHead => self.stack.push(Frame::Row {
                header: true,
                cells: Vec::new(),
            }),
            Tag::TableRow => self.stack.push(Frame::Row {
                header: false,
                cells: Vec::new(),
            }),
            Tag::TableCell => self.open(Container::Cell),
            Tag::Emphasis => self.open(Container::Emphasis),
            Tag::Strong => self.open(Container::Strong),
            Tag::Strikethrough => self.open(Container::Strikethrough),
            Tag::Link {
                dest_url, title, ..
            } => self.open(Container::Link {
                url: dest_url.to_string(),
                title: (!title.is_empty()).then(|| title.to_string()),
            }),
            Tag::Image { dest_url, .. } => self.open(Container::Image {
                url: dest_url.to_string(),
            }),
            Tag::FootnoteDefinition(_) => self.open(Container::Opaque("footnoteDefinition")),
            Tag::DefinitionList => self.open(Container::Opaque("definitionList")),
            Tag::DefinitionListTitle => self.open(Container::Opaque("definitionTitle")),
            Tag::DefinitionListDefinition => self.open(Container::Opaque("definition")),
            Tag::Superscript => self.open(Container::Opaque("superscript")),
            Tag::Subscript => self.open(Container::Opaque("subscript")),
            Tag::MetadataBlock(_) => self.open(Container::Opaque("metadata")),
        }
    }

    fn end(&mut self, _tag: TagEnd) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Root(children) => self.stack.push(Frame::Root(children)),
            Frame::Container { kind, children } => self.close_container(kind, children),
            Frame::List { start, items } => self.push(SyntaxNode::List { start, items }),
            Frame::Table { alignments, rows } => self.push(SyntaxNode::Table { alignments, rows }),
            Frame::Row { header, cells } => {
                if let Some(Frame::Table { rows, .. }) = self.stack.last_mut() {
                    rows.push(TableRow { header, cells });
                }
            }
            Frame::Code { language, raw } => self.push(SyntaxNode::CodeBlock { language, raw }),
            Frame::Html(value) => self.push(SyntaxNode::Html { value }),
        }
    }

    fn close_container(&mut self, kind: Container, children: Vec<SyntaxNode>) {
        let node = match kind {
            Container::Item => {
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(children);
                }
                return;
            }
            Container::Cell => {
                if let Some(Frame::Row { cells, .. }) = self.stack.last_mut() {
                    cells.push(children);
                }
                return;
            }
            Container::Paragraph => SyntaxNode::Paragraph { children },
            Container::Heading(level) => SyntaxNode::Heading {
                level,
                anchor: None,
                children,
            },
            Container::BlockQuote => SyntaxNode::BlockQuote { children },
            Container::Emphasis => SyntaxNode::Emphasis { children },
            Container::Strong => SyntaxNode::Strong { children },
            Container::Strikethrough => SyntaxNode::Strikethrough { children },
            Container::Link { url, title } => SyntaxNode::Link {
                url,
                title,
                wiki: None,
                children,
            },
            Container::Image { url } => SyntaxNode::Image {
                url,
                alt: crate::models::plain_text(&children),
                width: None,
                height: None,
            },
            Container::Opaque(kind) => SyntaxNode::Opaque {
                kind: kind.to_string(),
                children,
            },
        };
        self.push(node);
    }

    fn push(&mut self, node: SyntaxNode) {
        match self.stack.last_mut() {
            Some(Frame::Root(children)) | Some(Frame::Container { children, .. }) => {
                push_merged(children, node)
            }
            // Stray inline content outside a container is kept as its own item.
            Some(Frame::List { items, .. }) => items.push(vec![node]),
            Some(Frame::Row { cells, .. }) => cells.push(vec![node]),
            Some(Frame::Table { .. }) | Some(Frame::Code { .. }) | Some(Frame::Html(_)) | None => {
                log::debug!("dropping node outside a container");
            }
        }
    }

    fn finish(mut self) -> Vec<SyntaxNode> {
        while self.stack.len() > 1 {
            self.end(TagEnd::Paragraph);
        }
        match self.stack.pop() {
            Some(Frame::Root(children)) => children,
            _ => Vec::new(),
        }
    }
}

fn align(alignment: Alignment) -> Align {
    match alignment {
        Alignment::None => Align::None,
        Alignment::Left => Align::Left,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
    }
}
