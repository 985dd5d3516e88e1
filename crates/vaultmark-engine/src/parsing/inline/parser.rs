use super::{
    cursor::Cursor,
    kinds::{Highlight, Tag, WikiLink},
    types::{InlineNode, Span},
};

/// Splits a text run into text and wiki-link segments.
///
/// Segments cover the entire input in order. An unclosed `[[` stays text.
pub fn parse_wikilinks(s: &str) -> Vec<InlineNode> {
    scan(s, try_parse_wikilink)
}

/// Splits a text run into text and `#tag` segments.
pub fn parse_tags(s: &str) -> Vec<InlineNode> {
    scan(s, try_parse_tag)
}

/// Byte spans of every `==` mark in `s`, left to right, non-overlapping.
pub fn find_highlight_marks(s: &str) -> Vec<Span> {
    let mut cur = Cursor::new(s);
    let mut marks = vec![];
    while !cur.eof() {
        if cur.starts_with(Highlight::MARK) {
            let start = cur.pos();
            cur.bump_n(Highlight::MARK.len());
            marks.push(Span {
                start,
                end: cur.pos(),
            });
            continue;
        }
        cur.bump_char();
    }
    marks
}

fn scan(s: &str, try_parse: impl Fn(&mut Cursor<'_>) -> Option<InlineNode>) -> Vec<InlineNode> {
    let mut cur = Cursor::new(s);
    let mut out = vec![];
    let mut text_start = cur.pos();

    fn flush_text(out: &mut Vec<InlineNode>, start: usize, end: usize) {
        if end > start {
            out.push(InlineNode::Text(Span { start, end }));
        }
    }

    while !cur.eof() {
        if let Some(node) = try_parse(&mut cur) {
            let full = node.full();
            flush_text(&mut out, text_start, full.start);
            text_start = full.end;
            out.push(node);
            continue;
        }
        cur.bump_char();
    }

    flush_text(&mut out, text_start, cur.pos());
    out
}

/// Attempts to parse a wiki-link or embed at the current position.
///
/// On failure the cursor is restored.
fn try_parse_wikilink(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    let embed = cur.peek() == Some(WikiLink::EMBED);
    let open_at = cur.pos() + usize::from(embed);
    if !cur.s.as_bytes().get(open_at..).is_some_and(|rest| rest.starts_with(WikiLink::OPEN)) {
        return None;
    }

    let saved = cur.clone();
    let start = cur.pos();
    cur.bump_n(usize::from(embed) + WikiLink::OPEN.len());
    let target_start = cur.pos();

    let mut fragment_at = None;
    while !cur.eof() {
        if cur.peek() == Some(WikiLink::ALIAS) || cur.starts_with(WikiLink::CLOSE) {
            break;
        }
        if cur.starts_with(WikiLink::OPEN) || cur.peek() == Some(b'\n') {
            *cur = saved;
            return None;
        }
        if cur.peek() == Some(WikiLink::FRAGMENT) && fragment_at.is_none() {
            fragment_at = Some(cur.pos());
        }
        cur.bump_char();
    }
    let target_end = cur.pos();

    let mut alias = None;
    if cur.peek() == Some(WikiLink::ALIAS) {
        cur.bump_n(1);
        let alias_start = cur.pos();
        while !cur.eof() && !cur.starts_with(WikiLink::CLOSE) {
            if cur.peek() == Some(b'\n') {
                break;
            }
            cur.bump_char();
        }
        alias = Some(Span {
            start: alias_start,
            end: cur.pos(),
        });
    }

    if !cur.starts_with(WikiLink::CLOSE) {
        *cur = saved;
        return None;
    }
    cur.bump_n(WikiLink::CLOSE.len());

    let (target, fragment) = match fragment_at {
        Some(at) => (
            Span {
                start: target_start,
                end: at,
            },
            Some(Span {
                start: at + 1,
                end: target_end,
            }),
        ),
        None => (
            Span {
                start: target_start,
                end: target_end,
            },
            None,
        ),
    };

    Some(InlineNode::WikiLink {
        full: Span {
            start,
            end: cur.pos(),
        },
        embed,
        target,
        fragment,
        alias,
    })
}

/// Attempts to parse a `#tag` at the current position.
fn try_parse_tag(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    if cur.peek_char() != Some(Tag::MARKER) || !Tag::may_follow(cur.prev_char()) {
        return None;
    }

    let saved = cur.clone();
    let start = cur.pos();
    cur.bump_char();
    let name_start = cur.pos();
    while cur.peek_char().is_some_and(Tag::is_name_char) {
        cur.bump_char();
    }
    let name = Span {
        start: name_start,
        end: cur.pos(),
    };

    if !Tag::is_valid_name(name.slice(cur.s)) {
        *cur = saved;
        return None;
    }

    Some(InlineNode::Tag {
        full: Span {
            start,
            end: cur.pos(),
        },
        name,
    })
}
