/// A byte range within a scanned text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn slice<'a>(&self, s: &'a str) -> &'a str {
        &s[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A scanned inline construct with spans into its text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    /// Text that isn't part of any recognised construct.
    Text(Span),
    /// `[[target#fragment|alias]]`, or `![[...]]` when `embed` is set.
    WikiLink {
        /// Full span including the `!` and brackets.
        full: Span,
        embed: bool,
        target: Span,
        /// Text after `#` in the target, without the `#`.
        fragment: Option<Span>,
        /// Text after `|`.
        alias: Option<Span>,
    },
    /// `#name`.
    Tag { full: Span, name: Span },
}

impl InlineNode {
    pub fn full(&self) -> Span {
        match self {
            InlineNode::Text(span) => *span,
            InlineNode::WikiLink { full, .. } | InlineNode::Tag { full, .. } => *full,
        }
    }
}
