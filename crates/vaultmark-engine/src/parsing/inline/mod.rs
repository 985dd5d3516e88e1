//! # Inline Scanning
//!
//! Cursor-based scanning of the text runs the markup parser leaves behind.
//! Code spans never reach these scanners: the markup parser already emits
//! them as separate nodes, so their content is a raw zone by construction.
//!
//! - **`types`**: `Span` and `InlineNode` (Text, WikiLink, Tag)
//! - **`kinds`**: types owning their delimiters (WikiLink, Tag, Highlight, Callout)
//! - **`cursor`**: `Cursor` for character-by-character scanning
//! - **`parser`**: `parse_wikilinks`, `parse_tags`, `find_highlight_marks`

pub mod cursor;
pub mod kinds;
pub mod parser;
pub mod types;

pub use parser::{find_highlight_marks, parse_tags, parse_wikilinks};
pub use types::{InlineNode, Span};
