//! # Inline Kinds
//!
//! Types that own their syntax delimiters. The scanner and the transform
//! passes refer to these constants; they never hardcode `[[` or `==`.
//!
//! - **`WikiLink`**: `OPEN = b"[["`, `CLOSE = b"]]"`, `EMBED = b'!'`,
//!   `ALIAS = b'|'`, `FRAGMENT = b'#'`
//! - **`Tag`**: `MARKER = '#'` plus the name character class
//! - **`Highlight`**: `MARK = b"=="`
//! - **`Callout`**: `> [!type]` header line

pub mod callout;
pub mod highlight;
pub mod tag;
pub mod wikilink;

pub use callout::{Callout, CalloutHeader};
pub use highlight::Highlight;
pub use tag::Tag;
pub use wikilink::WikiLink;
