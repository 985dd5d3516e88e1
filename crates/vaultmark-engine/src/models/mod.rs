pub mod document;
pub mod file_index;
pub mod hypertext;
pub mod metadata;
pub mod syntax;

pub use document::{Document, FrontMatter, FrontMatterValue};
pub use file_index::{FileIndex, IndexEntry};
pub use hypertext::{Element, HNode};
pub use metadata::{HeadingRecord, LinkRecord, Metadata};
pub use syntax::{Align, CalloutFold, SyntaxNode, TableRow, WikiTarget, plain_text, push_merged};
