//! Front matter splitting, markup parsing and inline scanning.

pub mod front_matter;
pub mod inline;
pub mod markdown;

pub use front_matter::split as split_front_matter;
pub use markdown::parse_markdown;
