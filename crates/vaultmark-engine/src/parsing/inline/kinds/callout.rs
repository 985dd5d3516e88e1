use std::sync::OnceLock;

use regex::Regex;

use crate::models::CalloutFold;

pub struct Callout;

/// The parsed `[!type]` line that opens a callout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutHeader {
    /// Lowercased callout type.
    pub kind: String,
    pub fold: Option<CalloutFold>,
    /// Custom title, if any text follows the marker.
    pub title: Option<String>,
    /// Byte length of the marker, fold sign and following spaces.
    pub marker_len: usize,
}

impl Callout {
    pub const OPEN: &'static str = "[!";

    fn header_regex() -> &'static Regex {
        static HEADER: OnceLock<Regex> = OnceLock::new();
        HEADER.get_or_init(|| {
            Regex::new(r"^\[!([A-Za-z0-9_-]+)\]([+-])?[ \t]*").expect("Invalid callout regex")
        })
    }

    /// Parses the first line of a block quote.
    pub fn parse_header(line: &str) -> Option<CalloutHeader> {
        let caps = Self::header_regex().captures(line)?;
        let marker_len = caps.get(0)?.end();
        let fold = caps.get(2).map(|sign| match sign.as_str() {
            "-" => CalloutFold::Collapsed,
            _ => CalloutFold::Expanded,
        });
        let title = line[marker_len..].trim();
        Some(CalloutHeader {
            kind: caps[1].to_lowercase(),
            fold,
            title: (!title.is_empty()).then(|| title.to_string()),
            marker_len,
        })
    }

    /// `warning` becomes `Warning`.
    pub fn default_title(kind: &str) -> String {
        let mut chars = kind.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
