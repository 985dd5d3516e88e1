//! Front matter splitting.
//!
//! A header block opens with a line of exactly `---` at the very start of
//! the text and closes with the next line of exactly `---`. The block body
//! is read as a YAML mapping of simple values. Anything else (no closing
//! line, empty block, unparseable body, non-mapping body) means "no front
//! matter" and the whole text is the body.

use serde_yaml::Value;

use crate::models::{FrontMatter, FrontMatterValue};

pub const DELIMITER: &str = "---";

/// A successfully split header block.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<'a> {
    /// Exact header bytes including both delimiter lines and line endings.
    pub header: &'a str,
    /// Text between the delimiter lines.
    pub raw: &'a str,
    pub body: &'a str,
    pub values: FrontMatter,
}

/// Splits a leading front matter block from `text`.
pub fn split(text: &str) -> Option<Split<'_>> {
    let mut lines = LineIter::new(text);
    let (first, _) = lines.next()?;
    if first != DELIMITER {
        return None;
    }
    let raw_start = lines.offset;

    let (raw_end, header_end) = loop {
        let line_start = lines.offset;
        let (line, end) = lines.next()?;
        if line == DELIMITER {
            break (line_start, end);
        }
    };

    let raw = &text[raw_start..raw_end];
    let values = match parse_values(raw) {
        Some(values) if !values.is_empty() => values,
        _ => {
            log::debug!("ignoring empty or malformed front matter block");
            return None;
        }
    };

    Some(Split {
        header: &text[..header_end],
        raw,
        body: &text[header_end..],
        values,
    })
}

fn parse_values(raw: &str) -> Option<FrontMatter> {
    let Value::Mapping(mapping) = serde_yaml::from_str::<Value>(raw).ok()? else {
        return None;
    };

    let mut values = FrontMatter::new();
    for (key, value) in mapping {
        let Some(key) = scalar_text(&key) else {
            continue;
        };
        let value = match value {
            Value::String(s) => FrontMatterValue::Text(s),
            Value::Bool(b) => FrontMatterValue::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(n) => FrontMatterValue::Number(n),
                None => FrontMatterValue::Text(n.to_string()),
            },
            Value::Sequence(items) => {
                FrontMatterValue::List(items.iter().filter_map(scalar_text).collect())
            }
            Value::Null => FrontMatterValue::Text(String::new()),
            Value::Mapping(_) | Value::Tagged(_) => continue,
        };
        values.insert(key, value);
    }
    Some(values)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Iterates lines yielding `(line_without_terminator, end_offset_after_terminator)`.
struct LineIter<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> LineIter<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, offset: 0 }
    }
}

impl<'a> Iterator for LineIter<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.offset..];
        let (line, consumed) = match rest.find('\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        self.offset += consumed;
        Some((line.strip_suffix('\r').unwrap_or(line), self.offset))
    }
}
