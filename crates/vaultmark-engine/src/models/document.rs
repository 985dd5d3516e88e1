use std::collections::BTreeMap;

use serde::Serialize;

use crate::parsing::front_matter;

/// A scalar front matter value. List values keep their scalar items as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FrontMatterValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
}

impl FrontMatterValue {
    /// The value as a list of strings: lists as-is, text split on commas
    /// and whitespace.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FrontMatterValue::List(items) => items.clone(),
            FrontMatterValue::Text(text) => text
                .split([',', ' ', '\t'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            FrontMatterValue::Number(n) => vec![n.to_string()],
            FrontMatterValue::Bool(b) => vec![b.to_string()],
        }
    }
}

pub type FrontMatter = BTreeMap<String, FrontMatterValue>;

/// A note split into its header block and body text.
///
/// `header` holds the exact source bytes of the front matter block
/// (delimiters included) so that [`Document::compose`] reproduces the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub front_matter: FrontMatter,
    #[serde(skip)]
    pub header: Option<String>,
    pub body: String,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        match front_matter::split(text) {
            Some(split) => Self {
                front_matter: split.values,
                header: Some(split.header.to_string()),
                body: split.body.to_string(),
            },
            None => Self {
                front_matter: FrontMatter::new(),
                header: None,
                body: text.to_string(),
            },
        }
    }

    /// Reassembles header and body into the original text.
    pub fn compose(&self) -> String {
        match &self.header {
            Some(header) => format!("{header}{}", self.body),
            None => self.body.clone(),
        }
    }

    /// Tags declared in front matter under `tags` or `tag`, `#` prefixes removed.
    pub fn front_matter_tags(&self) -> Vec<String> {
        ["tags", "tag"]
            .iter()
            .filter_map(|key| self.front_matter.get(*key))
            .flat_map(FrontMatterValue::as_list)
            .map(|tag| tag.trim_start_matches('#').to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("---\ntitle: Hello\n---\n# Body\n")]
    #[case("---\r\ntitle: Hello\r\ntags: [a, b]\r\n---\r\nBody")]
    #[case("---\ncount: 3\ndraft: false\n---\n")]
    #[case("No front matter at all\n")]
    #[case("---\nnot: [closed\n---\nbody")]
    #[case("---\n---\nempty block\n")]
    fn compose_round_trips(#[case] input: &str) {
        let doc = Document::parse(input);
        assert_eq!(doc.compose(), input);
    }

    #[test]
    fn parse_reads_scalar_values() {
        let doc = Document::parse("---\ntitle: Trip\nmiles: 12.5\npublic: true\n---\nBody");
        assert_eq!(
            doc.front_matter.get("title"),
            Some(&FrontMatterValue::Text("Trip".into()))
        );
        assert_eq!(
            doc.front_matter.get("miles"),
            Some(&FrontMatterValue::Number(12.5))
        );
        assert_eq!(
            doc.front_matter.get("public"),
            Some(&FrontMatterValue::Bool(true))
        );
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn front_matter_tags_accept_lists_and_strings() {
        let doc = Document::parse("---\ntags: [hiking, '#alps']\ntag: solo, winter\n---\n");
        assert_eq!(
            doc.front_matter_tags(),
            vec!["hiking", "alps", "solo", "winter"]
        );
    }
}
