use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingRecord {
    pub level: u8,
    pub text: String,
    pub anchor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub href: String,
    pub text: String,
    /// Vault path for wiki-links, `None` for ordinary markdown links.
    pub resolved_path: Option<String>,
}

/// Index-facing facts collected while the stage-1 passes run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub headings: Vec<HeadingRecord>,
    pub links: Vec<LinkRecord>,
    pub tags: BTreeSet<String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vault paths this document links to, in first-seen order.
    pub fn outgoing_paths(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.links
            .iter()
            .filter_map(|link| link.resolved_path.as_deref())
            .filter(|path| seen.insert(*path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_paths_are_deduplicated_in_order() {
        let link = |href: &str, path: Option<&str>| LinkRecord {
            href: href.into(),
            text: href.into(),
            resolved_path: path.map(str::to_string),
        };
        let metadata = Metadata {
            links: vec![
                link("/b", Some("/b.md")),
                link("https://example.com", None),
                link("/a", Some("/a.md")),
                link("/b", Some("/b.md")),
            ],
            ..Metadata::default()
        };
        assert_eq!(metadata.outgoing_paths(), vec!["/b.md", "/a.md"]);
    }
}
