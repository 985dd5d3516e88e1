use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};

/// One file known to the vault, as supplied by (or produced for) the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Display name: the file name with a `.md` extension stripped.
    pub file_name: String,
    /// Path relative to the vault root, without a leading `/`.
    pub relative_path: RelativePathBuf,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub backlinks: Vec<String>,
}

impl IndexEntry {
    /// Create an entry from a vault-relative path
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let file_name = Self::extract_display_name(&relative_path);
        Self {
            file_name,
            relative_path,
            tags: Vec::new(),
            headings: Vec::new(),
            links: Vec::new(),
            backlinks: Vec::new(),
        }
    }

    /// Create from a relative path string
    pub fn from_relative_str(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path.trim_start_matches('/')))
    }

    /// Rooted vault path, e.g. `/Folder/Note.md`.
    pub fn vault_path(&self) -> String {
        format!("/{}", self.relative_path)
    }

    pub fn is_note(&self) -> bool {
        self.relative_path.extension() == Some("md")
    }

    fn extract_display_name(path: &RelativePath) -> String {
        path.file_name()
            .map(|name| name.strip_suffix(".md").unwrap_or(name))
            .unwrap_or("Untitled")
            .to_string()
    }
}

impl From<&str> for IndexEntry {
    fn from(path: &str) -> Self {
        Self::from_relative_str(path)
    }
}

/// Ordered file index used as the authoritative tier of link resolution.
///
/// Order matters: when several entries match a target the first one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIndex {
    entries: Vec<IndexEntry>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn push(&mut self, entry: IndexEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [IndexEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the entry a bare wiki-link target refers to.
    ///
    /// Match variants are tried in order, each across the whole index:
    /// exact file name, file name plus `.md`, path ending in
    /// `/<target>.md`, and full relative path.
    pub fn lookup(&self, target: &str) -> Option<&IndexEntry> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        let with_md = format!("{target}.md");
        let suffix = format!("/{target}.md");
        let bare = target.trim_start_matches('/');
        let bare_md = format!("{bare}.md");

        let variants: [&dyn Fn(&IndexEntry) -> bool; 4] = [
            &|e: &IndexEntry| e.file_name == target,
            &|e: &IndexEntry| e.file_name == with_md,
            &|e: &IndexEntry| e.relative_path.as_str().ends_with(&suffix),
            &|e: &IndexEntry| {
                e.relative_path.as_str() == bare || e.relative_path.as_str() == bare_md
            },
        ];

        variants
            .iter()
            .find_map(|matches| self.entries.iter().find(|e| matches(e)))
    }

    /// Finds the entry stored at a rooted vault path.
    pub fn by_vault_path(&self, path: &str) -> Option<&IndexEntry> {
        let bare = path.trim_start_matches('/');
        self.entries
            .iter()
            .find(|e| e.relative_path.as_str() == bare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_display_name_strips_md() {
        let entry = IndexEntry::from("Folder/Sub/Abilities.md");
        assert_eq!(entry.file_name, "Abilities");
        assert_eq!(entry.vault_path(), "/Folder/Sub/Abilities.md");
        assert!(entry.is_note());
    }

    #[test]
    fn entry_keeps_asset_extension() {
        let entry = IndexEntry::from("/img/photo.png");
        assert_eq!(entry.file_name, "photo.png");
        assert!(!entry.is_note());
    }

    #[test]
    fn lookup_prefers_exact_name_over_path_suffix() {
        let index = FileIndex::from_entries([
            IndexEntry::from("Archive/Old/Plan.md"),
            IndexEntry::from("Plan.md"),
        ]);
        // Both match by name; first entry wins.
        let hit = index.lookup("Plan").unwrap();
        assert_eq!(hit.relative_path.as_str(), "Archive/Old/Plan.md");
    }

    #[test]
    fn lookup_by_path_suffix() {
        let mut entry = IndexEntry::from("Projects/Roadmap.md");
        entry.file_name = "roadmap-renamed".into();
        let index = FileIndex::from_entries([entry]);
        let hit = index.lookup("Roadmap").unwrap();
        assert_eq!(hit.relative_path.as_str(), "Projects/Roadmap.md");
    }

    #[test]
    fn lookup_by_full_path() {
        let index = FileIndex::from_entries([IndexEntry::from("a/b/c.md")]);
        assert!(index.lookup("a/b/c").is_some());
        assert!(index.lookup("/a/b/c.md").is_some());
        assert!(index.lookup("a/b").is_none());
    }

    #[test]
    fn lookup_asset_by_file_name() {
        let index = FileIndex::from_entries([IndexEntry::from("media/trip.gpx")]);
        let hit = index.lookup("trip.gpx").unwrap();
        assert_eq!(hit.vault_path(), "/media/trip.gpx");
    }

    #[test]
    fn empty_target_never_matches() {
        let index = FileIndex::from_entries([IndexEntry::from("x.md")]);
        assert!(index.lookup("  ").is_none());
    }

    #[test]
    fn index_deserializes_from_camel_case_array() {
        let json = r#"[{"fileName":"Abilities","relativePath":"FolderA/SubFolder/Abilities.md"}]"#;
        // JSON is valid YAML.
        let index: FileIndex = serde_yaml::from_str(json).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries()[0].file_name, "Abilities");
    }
}
