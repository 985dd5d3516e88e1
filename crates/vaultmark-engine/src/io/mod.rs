use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use relative_path::{RelativePath, RelativePathBuf};

use crate::models::{FileIndex, IndexEntry};
use crate::pipeline::{CompileOptions, Pipeline};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid vault: {0}")]
    InvalidVault(String),
}

/// Supplies raw bytes for vault paths such as `/Trips/day1.gpx`.
///
/// Implementations must be shareable across threads: aggregate tracks fetch
/// their members in parallel.
pub trait AssetSource: Sync {
    fn fetch(&self, vault_path: &str) -> Result<Vec<u8>, IoError>;
}

/// In-memory assets keyed by rooted vault path.
impl AssetSource for HashMap<String, Vec<u8>> {
    fn fetch(&self, vault_path: &str) -> Result<Vec<u8>, IoError> {
        self.get(vault_path)
            .cloned()
            .ok_or_else(|| IoError::NotFound(PathBuf::from(vault_path)))
    }
}

/// A vault rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct VaultDir {
    root: PathBuf,
}

impl VaultDir {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, IoError> {
        let root = root.into();
        validate_vault_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a rooted vault path to a vault-relative path. Paths climbing
    /// above the root are refused.
    pub fn relative(&self, vault_path: &str) -> Result<RelativePathBuf, IoError> {
        let relative = RelativePath::new(vault_path.trim_start_matches('/')).normalize();
        if relative.as_str().is_empty() || relative.as_str().starts_with("..") {
            return Err(IoError::NotFound(self.root.join(vault_path.trim_start_matches('/'))));
        }
        Ok(relative)
    }

    pub fn read_note(&self, vault_path: &str) -> Result<String, IoError> {
        read_file(&self.relative(vault_path)?, &self.root)
    }
}

impl AssetSource for VaultDir {
    fn fetch(&self, vault_path: &str) -> Result<Vec<u8>, IoError> {
        read_bytes(&self.relative(vault_path)?, &self.root)
    }
}

/// Read a markdown file and return its content
pub fn read_file(relative_path: &RelativePath, vault_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(vault_root);
    if !absolute_path.is_file() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Read any vault file as bytes
pub fn read_bytes(relative_path: &RelativePath, vault_root: &Path) -> Result<Vec<u8>, IoError> {
    let absolute_path = relative_path.to_path(vault_root);
    if !absolute_path.is_file() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read(&absolute_path).map_err(IoError::Io)
}

pub fn validate_vault_dir(path: &Path) -> Result<(), IoError> {
    if !path.is_dir() {
        return Err(IoError::InvalidVault(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(())
}

/// Scans every file of the vault into an index, sorted by path. Hidden
/// files and directories (`.obsidian`, `.git`, ...) are skipped.
pub fn build_file_index(vault_root: &Path) -> Result<FileIndex, IoError> {
    validate_vault_dir(vault_root)?;
    let mut paths = Vec::new();
    scan_directory_recursive(vault_root, RelativePathBuf::new(), &mut paths)?;
    paths.sort();
    Ok(FileIndex::from_entries(paths.into_iter().map(IndexEntry::new)))
}

fn scan_directory_recursive(
    dir: &Path,
    relative: RelativePathBuf,
    files: &mut Vec<RelativePathBuf>,
) -> Result<(), IoError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            log::debug!("Skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let child = relative.join(name);
        if path.is_dir() {
            scan_directory_recursive(&path, child, files)?;
        } else {
            files.push(child);
        }
    }
    Ok(())
}

/// Facts collected from one compiled note.
struct NoteFacts {
    position: usize,
    tags: Vec<String>,
    headings: Vec<String>,
    links: Vec<String>,
}

/// Builds the file index and fills each note's tags, headings and outgoing
/// links by compiling it, then derives backlinks. Notes compile in parallel.
/// A note that cannot be read is logged and keeps an entry without facts.
pub fn index_vault(vault_root: &Path, pipeline: &Pipeline) -> Result<FileIndex, IoError> {
    let mut index = build_file_index(vault_root)?;

    let collected: Vec<NoteFacts> = index
        .entries()
        .par_iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_note())
        .filter_map(|(position, entry)| {
            let document_path = entry.vault_path();
            let text = match read_file(&entry.relative_path, vault_root) {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("Skipping unreadable note {document_path}: {err}");
                    return None;
                }
            };
            let options = CompileOptions::new(&document_path).with_index(&index);
            let compiled = pipeline.compile(&text, &options);
            let links = compiled
                .metadata
                .outgoing_paths()
                .into_iter()
                .filter(|path| *path != document_path)
                .map(str::to_string)
                .collect();
            Some(NoteFacts {
                position,
                tags: compiled.metadata.tags.into_iter().collect(),
                headings: compiled
                    .metadata
                    .headings
                    .into_iter()
                    .map(|heading| heading.text)
                    .collect(),
                links,
            })
        })
        .collect();

    let mut backlinks: HashMap<String, Vec<String>> = HashMap::new();
    for facts in collected {
        let source = index.entries()[facts.position].vault_path();
        for link in &facts.links {
            backlinks.entry(link.clone()).or_default().push(source.clone());
        }
        let entry = &mut index.entries_mut()[facts.position];
        entry.tags = facts.tags;
        entry.headings = facts.headings;
        entry.links = facts.links;
    }
    for entry in index.entries_mut() {
        if let Some(sources) = backlinks.remove(&entry.vault_path()) {
            entry.backlinks = sources;
        }
    }
    log::info!("Indexed {} files under {}", index.len(), vault_root.display());
    Ok(index)
}
