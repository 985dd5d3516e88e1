//! Wiki-link target classification and path resolution.
//!
//! Resolution is a pure function of the raw target, the current document's
//! vault path and an optional [`FileIndex`]. The index is consulted first;
//! without an index, or on a miss, the target is walked relative to the
//! current document's directory.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use relative_path::{Component, RelativePath};
use serde::Serialize;

use crate::models::FileIndex;

/// Characters escaped when a vault path becomes a URL. `/` is kept.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const NOTE_EXTENSION: &str = "md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    File,
    Image,
    Track,
    Pdf,
    Video,
    Audio,
}

impl LinkKind {
    /// Classifies a lowercased extension. `None` means "no extension" and
    /// is a note; an unrecognised extension yields `None`.
    pub fn from_extension(ext: Option<&str>) -> Option<LinkKind> {
        let Some(ext) = ext else {
            return Some(LinkKind::File);
        };
        let kind = match ext.to_ascii_lowercase().as_str() {
            NOTE_EXTENSION => LinkKind::File,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "bmp" | "avif" => LinkKind::Image,
            "gpx" | "kml" => LinkKind::Track,
            "pdf" => LinkKind::Pdf,
            "mp4" | "webm" | "mov" | "mkv" | "ogv" | "m4v" => LinkKind::Video,
            "mp3" | "wav" | "ogg" | "m4a" | "flac" | "aac" | "opus" => LinkKind::Audio,
            _ => return None,
        };
        Some(kind)
    }

    /// Kinds that must stand as their own block.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            LinkKind::Track | LinkKind::Pdf | LinkKind::Video | LinkKind::Audio
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::File => "file",
            LinkKind::Image => "image",
            LinkKind::Track => "track",
            LinkKind::Pdf => "pdf",
            LinkKind::Video => "video",
            LinkKind::Audio => "audio",
        }
    }

    pub fn from_name(name: &str) -> Option<LinkKind> {
        [
            LinkKind::File,
            LinkKind::Image,
            LinkKind::Track,
            LinkKind::Pdf,
            LinkKind::Video,
            LinkKind::Audio,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == name)
    }
}

/// A classified and resolved wiki-link target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReference {
    pub raw_target: String,
    /// Rooted vault path, extension included.
    pub resolved_path: String,
    pub kind: LinkKind,
    /// Lowercased extension of the target, if it has one.
    pub extension: Option<String>,
}

/// Extension of the last path component. It must contain an ASCII letter,
/// so `2024.01.05` has none.
pub fn extension(target: &str) -> Option<&str> {
    let name = target.rsplit('/').next().unwrap_or(target);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.bytes().any(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    if !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// Classifies and resolves `raw_target`. Returns `None` for unrecognised
/// extensions, which callers keep as literal text.
pub fn resolve(
    raw_target: &str,
    current_document: &str,
    index: Option<&FileIndex>,
) -> Option<LinkReference> {
    let raw_target = raw_target.trim();
    let ext = extension(raw_target);
    let kind = LinkKind::from_extension(ext)?;
    Some(LinkReference {
        raw_target: raw_target.to_string(),
        resolved_path: resolve_path(raw_target, current_document, index),
        kind,
        extension: ext.map(str::to_ascii_lowercase),
    })
}

/// Resolves a target to a rooted vault path.
pub fn resolve_path(target: &str, current_document: &str, index: Option<&FileIndex>) -> String {
    if let Some(entry) = index.and_then(|index| index.lookup(target)) {
        return entry.vault_path();
    }
    resolve_relative(target, current_document)
}

/// Walks `target` from the directory of `current_document`.
///
/// `./` is skipped, each `../` drops one directory (never above the vault
/// root) and a leading `/` starts from the root. `.md` is appended when the
/// target has no recognised extension.
pub fn resolve_relative(target: &str, current_document: &str) -> String {
    let mut parts: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        let current = RelativePath::new(current_document.trim_start_matches('/'));
        current
            .parent()
            .map(|dir| dir.components().map(|c| c.as_str()).collect())
            .unwrap_or_default()
    };

    for component in RelativePath::new(target.trim_start_matches('/')).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(name) => parts.push(name),
        }
    }

    let mut resolved = format!("/{}", parts.join("/"));
    let recognised = extension(target).is_some_and(|ext| {
        LinkKind::from_extension(Some(ext)).is_some()
    });
    if !recognised {
        resolved.push('.');
        resolved.push_str(NOTE_EXTENSION);
    }
    resolved
}

/// Navigation href for a note: extension stripped, percent-encoded, with an
/// optional fragment.
pub fn note_href(resolved_path: &str, fragment: Option<&str>) -> String {
    let stem = resolved_path
        .strip_suffix(".md")
        .unwrap_or(resolved_path);
    let mut href = utf8_percent_encode(stem, PATH_ESCAPE).to_string();
    if let Some(fragment) = fragment {
        href.push('#');
        href.push_str(fragment);
    }
    href
}

/// Absolute URL of an asset under the configured base.
pub fn asset_url(asset_base_url: &str, resolved_path: &str) -> String {
    format!(
        "{}{}",
        asset_base_url.trim_end_matches('/'),
        utf8_percent_encode(resolved_path, PATH_ESCAPE)
    )
}
