use serde::Serialize;

use super::TrackFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackSpecKind {
    SingleTrack,
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    Inline,
    File,
    /// An aggregate mixing inline payloads and files.
    Mixed,
}

/// Payload of a track-map placeholder, handed to the map renderer.
///
/// A single track carries either `file_path` (as written) plus
/// `resolved_path`, or an inline `payload`. An aggregate carries its
/// members in `tracks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TrackSpecKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TrackFormat>,
    pub source: TrackSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<TrackSpec>,
}

impl TrackSpec {
    pub fn file(
        id: impl Into<String>,
        format: TrackFormat,
        file_path: impl Into<String>,
        resolved_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: TrackSpecKind::SingleTrack,
            format: Some(format),
            source: TrackSource::File,
            file_path: Some(file_path.into()),
            resolved_path: Some(resolved_path.into()),
            payload: None,
            tracks: Vec::new(),
        }
    }

    pub fn inline(id: impl Into<String>, format: TrackFormat, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TrackSpecKind::SingleTrack,
            format: Some(format),
            source: TrackSource::Inline,
            file_path: None,
            resolved_path: None,
            payload: Some(payload.into()),
            tracks: Vec::new(),
        }
    }

    /// Groups members. The aggregate's format is set only when every member
    /// shares it; its source is `File` unless some member is inline.
    pub fn aggregate(id: impl Into<String>, tracks: Vec<TrackSpec>) -> Self {
        let format = tracks
            .first()
            .and_then(|first| first.format)
            .filter(|format| tracks.iter().all(|t| t.format == Some(*format)));
        let source = if tracks.iter().all(|t| t.source == TrackSource::File) {
            TrackSource::File
        } else {
            TrackSource::Mixed
        };
        Self {
            id: id.into(),
            kind: TrackSpecKind::Aggregate,
            format,
            source,
            file_path: None,
            resolved_path: None,
            payload: None,
            tracks,
        }
    }

    /// Human-readable origin for error messages.
    pub fn describe(&self) -> String {
        match (&self.file_path, self.kind) {
            (Some(path), _) => path.clone(),
            (None, TrackSpecKind::Aggregate) => format!("{} ({} tracks)", self.id, self.tracks.len()),
            (None, TrackSpecKind::SingleTrack) => format!("{} (inline)", self.id),
        }
    }
}
