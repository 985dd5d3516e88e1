//! # Track Geodata
//!
//! Decodes raw GPX/KML bytes into [`ParsedTrack`]s, computes bounding
//! regions and distances, and realizes the track references found by the
//! track detector.
//!
//! - **`geo`**: great-circle distance and [`BoundingRegion`]
//! - **`gpx`**: two-tier GPX decoding (schema parser, then element scan)
//! - **`kml`**: Placemark decoding (Point, LineString, gx:Track)
//! - **`spec`**: [`TrackSpec`], the payload of a track-map placeholder
//! - **`realize`**: fetch + decode of a [`TrackSpec`] through an asset source

pub mod geo;
pub mod gpx;
pub mod kml;
pub mod realize;
pub mod spec;
mod xml;

use std::fmt;

use serde::Serialize;

pub use geo::{BoundingRegion, distance_m};
pub use realize::{MemberFailure, RealizedTrack, realize, realize_node};
pub use spec::{TrackSource, TrackSpec, TrackSpecKind};

use crate::io::IoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackFormat {
    Gpx,
    Kml,
}

impl TrackFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gpx" => Some(TrackFormat::Gpx),
            "kml" => Some(TrackFormat::Kml),
            _ => None,
        }
    }

    /// Format of a path such as `rides/day1.GPX`.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Sniffs inline markup for its root element.
    pub fn sniff(payload: &str) -> Option<Self> {
        if payload.contains("<kml") {
            Some(TrackFormat::Kml)
        } else if payload.contains("<gpx") {
            Some(TrackFormat::Gpx)
        } else {
            None
        }
    }
}

impl fmt::Display for TrackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackFormat::Gpx => f.write_str("gpx"),
            TrackFormat::Kml => f.write_str("kml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    /// ISO 8601 timestamp as found in the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
            timestamp: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl Waypoint {
    pub fn as_point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon,
            elevation: self.elevation,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedTrack {
    pub name: Option<String>,
    pub points: Vec<GeoPoint>,
    pub waypoints: Vec<Waypoint>,
}

impl ParsedTrack {
    /// Sum of great-circle distances between consecutive valid points.
    pub fn length_m(&self) -> f64 {
        let valid: Vec<&GeoPoint> = self.points.iter().filter(|p| p.is_valid()).collect();
        valid
            .windows(2)
            .fold(0.0, |total, w| total + distance_m(w[0], w[1]))
    }

    /// Sum of positive elevation deltas between consecutive points that
    /// both carry an elevation.
    pub fn elevation_gain_m(&self) -> f64 {
        self.points
            .windows(2)
            .filter_map(|w| Some(w[1].elevation? - w[0].elevation?))
            .filter(|delta| *delta > 0.0)
            .fold(0.0, |total, delta| total + delta)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("Malformed {format} data: {message}")]
    Malformed { format: TrackFormat, message: String },
    #[error("Could not fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: IoError,
    },
    #[error("Unknown track format for {0}")]
    UnknownFormat(String),
    #[error("Track reference has no payload")]
    MissingPayload,
    #[error("All {count} tracks failed to load")]
    AllMembersFailed { count: usize },
}

/// Decodes raw trail-file bytes of a declared format.
pub fn decode(bytes: &[u8], format: TrackFormat) -> Result<Vec<ParsedTrack>, TrackError> {
    match format {
        TrackFormat::Gpx => gpx::decode_gpx(bytes),
        TrackFormat::Kml => kml::decode_kml(bytes),
    }
}

/// Attaches waypoints to the first track, creating an empty one if needed.
fn attach_waypoints(tracks: &mut Vec<ParsedTrack>, waypoints: Vec<Waypoint>) {
    if waypoints.is_empty() {
        return;
    }
    match tracks.first_mut() {
        Some(first) => first.waypoints.extend(waypoints),
        None => tracks.push(ParsedTrack {
            waypoints,
            ..ParsedTrack::default()
        }),
    }
}
