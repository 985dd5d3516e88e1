use serde::Serialize;

use super::{GeoPoint, ParsedTrack};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres. Identical points give exactly zero,
/// even when a coordinate is NaN; otherwise an invalid point gives NaN.
pub fn distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    if a.lat.to_bits() == b.lat.to_bits() && a.lon.to_bits() == b.lon.to_bits() {
        return 0.0;
    }
    if !a.is_valid() || !b.is_valid() {
        return f64::NAN;
    }
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// The smallest south/north/west/east rectangle containing a point set.
///
/// Built by folding points into [`BoundingRegion::empty`]; a region that saw
/// no valid point reports `is_valid() == false` instead of collapsing to a
/// box at (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRegion {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingRegion {
    pub fn empty() -> Self {
        Self {
            south: f64::INFINITY,
            north: f64::NEG_INFINITY,
            west: f64::INFINITY,
            east: f64::NEG_INFINITY,
        }
    }

    /// Extends the region by a point; invalid points are ignored.
    pub fn include(mut self, point: &GeoPoint) -> Self {
        if !point.is_valid() {
            return self;
        }
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lon);
        self.east = self.east.max(point.lon);
        self
    }

    pub fn merge(self, other: BoundingRegion) -> Self {
        if !other.is_valid() {
            return self;
        }
        Self {
            south: self.south.min(other.south),
            north: self.north.max(other.north),
            west: self.west.min(other.west),
            east: self.east.max(other.east),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.south.is_finite()
            && self.north.is_finite()
            && self.west.is_finite()
            && self.east.is_finite()
            && self.north >= self.south
            && self.east >= self.west
    }

    /// Region of every point and waypoint across `tracks`.
    pub fn of_tracks(tracks: &[ParsedTrack]) -> Self {
        tracks.iter().fold(Self::empty(), |region, track| {
            let region = track.points.iter().fold(region, Self::include);
            track
                .waypoints
                .iter()
                .fold(region, |region, wpt| region.include(&wpt.as_point()))
        })
    }
}

impl Default for BoundingRegion {
    fn default() -> Self {
        Self::empty()
    }
}
