//! Realization of track references: fetch, decode, bound.

use rayon::prelude::*;
use serde::Serialize;

use crate::io::AssetSource;
use crate::models::{Element, HNode};
use crate::render::components::TRACK_MAP_CLASS;
use crate::render::error_box;

use super::{BoundingRegion, ParsedTrack, TrackError, TrackFormat, TrackSpec, TrackSpecKind, decode};

/// One aggregate member that failed to load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberFailure {
    pub source: String,
    pub message: String,
}

/// Decoded tracks of one track-map placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizedTrack {
    pub id: String,
    pub tracks: Vec<ParsedTrack>,
    pub bounds: BoundingRegion,
    /// Aggregate members that could not be loaded; the others still render.
    pub failures: Vec<MemberFailure>,
}

/// Fetches and decodes every track `spec` refers to.
///
/// Aggregate members load in parallel; the call fails only when every
/// member fails.
pub fn realize<S: AssetSource + ?Sized>(
    spec: &TrackSpec,
    source: &S,
) -> Result<RealizedTrack, TrackError> {
    let (tracks, failures) = match spec.kind {
        TrackSpecKind::SingleTrack => (load_single(spec, source)?, Vec::new()),
        TrackSpecKind::Aggregate => {
            if spec.tracks.is_empty() {
                return Err(TrackError::MissingPayload);
            }
            let results: Vec<(&TrackSpec, Result<Vec<ParsedTrack>, TrackError>)> = spec
                .tracks
                .par_iter()
                .map(|member| (member, load_single(member, source)))
                .collect();

            let mut tracks = Vec::new();
            let mut failures = Vec::new();
            for (member, result) in results {
                match result {
                    Ok(loaded) => tracks.extend(loaded),
                    Err(err) => {
                        log::warn!("Track {} failed in {}: {err}", member.describe(), spec.id);
                        failures.push(MemberFailure {
                            source: member.describe(),
                            message: err.to_string(),
                        });
                    }
                }
            }
            if failures.len() == spec.tracks.len() {
                return Err(TrackError::AllMembersFailed {
                    count: failures.len(),
                });
            }
            (tracks, failures)
        }
    };

    Ok(RealizedTrack {
        id: spec.id.clone(),
        bounds: BoundingRegion::of_tracks(&tracks),
        tracks,
        failures,
    })
}

fn load_single<S: AssetSource + ?Sized>(
    spec: &TrackSpec,
    source: &S,
) -> Result<Vec<ParsedTrack>, TrackError> {
    if let Some(payload) = &spec.payload {
        let format = spec
            .format
            .or_else(|| TrackFormat::sniff(payload))
            .ok_or_else(|| TrackError::UnknownFormat(spec.describe()))?;
        return decode(payload.as_bytes(), format);
    }

    let path = spec
        .resolved_path
        .as_deref()
        .or(spec.file_path.as_deref())
        .ok_or(TrackError::MissingPayload)?;
    let format = spec
        .format
        .or_else(|| TrackFormat::from_path(path))
        .ok_or_else(|| TrackError::UnknownFormat(path.to_string()))?;
    let bytes = source.fetch(path).map_err(|source| TrackError::Fetch {
        path: path.to_string(),
        source,
    })?;
    decode(&bytes, format)
}

/// Realizes `spec` into a map node, or an inline error box naming the
/// source and cause.
pub fn realize_node<S: AssetSource + ?Sized>(spec: &TrackSpec, source: &S) -> HNode {
    match realize(spec, source) {
        Ok(realized) => realized.to_node(),
        Err(err) => error_box(&spec.describe(), &err.to_string()),
    }
}

fn format_point(lat: f64, lon: f64) -> String {
    format!("{lat:.6},{lon:.6}")
}

impl RealizedTrack {
    /// Map container with one line per track and one marker per waypoint.
    pub fn to_node(&self) -> HNode {
        let mut map = Element::new("div")
            .with_attr("class", TRACK_MAP_CLASS)
            .with_attr("id", self.id.clone());
        if self.bounds.is_valid() {
            map = map.with_attr(
                "data-bounds",
                format!(
                    "{},{}",
                    format_point(self.bounds.south, self.bounds.west),
                    format_point(self.bounds.north, self.bounds.east)
                ),
            );
        }

        for track in &self.tracks {
            let points: Vec<String> = track
                .points
                .iter()
                .filter(|p| p.is_valid())
                .map(|p| format_point(p.lat, p.lon))
                .collect();
            let mut line = Element::new("div")
                .with_attr("class", "track-line")
                .with_attr("data-points", points.join(" "))
                .with_attr("data-length-m", format!("{:.0}", track.length_m()))
                .with_attr(
                    "data-elevation-gain-m",
                    format!("{:.0}", track.elevation_gain_m()),
                );
            if let Some(name) = &track.name {
                line = line.with_attr("data-name", name.clone());
            }
            map = map.with_child(line.into());

            for waypoint in &track.waypoints {
                let mut marker = Element::new("div")
                    .with_attr("class", "track-waypoint")
                    .with_attr("data-point", format_point(waypoint.lat, waypoint.lon));
                if let Some(name) = &waypoint.name {
                    marker = marker
                        .with_attr("title", name.clone())
                        .with_child(HNode::text(name.clone()));
                }
                map = map.with_child(marker.into());
            }
        }

        for failure in &self.failures {
            map = map.with_child(error_box(&failure.source, &failure.message));
        }
        map.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const GPX: &str = r#"<?xml version="1.0"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><name>Ridge</name><trkseg>
    <trkpt lat="30.0" lon="120.0"><ele>10</ele></trkpt>
    <trkpt lat="31.0" lon="121.0"><ele>25</ele></trkpt>
  </trkseg></trk>
</gpx>"#;

    fn assets() -> HashMap<String, Vec<u8>> {
        let mut assets = HashMap::new();
        assets.insert("/Trips/a.gpx".to_string(), GPX.as_bytes().to_vec());
        assets
    }

    #[test]
    fn single_file_track() {
        let spec = TrackSpec::file("track-0", TrackFormat::Gpx, "a.gpx", "/Trips/a.gpx");
        let realized = realize(&spec, &assets()).unwrap();
        assert_eq!(realized.tracks.len(), 1);
        assert_eq!(realized.tracks[0].name.as_deref(), Some("Ridge"));
        assert_eq!(
            realized.bounds,
            BoundingRegion {
                south: 30.0,
                north: 31.0,
                west: 120.0,
                east: 121.0,
            }
        );
    }

    #[test]
    fn inline_payload_needs_no_fetch() {
        let spec = TrackSpec::inline("track-0", TrackFormat::Gpx, GPX);
        let realized = realize(&spec, &HashMap::<String, Vec<u8>>::new()).unwrap();
        assert_eq!(realized.tracks[0].points.len(), 2);
    }

    #[test]
    fn aggregate_keeps_going_past_failed_members() {
        let spec = TrackSpec::aggregate(
            "map",
            vec![
                TrackSpec::file("map-0", TrackFormat::Gpx, "a.gpx", "/Trips/a.gpx"),
                TrackSpec::file("map-1", TrackFormat::Gpx, "gone.gpx", "/Trips/gone.gpx"),
            ],
        );
        let realized = realize(&spec, &assets()).unwrap();
        assert_eq!(realized.tracks.len(), 1);
        assert_eq!(realized.failures.len(), 1);
        assert_eq!(realized.failures[0].source, "gone.gpx");
    }

    #[test]
    fn aggregate_fails_when_every_member_fails() {
        let spec = TrackSpec::aggregate(
            "map",
            vec![TrackSpec::file("map-0", TrackFormat::Gpx, "gone.gpx", "/gone.gpx")],
        );
        assert!(matches!(
            realize(&spec, &assets()),
            Err(TrackError::AllMembersFailed { count: 1 })
        ));
    }

    #[test]
    fn failed_fetch_becomes_error_box() {
        let spec = TrackSpec::file("track-0", TrackFormat::Gpx, "gone.gpx", "/gone.gpx");
        let node = realize_node(&spec, &assets());
        let element = node.as_element().expect("element");
        assert!(element.has_class(crate::render::ERROR_CLASS));
        assert!(node.text_content().starts_with("gone.gpx: Could not fetch /gone.gpx"));
    }

    #[test]
    fn realized_node_carries_bounds_and_points() {
        let spec = TrackSpec::file("track-0", TrackFormat::Gpx, "a.gpx", "/Trips/a.gpx");
        let node = realize_node(&spec, &assets());
        let element = node.as_element().expect("element");
        assert_eq!(
            element.attr("data-bounds"),
            Some("30.000000,120.000000,31.000000,121.000000")
        );
        let line = node.children()[0].as_element().expect("line");
        assert_eq!(
            line.attr("data-points"),
            Some("30.000000,120.000000 31.000000,121.000000")
        );
        assert_eq!(line.attr("data-elevation-gain-m"), Some("15"));
    }

    #[test]
    fn single_point_track_has_zero_stats() {
        let gpx = r#"<gpx version="1.1" creator="t"><trk><trkseg><trkpt lat="1" lon="1"></trkpt></trkseg></trk></gpx>"#;
        let spec = TrackSpec::inline("track-0", TrackFormat::Gpx, gpx);
        let node = realize_node(&spec, &HashMap::<String, Vec<u8>>::new());
        let line = node.children()[0].as_element().expect("line");
        assert_eq!(line.attr("data-length-m"), Some("0"));
        assert_eq!(line.attr("data-elevation-gain-m"), Some("0"));
    }
}
