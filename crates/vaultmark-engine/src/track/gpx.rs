//! GPX decoding.
//!
//! Tier one hands the bytes to the schema parser of the `gpx` crate. When it
//! rejects the file or finds no points, tier two scans elements directly and
//! accepts the container names vendor dialects use instead of the standard
//! ones.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::xml::{attr_f64, local_name, resolve_entity};
use super::{GeoPoint, ParsedTrack, TrackError, TrackFormat, Waypoint, attach_waypoints};

const TRACK_TAGS: &[&[u8]] = &[b"trk", b"rte", b"track", b"route"];
const POINT_TAGS: &[&[u8]] = &[b"trkpt", b"rtept", b"pt", b"point"];
const ELEVATION_TAGS: &[&[u8]] = &[b"ele", b"elevation", b"altitude"];
const LAT_ATTRS: &[&[u8]] = &[b"lat", b"latitude"];
const LON_ATTRS: &[&[u8]] = &[b"lon", b"lng", b"longitude"];

pub fn decode_gpx(bytes: &[u8]) -> Result<Vec<ParsedTrack>, TrackError> {
    match decode_structured(bytes) {
        Ok(tracks) if tracks.iter().any(|t| !t.points.is_empty()) => return Ok(tracks),
        Ok(_) => log::debug!("GPX parser found no points, scanning elements"),
        Err(err) => log::debug!("GPX parser rejected input ({err}), scanning elements"),
    }
    scan_elements(bytes)
}

/// Tier one: the `gpx` crate's parser.
fn decode_structured(bytes: &[u8]) -> Result<Vec<ParsedTrack>, ::gpx::errors::GpxError> {
    let parsed = ::gpx::read(bytes)?;

    let mut tracks: Vec<ParsedTrack> = parsed
        .tracks
        .iter()
        .map(|track| ParsedTrack {
            name: track.name.clone(),
            points: track
                .segments
                .iter()
                .flat_map(|segment| segment.points.iter())
                .map(to_point)
                .collect(),
            waypoints: Vec::new(),
        })
        .collect();

    tracks.extend(parsed.routes.iter().map(|route| ParsedTrack {
        name: route.name.clone(),
        points: route.points.iter().map(to_point).collect(),
        waypoints: Vec::new(),
    }));

    let waypoints = parsed
        .waypoints
        .iter()
        .map(|wpt| Waypoint {
            lat: wpt.point().y(),
            lon: wpt.point().x(),
            name: wpt.name.clone(),
            elevation: wpt.elevation,
        })
        .collect();
    attach_waypoints(&mut tracks, waypoints);

    Ok(tracks)
}

fn to_point(wpt: &::gpx::Waypoint) -> GeoPoint {
    let point = wpt.point();
    GeoPoint {
        lat: point.y(),
        lon: point.x(),
        elevation: wpt.elevation,
        timestamp: wpt.time.as_ref().and_then(|time| time.format().ok()),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Elevation,
    Time,
    Name,
}

/// Tier two: direct element scan.
#[derive(Default)]
struct Scanner {
    tracks: Vec<ParsedTrack>,
    waypoints: Vec<Waypoint>,
    track: Option<ParsedTrack>,
    point: Option<GeoPoint>,
    waypoint: Option<Waypoint>,
    field: Option<Field>,
    text: String,
}

impl Scanner {
    fn start(&mut self, element: &BytesStart<'_>, empty: bool) {
        let name = element.name();
        let local = local_name(name.as_ref());
        if TRACK_TAGS.contains(&local) {
            if !empty {
                self.finish_track();
                self.track = Some(ParsedTrack::default());
            }
        } else if POINT_TAGS.contains(&local) {
            self.point = lat_lon(element).map(|(lat, lon)| GeoPoint::new(lat, lon));
            if empty {
                self.finish_point();
            }
        } else if local == b"wpt" {
            self.waypoint = lat_lon(element).map(|(lat, lon)| Waypoint {
                lat,
                lon,
                name: None,
                elevation: None,
            });
            if empty {
                self.finish_waypoint();
            }
        } else if !empty {
            self.field = if ELEVATION_TAGS.contains(&local) {
                Some(Field::Elevation)
            } else if local == b"time" {
                Some(Field::Time)
            } else if local == b"name" {
                Some(Field::Name)
            } else {
                None
            };
            self.text.clear();
        }
    }

    fn end(&mut self, local: &[u8]) {
        if TRACK_TAGS.contains(&local) {
            self.finish_track();
        } else if POINT_TAGS.contains(&local) {
            self.finish_point();
        } else if local == b"wpt" {
            self.finish_waypoint();
        } else if let Some(field) = self.field.take() {
            self.apply(field);
        }
    }

    fn apply(&mut self, field: Field) {
        let text = self.text.trim().to_string();
        self.text.clear();
        match field {
            Field::Elevation => {
                let elevation = text.parse::<f64>().ok().filter(|e| e.is_finite());
                if let Some(point) = self.point.as_mut() {
                    point.elevation = elevation;
                } else if let Some(waypoint) = self.waypoint.as_mut() {
                    waypoint.elevation = elevation;
                }
            }
            Field::Time => {
                if let Some(point) = self.point.as_mut() {
                    point.timestamp = (!text.is_empty()).then_some(text);
                }
            }
            Field::Name => {
                let name = (!text.is_empty()).then_some(text);
                if let Some(waypoint) = self.waypoint.as_mut() {
                    waypoint.name = name;
                } else if self.point.is_none()
                    && let Some(track) = self.track.as_mut()
                {
                    track.name = name;
                }
            }
        }
    }

    fn finish_point(&mut self) {
        let Some(point) = self.point.take() else {
            return;
        };
        // Points outside any track container still belong to a track.
        self.track
            .get_or_insert_with(ParsedTrack::default)
            .points
            .push(point);
    }

    fn finish_waypoint(&mut self) {
        if let Some(waypoint) = self.waypoint.take() {
            self.waypoints.push(waypoint);
        }
    }

    fn finish_track(&mut self) {
        if let Some(track) = self.track.take() {
            self.tracks.push(track);
        }
    }

    fn finish(mut self) -> Vec<ParsedTrack> {
        self.finish_track();
        let waypoints = std::mem::take(&mut self.waypoints);
        attach_waypoints(&mut self.tracks, waypoints);
        self.tracks
    }
}

fn lat_lon(element: &BytesStart<'_>) -> Option<(f64, f64)> {
    let lat = LAT_ATTRS.iter().find_map(|key| attr_f64(element, key))?;
    let lon = LON_ATTRS.iter().find_map(|key| attr_f64(element, key))?;
    Some((lat, lon))
}

fn scan_elements(bytes: &[u8]) -> Result<Vec<ParsedTrack>, TrackError> {
    let content = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut scanner = Scanner::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => scanner.start(&e, false),
            Ok(Event::Empty(e)) => scanner.start(&e, true),
            Ok(Event::Text(e)) => {
                if scanner.field.is_some() {
                    scanner.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if scanner.field.is_some() {
                    scanner.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if scanner.field.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        scanner.text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                scanner.end(local_name(name.as_ref()));
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(TrackError::Malformed {
                    format: TrackFormat::Gpx,
                    message: err.to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(scanner.finish())
}
