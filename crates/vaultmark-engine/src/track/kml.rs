//! KML decoding.
//!
//! Each `Placemark` contributes one of: a waypoint (`Point`), path points
//! (`LineString`, `LinearRing`) or a vendor track (`gx:Track`, with `when`
//! timestamps paired to `gx:coord` entries by position). KML writes
//! longitude before latitude; points are stored as (lat, lon).

use quick_xml::Reader;
use quick_xml::events::Event;

use super::xml::{local_name, resolve_entity};
use super::{GeoPoint, ParsedTrack, TrackError, TrackFormat, Waypoint, attach_waypoints};

#[derive(Clone, Copy, PartialEq)]
enum Geometry {
    Point,
    Line,
    VendorTrack,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Name,
    Coordinates,
    When,
    Coord,
}

#[derive(Default)]
struct Placemark {
    name: Option<String>,
    points: Vec<GeoPoint>,
    waypoints: Vec<Waypoint>,
    when: Vec<String>,
    coords: Vec<GeoPoint>,
}

impl Placemark {
    /// Pairs buffered `when`/`gx:coord` entries into points.
    fn flush_vendor_track(&mut self) {
        let mut when = std::mem::take(&mut self.when).into_iter();
        for mut point in std::mem::take(&mut self.coords) {
            point.timestamp = when.next();
            self.points.push(point);
        }
    }
}

/// Parses one `lon,lat[,ele]` tuple.
pub fn parse_coordinate(tuple: &str) -> Option<GeoPoint> {
    let mut parts = tuple.split(',').map(str::trim);
    let lon = parts.next()?.parse::<f64>().ok()?;
    let lat = parts.next()?.parse::<f64>().ok()?;
    let elevation = parts.next().and_then(|e| e.parse::<f64>().ok());
    let point = GeoPoint {
        elevation,
        ..GeoPoint::new(lat, lon)
    };
    point.is_valid().then_some(point)
}

/// Parses a whitespace separated list of coordinate tuples, skipping bad ones.
pub fn parse_coordinates(text: &str) -> Vec<GeoPoint> {
    text.split_whitespace().filter_map(parse_coordinate).collect()
}

/// Parses a `gx:coord` entry: `lon lat [alt]` separated by spaces.
fn parse_vendor_coord(text: &str) -> Option<GeoPoint> {
    let mut parts = text.split_whitespace();
    let lon = parts.next()?.parse::<f64>().ok()?;
    let lat = parts.next()?.parse::<f64>().ok()?;
    let elevation = parts.next().and_then(|e| e.parse::<f64>().ok());
    Some(GeoPoint {
        elevation,
        ..GeoPoint::new(lat, lon)
    })
}

pub fn decode_kml(bytes: &[u8]) -> Result<Vec<ParsedTrack>, TrackError> {
    let content = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut tracks = Vec::new();
    let mut loose_waypoints = Vec::new();
    let mut placemark: Option<Placemark> = None;
    let mut geometry: Option<Geometry> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"Placemark" => placemark = Some(Placemark::default()),
                    b"Point" => geometry = Some(Geometry::Point),
                    b"LineString" | b"LinearRing" => geometry = Some(Geometry::Line),
                    b"Track" => geometry = Some(Geometry::VendorTrack),
                    b"name" if placemark.is_some() && geometry.is_none() => {
                        field = Some(Field::Name)
                    }
                    b"coordinates" => field = Some(Field::Coordinates),
                    b"when" => field = Some(Field::When),
                    b"coord" => field = Some(Field::Coord),
                    _ => field = None,
                }
                text.clear();
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if field.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if let Some(done) = field.take() {
                    let value = std::mem::take(&mut text);
                    apply_field(done, value.trim(), geometry, placemark.as_mut(), &mut loose_waypoints);
                }
                match local {
                    b"Point" | b"LineString" | b"LinearRing" => geometry = None,
                    b"Track" => {
                        if let Some(mark) = placemark.as_mut() {
                            mark.flush_vendor_track();
                        }
                        geometry = None;
                    }
                    b"Placemark" => {
                        if let Some(mark) = placemark.take() {
                            finish_placemark(mark, &mut tracks, &mut loose_waypoints);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(TrackError::Malformed {
                    format: TrackFormat::Kml,
                    message: err.to_string(),
                });
            }
            _ => {}
        }
    }

    attach_waypoints(&mut tracks, loose_waypoints);
    Ok(tracks)
}

fn apply_field(
    field: Field,
    value: &str,
    geometry: Option<Geometry>,
    placemark: Option<&mut Placemark>,
    loose_waypoints: &mut Vec<Waypoint>,
) {
    match (field, geometry) {
        (Field::Name, _) => {
            if let Some(mark) = placemark {
                mark.name = (!value.is_empty()).then(|| value.to_string());
            }
        }
        (Field::Coordinates, Some(Geometry::Point)) => {
            let Some(point) = parse_coordinates(value).into_iter().next() else {
                return;
            };
            let waypoint = Waypoint {
                lat: point.lat,
                lon: point.lon,
                name: None,
                elevation: point.elevation,
            };
            match placemark {
                Some(mark) => mark.waypoints.push(waypoint),
                None => loose_waypoints.push(waypoint),
            }
        }
        (Field::Coordinates, _) => {
            if let Some(mark) = placemark {
                mark.points.extend(parse_coordinates(value));
            }
        }
        (Field::When, Some(Geometry::VendorTrack)) => {
            if let Some(mark) = placemark {
                mark.when.push(value.to_string());
            }
        }
        (Field::Coord, Some(Geometry::VendorTrack)) => {
            if let Some(mark) = placemark
                && let Some(point) = parse_vendor_coord(value)
            {
                mark.coords.push(point);
            }
        }
        (Field::When | Field::Coord, _) => {}
    }
}

fn finish_placemark(
    mut mark: Placemark,
    tracks: &mut Vec<ParsedTrack>,
    waypoints: &mut Vec<Waypoint>,
) {
    mark.flush_vendor_track();
    for mut waypoint in mark.waypoints.drain(..) {
        waypoint.name = mark.name.clone();
        waypoints.push(waypoint);
    }
    if !mark.points.is_empty() {
        tracks.push(ParsedTrack {
            name: mark.name,
            points: mark.points,
            waypoints: Vec::new(),
        });
    }
}
