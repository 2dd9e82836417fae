//! Route geometry
//!
//! Distances are Haversine meters. The closest point is found with a
//! planar projection on each segment, which is accurate enough at the
//! segment lengths polylines carry.

use crate::error::GeoError;
use crate::polyline::{decode_polyline, DEFAULT_PRECISION};
use evroute_model::{PointFeature, Route};
use geo::{Closest, ClosestPoint, Distance, Euclidean, Haversine, Length, LineString, Point};

/// Closest point on a route to some other point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    /// Point on the route
    pub point: Point<f64>,
    /// Meters between the query point and `point`
    pub distance_m: f64,
    /// Meters from the start of the route to `point`
    pub along_route_m: f64,
}

/// Find where `point` is closest to `line`
///
/// # Errors
/// `GeoError::EmptyGeometry` if `line` has no coordinates.
pub fn nearest_point_on_route(
    line: &LineString<f64>,
    point: Point<f64>,
) -> Result<NearestPoint, GeoError> {
    let first = line.0.first().ok_or(GeoError::EmptyGeometry)?;

    let mut best = NearestPoint {
        point: Point::from(*first),
        distance_m: f64::INFINITY,
        along_route_m: 0.0,
    };
    let mut best_planar = Euclidean.distance(best.point, point);
    let mut travelled = 0.0;

    for segment in line.lines() {
        let candidate = match segment.closest_point(&point) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => segment.start_point(),
        };
        let planar = Euclidean.distance(candidate, point);
        if planar < best_planar {
            best_planar = planar;
            best.point = candidate;
            best.along_route_m = travelled + Haversine.distance(segment.start_point(), candidate);
        }
        travelled += Haversine.length(&segment);
    }

    best.distance_m = Haversine.distance(best.point, point);
    Ok(best)
}

/// Length of a `(lon, lat)` line in meters
#[must_use]
pub fn route_length_m(line: &LineString<f64>) -> f64 {
    Haversine.length(line)
}

/// Decode the route's overall polyline, if it was selected
///
/// # Errors
/// `GeoError::InvalidPolyline` if the polyline is malformed.
pub fn route_line(route: &Route) -> Result<Option<LineString<f64>>, GeoError> {
    route
        .polyline
        .as_deref()
        .map(|encoded| decode_polyline(encoded, DEFAULT_PRECISION))
        .transpose()
}

/// Role of a waypoint along the route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointKind {
    /// Start of the first leg
    Origin,
    /// End of a non-final leg
    Stop,
    /// End of the final leg
    Destination,
}

/// Named point along the route
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Role
    pub kind: WaypointKind,
    /// `(lon, lat)`
    pub point: Point<f64>,
    /// Display name, when the API returned one
    pub name: Option<String>,
}

fn waypoint(kind: WaypointKind, feature: Option<&PointFeature>) -> Option<Waypoint> {
    let feature = feature?;
    let (lon, lat) = feature.lon_lat()?;
    Some(Waypoint {
        kind,
        point: Point::new(lon, lat),
        name: feature.name().map(str::to_string),
    })
}

/// Origin of the first leg followed by every leg's destination
///
/// Legs whose points carry no coordinates are skipped.
#[must_use]
pub fn leg_waypoints(route: &Route) -> Vec<Waypoint> {
    let mut points = Vec::with_capacity(route.legs.len() + 1);
    if let Some(first) = route.legs.first() {
        points.extend(waypoint(WaypointKind::Origin, first.origin.as_ref()));
    }
    let last = route.legs.len().saturating_sub(1);
    for (i, leg) in route.legs.iter().enumerate() {
        let kind = if i == last {
            WaypointKind::Destination
        } else {
            WaypointKind::Stop
        };
        points.extend(waypoint(kind, leg.destination.as_ref()));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use evroute_model::{JsonMap, Leg, PointGeometry};
    use geo::line_string;

    fn feature(lon: f64, lat: f64, name: Option<&str>) -> PointFeature {
        PointFeature {
            geometry: Some(PointGeometry {
                kind: None,
                coordinates: vec![lon, lat],
            }),
            properties: name.map(|n| {
                let mut props = JsonMap::new();
                props.insert("name".into(), n.into());
                props
            }),
        }
    }

    #[test]
    fn nearest_point_projects_onto_segment() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        let nearest = nearest_point_on_route(&line, Point::new(1.5, 0.01)).unwrap();

        assert!((nearest.point.x() - 1.5).abs() < 1e-9);
        assert!(nearest.point.y().abs() < 1e-9);
        // 0.01 degrees of latitude is roughly 1.1 km
        assert!((nearest.distance_m - 1_112.0).abs() < 5.0, "{}", nearest.distance_m);
        // 1.5 degrees along the equator is roughly 166.8 km
        assert!((nearest.along_route_m - 166_800.0).abs() < 200.0, "{}", nearest.along_route_m);
    }

    #[test]
    fn nearest_point_before_start_clamps_to_start() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let nearest = nearest_point_on_route(&line, Point::new(-1.0, 0.0)).unwrap();
        assert_eq!(nearest.point, Point::new(0.0, 0.0));
        assert_eq!(nearest.along_route_m, 0.0);
    }

    #[test]
    fn nearest_point_on_empty_line() {
        let line = LineString::<f64>::new(vec![]);
        assert_eq!(
            nearest_point_on_route(&line, Point::new(0.0, 0.0)).unwrap_err(),
            GeoError::EmptyGeometry
        );
    }

    #[test]
    fn waypoints_follow_legs() {
        let route = Route {
            legs: vec![
                Leg {
                    origin: Some(feature(4.89, 52.37, Some("Amsterdam"))),
                    destination: Some(feature(7.0, 52.0, Some("Station A"))),
                    ..Leg::default()
                },
                Leg {
                    origin: Some(feature(7.0, 52.0, None)),
                    destination: Some(feature(13.38, 52.51, Some("Berlin"))),
                    ..Leg::default()
                },
            ],
            ..Route::default()
        };

        let points = leg_waypoints(&route);
        let kinds: Vec<_> = points.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WaypointKind::Origin, WaypointKind::Stop, WaypointKind::Destination]
        );
        assert_eq!(points[0].name.as_deref(), Some("Amsterdam"));
        assert_eq!(points[2].point, Point::new(13.38, 52.51));
    }

    #[test]
    fn route_without_polyline() {
        assert_eq!(route_line(&Route::default()).unwrap(), None);
    }
}
