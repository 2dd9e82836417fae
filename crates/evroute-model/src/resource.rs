//! Resolved payloads
//!
//! Every field is optional on the wire: the API only returns what the
//! operation selected. Absent numbers deserialize as `None`, absent lists
//! as empty.

use crate::location::PointFeature;
use serde::{Deserialize, Serialize};

/// Money and CO2 saved compared to a combustion vehicle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Saving {
    /// Money saved
    #[serde(default)]
    pub money: Option<f64>,
    /// CO2 saved, in grams
    #[serde(default)]
    pub co2: Option<f64>,
}

/// One step of a leg (road, ferry, toll section, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    /// Step type as reported by the API
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Duration in seconds
    #[serde(default)]
    pub duration: f64,
    /// Encoded polyline of the step
    #[serde(default)]
    pub polyline: Option<String>,
}

impl Step {
    /// Step is a ferry crossing
    #[inline]
    #[must_use]
    pub fn is_ferry(&self) -> bool {
        self.kind.as_deref() == Some("ferry")
    }

    /// Step uses a toll road
    #[inline]
    #[must_use]
    pub fn is_toll(&self) -> bool {
        self.kind.as_deref() == Some("toll")
    }
}

/// A route leg: driving up to a charging station, via point, or the destination
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    /// `station`, `via`, `final`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Station or stop name
    #[serde(default)]
    pub name: Option<String>,
    /// Distance in meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Charging time at the leg's destination, in seconds
    #[serde(default)]
    pub charge_time: Option<f64>,
    /// Charging station id
    #[serde(default)]
    pub station_id: Option<String>,
    /// Operator of the station
    #[serde(default)]
    pub operator_name: Option<String>,
    /// Free plugs at the station
    #[serde(default)]
    pub plugs_available: Option<u32>,
    /// Range at leg start, in meters
    #[serde(default)]
    pub range_start: Option<f64>,
    /// Range at leg end, in meters
    #[serde(default)]
    pub range_end: Option<f64>,
    /// Battery percentage at leg start
    #[serde(default)]
    pub range_start_percentage: Option<f64>,
    /// Battery percentage at leg end
    #[serde(default)]
    pub range_end_percentage: Option<f64>,
    /// Leg start
    #[serde(default)]
    pub origin: Option<PointFeature>,
    /// Leg end
    #[serde(default)]
    pub destination: Option<PointFeature>,
    /// Steps in travel order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Leg {
    /// Last leg of a route, ending at the destination
    #[inline]
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.kind.as_deref() == Some("final")
    }
}

/// Computed route
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Route id, when selected
    #[serde(default)]
    pub id: Option<String>,
    /// Number of charging stops
    #[serde(default)]
    pub charges: Option<u32>,
    /// Total charging time, in seconds
    #[serde(default)]
    pub charge_time: Option<f64>,
    /// Total distance, in meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Total duration including charging, in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Energy used, in kWh
    #[serde(default)]
    pub consumption: Option<f64>,
    /// Savings
    #[serde(default)]
    pub saving: Option<Saving>,
    /// Encoded polyline of the whole route
    #[serde(default)]
    pub polyline: Option<String>,
    /// Elevation samples along the route, in meters
    #[serde(default)]
    pub elevation_plot: Vec<f64>,
    /// Total ascent, in meters
    #[serde(default)]
    pub elevation_up: Option<f64>,
    /// Total descent, in meters
    #[serde(default)]
    pub elevation_down: Option<f64>,
    /// Route tags such as `toll` and `ferry`
    #[serde(default)]
    pub tags: Vec<String>,
    /// Legs in travel order
    #[serde(default)]
    pub legs: Vec<Leg>,
}

impl Route {
    /// Route uses toll roads
    #[inline]
    #[must_use]
    pub fn has_tolls(&self) -> bool {
        self.tags.iter().any(|t| t == "toll")
    }

    /// Route uses ferries
    #[inline]
    #[must_use]
    pub fn has_ferries(&self) -> bool {
        self.tags.iter().any(|t| t == "ferry")
    }

    /// Name of the first leg's origin
    #[must_use]
    pub fn origin_name(&self) -> Option<&str> {
        self.legs.first()?.origin.as_ref()?.name()
    }

    /// Name of the last leg's destination
    #[must_use]
    pub fn destination_name(&self) -> Option<&str> {
        self.legs.last()?.destination.as_ref()?.name()
    }
}

/// Terminal route payload: the fastest route and its alternatives
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteUpdate {
    /// Fastest route
    pub route: Route,
    /// Alternatives, slowest last
    #[serde(default)]
    pub alternatives: Vec<Route>,
}

/// Properties of an isoline polygon
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonProperties {
    /// Band index, 0 is the innermost
    #[serde(default)]
    pub index: Option<u32>,
}

/// Polygon geometry as returned by the API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonGeometry {
    /// Rings of `[lon, lat]` positions; the first ring is the exterior
    #[serde(default)]
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

/// One isoline band
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IsolinePolygon {
    /// Feature type, when selected
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Geometry
    #[serde(default)]
    pub geometry: PolygonGeometry,
    /// Properties
    #[serde(default)]
    pub properties: PolygonProperties,
}

/// Computed isoline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Isoline {
    /// Isoline id, when selected
    #[serde(default)]
    pub id: Option<String>,
    /// Reachability bands
    #[serde(default)]
    pub polygons: Vec<IsolinePolygon>,
    /// Requested number of bands
    #[serde(default)]
    pub polygon_count: Option<u32>,
    /// Season used
    #[serde(default)]
    pub season: Option<String>,
    /// Center point
    #[serde(default)]
    pub origin: Option<PointFeature>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_from_partial_selection() {
        let route: Route = serde_json::from_value(json!({
            "charges": 2,
            "distance": 652_000.0,
            "duration": 27_000.0,
            "polyline": "_p~iF~ps|U",
            "tags": ["toll"],
            "legs": [{
                "type": "station",
                "chargeTime": 1800,
                "origin": { "geometry": { "coordinates": [4.89, 52.37] }, "properties": { "name": "Amsterdam" } },
                "destination": { "geometry": { "coordinates": [8.0, 52.0] } }
            }, {
                "type": "final",
                "destination": { "geometry": { "coordinates": [13.38, 52.51] }, "properties": { "name": "Berlin" } }
            }]
        }))
        .unwrap();

        assert_eq!(route.charges, Some(2));
        assert!(route.has_tolls());
        assert!(!route.has_ferries());
        assert_eq!(route.legs[0].charge_time, Some(1800.0));
        assert!(route.legs[1].is_final());
        assert_eq!(route.origin_name(), Some("Amsterdam"));
        assert_eq!(route.destination_name(), Some("Berlin"));
        assert!(route.elevation_plot.is_empty());
    }

    #[test]
    fn isoline_from_subscription_node() {
        let isoline: Isoline = serde_json::from_value(json!({
            "status": "done",
            "polygons": [{
                "type": "Feature",
                "geometry": { "coordinates": [[[8.0, 50.0], [9.0, 50.0], [9.0, 51.0], [8.0, 50.0]]] },
                "properties": { "index": 0 }
            }],
            "polygon_count": 1,
            "season": "summer",
            "origin": { "geometry": { "coordinates": [8.6821, 50.1109] } }
        }))
        .unwrap();

        assert_eq!(isoline.polygons.len(), 1);
        assert_eq!(isoline.polygons[0].properties.index, Some(0));
        assert_eq!(isoline.polygon_count, Some(1));
    }
}
