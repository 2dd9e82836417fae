//! Geometry helpers for routes and isolines
//!
//! Everything here works in `(lon, lat)` order with `geo` types.

pub mod error;
pub mod isoline;
pub mod polyline;
pub mod route;

pub use error::GeoError;
pub use isoline::{isoline_polygons, IsolineBand};
pub use polyline::{decode_polyline, encode_polyline, DEFAULT_PRECISION};
pub use route::{
    leg_waypoints, nearest_point_on_route, route_length_m, route_line, NearestPoint, Waypoint,
    WaypointKind,
};
