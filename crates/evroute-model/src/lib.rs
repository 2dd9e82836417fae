//! Request and response types for EV route and isoline computations
//!
//! Requests serialize into GraphQL variables; resources deserialize from
//! subscription and query payloads. The journey and formatting helpers
//! are shared by every consumer that renders a route.

pub mod catalogue;
pub mod error;
pub mod format;
pub mod journey;
pub mod location;
pub mod request;
pub mod resource;

pub use catalogue::{
    Pager, Station, StationQuery, Vehicle, VehicleConnector, VehicleNaming, DEFAULT_PAGE_SIZE,
};
pub use error::ModelError;
pub use format::{
    format_consumption, format_distance_km, format_duration, format_station_duration,
    split_seconds,
};
pub use journey::{alternative_deltas, journey_legs, JourneyLeg, Segment, Stop, StopKind};
pub use location::{JsonMap, Location, PointFeature, PointGeometry};
pub use request::{
    Battery, Connector, EnergyUnit, EvSpec, IsolineRequest, OperatorPreferenceType,
    OperatorPreferences, OperatorRanking, Quantity, RouteRequest, RouteRequestBody, Season,
};
pub use resource::{
    Isoline, IsolinePolygon, Leg, PolygonGeometry, PolygonProperties, Route, RouteUpdate, Saving,
    Step,
};
