//! Creation inputs
//!
//! Serialized as GraphQL variables, so field names follow the API's
//! camelCase (routes) and snake_case (isolines) conventions.

use crate::error::ModelError;
use crate::location::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plug or adapter supported by the vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    /// Connector standard, e.g. `IEC_62196_T2_COMBO`
    pub standard: String,
    /// Maximum charging power in kW
    pub charging_power: f64,
}

impl Connector {
    /// Create connector
    #[inline]
    #[must_use]
    pub fn new(standard: impl Into<String>, charging_power: f64) -> Self {
        Self {
            standard: standard.into(),
            charging_power,
        }
    }
}

/// Quantity with its unit, as the API models battery figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Amount
    pub value: f64,
    /// Unit, `kwh` or `km`
    #[serde(rename = "type")]
    pub unit: EnergyUnit,
}

/// Battery quantity unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyUnit {
    /// Kilowatt-hours
    Kwh,
    /// Remaining range in kilometers
    Km,
}

/// Battery overrides
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battery {
    /// Usable capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Quantity>,
    /// Charge at departure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_of_charge: Option<Quantity>,
}

/// Vehicle description for route requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvSpec {
    /// Vehicle identifier from the vehicle catalogue
    pub id: String,
    /// Native plugs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugs: Vec<Connector>,
    /// Adapters carried
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adapters: Vec<Connector>,
    /// Battery overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<Battery>,
    /// Account for temperature and weather
    pub climate: bool,
    /// Occupants including the driver
    pub number_of_passengers: u32,
}

impl EvSpec {
    /// Vehicle with catalogue defaults: climate on, one passenger
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugs: Vec::new(),
            adapters: Vec::new(),
            battery: None,
            climate: true,
            number_of_passengers: 1,
        }
    }

    /// With a native plug
    #[inline]
    #[must_use]
    pub fn with_plug(mut self, plug: Connector) -> Self {
        self.plugs.push(plug);
        self
    }

    /// With an adapter
    #[inline]
    #[must_use]
    pub fn with_adapter(mut self, adapter: Connector) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// With state of charge at departure
    #[inline]
    #[must_use]
    pub fn with_state_of_charge(mut self, value: f64, unit: EnergyUnit) -> Self {
        let battery = self.battery.get_or_insert_with(Battery::default);
        battery.state_of_charge = Some(Quantity { value, unit });
        self
    }

    /// With usable battery capacity
    #[inline]
    #[must_use]
    pub fn with_capacity_kwh(mut self, value: f64) -> Self {
        let battery = self.battery.get_or_insert_with(Battery::default);
        battery.capacity = Some(Quantity {
            value,
            unit: EnergyUnit::Kwh,
        });
        self
    }

    /// With climate modelling on or off
    #[inline]
    #[must_use]
    pub fn with_climate(mut self, climate: bool) -> Self {
        self.climate = climate;
        self
    }

    /// With number of occupants
    #[inline]
    #[must_use]
    pub fn with_passengers(mut self, passengers: u32) -> Self {
        self.number_of_passengers = passengers;
        self
    }
}

/// How charging operators are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorPreferenceType {
    /// No preference
    #[default]
    None,
    /// Prefer ranked operators
    Preferred,
    /// Only use ranked operators
    Required,
}

/// Operator ranking levels
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorRanking {
    /// Most preferred operators
    #[serde(default)]
    pub level1: Vec<String>,
    /// Second tier
    #[serde(default)]
    pub level2: Vec<String>,
    /// Third tier
    #[serde(default)]
    pub level3: Vec<String>,
}

/// Operator preferences for a route
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorPreferences {
    /// Preference type
    #[serde(rename = "type")]
    pub kind: OperatorPreferenceType,
    /// Ranked operator ids
    pub ranking: OperatorRanking,
    /// Operators never used
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Origin, destination, and routing options
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequestBody {
    /// Start point
    pub origin: geojson::Feature,
    /// End point
    pub destination: geojson::Feature,
    /// Intermediate stops
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub via: Vec<geojson::Feature>,
    /// Operator preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<OperatorPreferences>,
}

/// Input of the route creation mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    /// Vehicle
    pub ev: EvSpec,
    /// Route definition
    pub route_request: RouteRequestBody,
}

impl RouteRequest {
    /// Route between two locations
    #[must_use]
    pub fn new(ev: EvSpec, origin: &Location, destination: &Location) -> Self {
        Self {
            ev,
            route_request: RouteRequestBody {
                origin: origin.to_feature(),
                destination: destination.to_feature(),
                via: Vec::new(),
                operators: None,
            },
        }
    }

    /// With an intermediate stop
    #[inline]
    #[must_use]
    pub fn with_via(mut self, via: &Location) -> Self {
        self.route_request.via.push(via.to_feature());
        self
    }

    /// With operator preferences
    #[inline]
    #[must_use]
    pub fn with_operators(mut self, operators: OperatorPreferences) -> Self {
        self.route_request.operators = Some(operators);
        self
    }

    /// Check fields the API requires
    ///
    /// # Errors
    /// `ModelError::IncompleteRequest` when the vehicle id is empty
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.ev.id.trim().is_empty() {
            return Err(ModelError::IncompleteRequest("ev.id"));
        }
        Ok(())
    }
}

/// Season used for isoline consumption modelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// Summer
    #[default]
    Summer,
    /// Winter
    Winter,
}

impl FromStr for Season {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summer" => Ok(Self::Summer),
            "winter" => Ok(Self::Winter),
            _ => Err(ModelError::InvalidSeason(s.to_string())),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
        })
    }
}

/// Input of the isoline creation mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsolineRequest {
    /// Vehicle identifier
    pub vehicle_id: String,
    /// Center point
    pub origin: geojson::Feature,
    /// Number of reachability bands
    pub polygon_count: u32,
    /// Season
    pub season: Season,
}

impl IsolineRequest {
    /// Isoline around a location with 10 polygons in summer
    #[must_use]
    pub fn new(vehicle_id: impl Into<String>, origin: &Location) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            origin: origin.to_feature(),
            polygon_count: 10,
            season: Season::default(),
        }
    }

    /// With polygon count
    #[inline]
    #[must_use]
    pub fn with_polygon_count(mut self, count: u32) -> Self {
        self.polygon_count = count;
        self
    }

    /// With season
    #[inline]
    #[must_use]
    pub fn with_season(mut self, season: Season) -> Self {
        self.season = season;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn amsterdam() -> Location {
        Location::new(4.895_167_9, 52.370_215_7)
            .unwrap()
            .with_name("Amsterdam, Netherlands")
    }

    fn berlin() -> Location {
        Location::new(13.388_859_9, 52.517_036_5)
            .unwrap()
            .with_name("Berlin, Germany")
    }

    #[test]
    fn route_request_shape() {
        let ev = EvSpec::new("5d161be5c9eef46132d9d20a")
            .with_plug(Connector::new("TESLA_S", 150.0))
            .with_adapter(Connector::new("CHADEMO", 150.0))
            .with_state_of_charge(40.0, EnergyUnit::Km);
        let request = RouteRequest::new(ev, &amsterdam(), &berlin());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["ev"]["numberOfPassengers"], 1);
        assert_eq!(value["ev"]["plugs"][0]["chargingPower"], 150.0);
        assert_eq!(
            value["ev"]["battery"],
            json!({ "stateOfCharge": { "value": 40.0, "type": "km" } })
        );
        assert_eq!(value["routeRequest"]["origin"]["properties"]["name"], "Amsterdam, Netherlands");
        assert!(value["routeRequest"].get("via").is_none());
        assert!(value["routeRequest"].get("operators").is_none());
    }

    #[test]
    fn operator_preferences_shape() {
        let request = RouteRequest::new(EvSpec::new("ev"), &amsterdam(), &berlin()).with_operators(
            OperatorPreferences {
                kind: OperatorPreferenceType::Preferred,
                ranking: OperatorRanking {
                    level1: vec!["op-1".into()],
                    ..OperatorRanking::default()
                },
                exclude: vec!["op-9".into()],
            },
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["routeRequest"]["operators"]["type"], "preferred");
        assert_eq!(value["routeRequest"]["operators"]["ranking"]["level1"][0], "op-1");
        assert_eq!(value["routeRequest"]["operators"]["exclude"][0], "op-9");
    }

    #[test]
    fn route_request_requires_vehicle() {
        let request = RouteRequest::new(EvSpec::new(" "), &amsterdam(), &berlin());
        assert_eq!(
            request.validate(),
            Err(ModelError::IncompleteRequest("ev.id"))
        );
    }

    #[test]
    fn isoline_request_shape() {
        let request = IsolineRequest::new("5d161beec9eef4c250d9d225", &amsterdam())
            .with_polygon_count(100)
            .with_season("WINTER".parse().unwrap());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["vehicle_id"], "5d161beec9eef4c250d9d225");
        assert_eq!(value["polygon_count"], 100);
        assert_eq!(value["season"], "winter");
        assert!("spring".parse::<Season>().is_err());
    }
}
