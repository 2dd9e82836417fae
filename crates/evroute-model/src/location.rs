//! Point locations
//!
//! Requests carry origins and destinations as GeoJSON point features in
//! `[longitude, latitude]` order. Responses return the same shape, but the
//! API omits the `type` members, so response points use the lenient
//! [`PointFeature`] instead of `geojson::Feature`.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named longitude/latitude pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Location {
    /// Create a location, validating coordinate ranges
    ///
    /// # Errors
    /// `ModelError::InvalidLocation` if either coordinate is out of range
    pub fn new(lon: f64, lat: f64) -> Result<Self, ModelError> {
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(ModelError::InvalidLocation(format!("{lon},{lat}")));
        }
        Ok(Self {
            lon,
            lat,
            name: None,
        })
    }

    /// With a display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// GeoJSON point feature as expected by creation inputs
    #[must_use]
    pub fn to_feature(&self) -> geojson::Feature {
        let geometry = geojson::Geometry::new(geojson::Value::Point(vec![self.lon, self.lat]));
        let properties = self.name.as_ref().map(|name| {
            let mut props = geojson::JsonObject::new();
            props.insert("name".to_string(), serde_json::Value::String(name.clone()));
            props
        });
        geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

impl FromStr for Location {
    type Err = ModelError;

    /// Parse `"lon,lat"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidLocation(s.to_string());
        let (lon, lat) = s.split_once(',').ok_or_else(invalid)?;
        let lon = lon.trim().parse::<f64>().map_err(|_| invalid())?;
        let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        Self::new(lon, lat)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({}, {})", self.lon, self.lat),
            None => write!(f, "{}, {}", self.lon, self.lat),
        }
    }
}

/// Free-form GeoJSON properties
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Point geometry as returned by the API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointGeometry {
    /// Geometry type, when selected
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `[lon, lat]`
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Point feature as returned by the API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointFeature {
    /// Geometry, when present
    #[serde(default)]
    pub geometry: Option<PointGeometry>,
    /// Free-form properties
    #[serde(default)]
    pub properties: Option<JsonMap>,
}

impl PointFeature {
    /// `(lon, lat)` if the geometry has at least two coordinates
    #[must_use]
    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        match self.geometry.as_ref()?.coordinates.as_slice() {
            [lon, lat, ..] => Some((*lon, *lat)),
            _ => None,
        }
    }

    /// `properties.name`, if it is a string
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.properties.as_ref()?.get("name")?.as_str()
    }
}
