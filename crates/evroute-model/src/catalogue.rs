//! Vehicle catalogue and charging station lookups
//!
//! Both are plain paged queries. The caller owns a [`Pager`] per listing
//! and hands it to every fetch; nothing about the cursor lives globally.

use crate::location::{Location, PointGeometry};
use serde::{Deserialize, Serialize};

/// Page size the API uses when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Cursor over a paged listing
///
/// `advance` records how many items the last page held; a short page
/// marks the listing as exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    size: u32,
    exhausted: bool,
}

impl Pager {
    /// First page of `size` items; a zero size is raised to one
    #[inline]
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            exhausted: false,
        }
    }

    /// Start at `page` instead of the first one
    #[inline]
    #[must_use]
    pub fn starting_at(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Page the next fetch asks for
    #[inline]
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Items per page
    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// No further pages
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Record a fetched page of `received` items
    pub fn advance(&mut self, received: usize) {
        if received < self.size as usize {
            self.exhausted = true;
        } else {
            self.page = self.page.saturating_add(1);
        }
    }

    /// Back to the first page, e.g. after the search text changed
    pub fn reset(&mut self) {
        self.page = 0;
        self.exhausted = false;
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Vehicle naming
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VehicleNaming {
    /// Manufacturer
    #[serde(default)]
    pub make: Option<String>,
    /// Model
    #[serde(default)]
    pub model: Option<String>,
    /// Trim or version label
    #[serde(default)]
    pub chargetrip_version: Option<String>,
}

/// Plug supported by a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VehicleConnector {
    /// Connector standard, e.g. `IEC_62196_T2_COMBO`
    #[serde(default)]
    pub standard: Option<String>,
}

/// Catalogue entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle id, usable as `EvSpec` id
    pub id: String,
    /// Naming
    #[serde(default)]
    pub naming: VehicleNaming,
    /// Supported plugs
    #[serde(default)]
    pub connectors: Vec<VehicleConnector>,
}

impl Vehicle {
    /// `"{make} {model} {version}"`, skipping missing parts
    #[must_use]
    pub fn display_name(&self) -> String {
        let n = &self.naming;
        let parts: Vec<&str> = [&n.make, &n.model, &n.chargetrip_version]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.id.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Filter for stations around a point, sent as `StationAroundQuery`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationQuery {
    /// Center as a GeoJSON point
    pub location: PointGeometry,
    /// Search radius in meters
    pub distance: u32,
    /// Charger power levels in kW; empty means any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub power: Vec<f64>,
    /// Required amenities; empty means any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
}

impl StationQuery {
    /// Stations within 3 km of `center`
    #[must_use]
    pub fn around(center: &Location) -> Self {
        Self {
            location: PointGeometry {
                kind: Some("Point".to_string()),
                coordinates: vec![center.lon, center.lat],
            },
            distance: 3_000,
            power: Vec::new(),
            amenities: Vec::new(),
        }
    }

    /// With search radius in meters
    #[inline]
    #[must_use]
    pub fn with_distance(mut self, meters: u32) -> Self {
        self.distance = meters;
        self
    }

    /// With an accepted power level
    #[inline]
    #[must_use]
    pub fn with_power(mut self, kw: f64) -> Self {
        self.power.push(kw);
        self
    }

    /// With a required amenity
    #[inline]
    #[must_use]
    pub fn with_amenity(mut self, amenity: impl Into<String>) -> Self {
        self.amenities.push(amenity.into());
        self
    }
}

/// Charging station
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Station {
    /// Station id
    pub id: String,
    /// Operator-side id
    #[serde(default)]
    pub external_id: Option<String>,
    /// Street address
    #[serde(default)]
    pub address: Option<String>,
    /// Position
    #[serde(default)]
    pub location: Option<PointGeometry>,
    /// Meters above sea level
    #[serde(default)]
    pub elevation: Option<f64>,
    /// Highest charger power in kW
    #[serde(default)]
    pub power: Option<f64>,
    /// Speed class such as `fast` or `turbo`
    #[serde(default)]
    pub speed: Option<String>,
    /// Availability such as `free` or `busy`
    #[serde(default)]
    pub status: Option<String>,
    /// Nearby amenities, shape left to the API
    #[serde(default)]
    pub amenities: serde_json::Value,
}

impl Station {
    /// `(lon, lat)` if the location has both coordinates
    #[must_use]
    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        match self.location.as_ref()?.coordinates.as_slice() {
            [lon, lat, ..] => Some((*lon, *lat)),
            _ => None,
        }
    }
}
