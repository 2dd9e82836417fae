//! Isoline bands as `geo` polygons

use evroute_model::Isoline;
use geo::{Coord, LineString, Polygon};

/// One reachability band
#[derive(Debug, Clone, PartialEq)]
pub struct IsolineBand {
    /// Band index reported by the API, 0 is the innermost
    pub index: Option<u32>,
    /// Band area in `(lon, lat)`
    pub polygon: Polygon<f64>,
}

fn ring(positions: &[Vec<f64>]) -> LineString<f64> {
    positions
        .iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect()
}

/// Convert the isoline's polygons, ordered by index
///
/// Polygons without an exterior ring are dropped; polygons without an
/// index sort last, keeping their original order.
#[must_use]
pub fn isoline_polygons(isoline: &Isoline) -> Vec<IsolineBand> {
    let mut bands: Vec<IsolineBand> = isoline
        .polygons
        .iter()
        .filter_map(|p| {
            let (exterior, interiors) = p.geometry.coordinates.split_first()?;
            Some(IsolineBand {
                index: p.properties.index,
                polygon: Polygon::new(ring(exterior), interiors.iter().map(|r| ring(r)).collect()),
            })
        })
        .collect();
    bands.sort_by_key(|b| b.index.unwrap_or(u32::MAX));
    bands
}
