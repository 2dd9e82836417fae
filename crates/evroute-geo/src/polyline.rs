//! Encoded polyline algorithm
//!
//! Values are stored as zig-zag encoded deltas in 5-bit chunks offset by
//! 63, latitude before longitude. Decoded lines are in `(lon, lat)` order
//! like every other `geo` geometry in this crate.

use crate::error::GeoError;
use geo::{Coord, LineString};

/// Precision used by the routing API
pub const DEFAULT_PRECISION: u32 = 5;

// 12 chunks of 5 bits cover every i64 delta a real polyline can hold
const MAX_SHIFT: u32 = 60;

/// Decode `encoded` into a `(lon, lat)` line
///
/// # Errors
/// `GeoError::InvalidPolyline` at the byte offset of the first byte that
/// cannot be decoded, at the end of input if the last value or the last
/// coordinate pair is incomplete, or at the start of a value whose delta
/// overflows the running coordinate.
pub fn decode_polyline(encoded: &str, precision: u32) -> Result<LineString<f64>, GeoError> {
    let factor = scale(precision)?;
    let bytes = encoded.as_bytes();
    let mut pos = 0;
    let mut lat = 0_i64;
    let mut lon = 0_i64;
    let mut coords = Vec::new();

    while pos < bytes.len() {
        let start = pos;
        lat = lat
            .checked_add(next_value(bytes, &mut pos)?)
            .ok_or(GeoError::InvalidPolyline { position: start })?;
        if pos >= bytes.len() {
            return Err(GeoError::InvalidPolyline { position: pos });
        }
        let start = pos;
        lon = lon
            .checked_add(next_value(bytes, &mut pos)?)
            .ok_or(GeoError::InvalidPolyline { position: start })?;

        #[allow(clippy::cast_precision_loss)]
        coords.push(Coord {
            x: lon as f64 / factor,
            y: lat as f64 / factor,
        });
    }

    Ok(LineString::new(coords))
}

fn next_value(bytes: &[u8], pos: &mut usize) -> Result<i64, GeoError> {
    let mut result = 0_i64;
    let mut shift = 0_u32;
    loop {
        let Some(&byte) = bytes.get(*pos) else {
            return Err(GeoError::InvalidPolyline { position: *pos });
        };
        if !(63..=126).contains(&byte) || shift > MAX_SHIFT {
            return Err(GeoError::InvalidPolyline { position: *pos });
        }
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        *pos += 1;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

/// Encode a `(lon, lat)` line
///
/// # Errors
/// - `GeoError::InvalidPrecision` when `precision` exceeds 10 digits
/// - `GeoError::UnencodableCoordinate` for a non-finite coordinate or one
///   too large for the precision
pub fn encode_polyline(line: &LineString<f64>, precision: u32) -> Result<String, GeoError> {
    let factor = scale(precision)?;
    let mut out = String::new();
    let mut prev_lat = 0_i64;
    let mut prev_lon = 0_i64;

    for (index, coord) in line.coords().enumerate() {
        let unencodable = GeoError::UnencodableCoordinate { index };
        let lat = scaled(coord.y, factor).ok_or_else(|| unencodable.clone())?;
        let lon = scaled(coord.x, factor).ok_or_else(|| unencodable.clone())?;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lon - prev_lon);
        prev_lat = lat;
        prev_lon = lon;
    }
    Ok(out)
}

// Bound keeps deltas and their zig-zag form inside i64
const MAX_SCALED: f64 = (1_i64 << 60) as f64;

fn scaled(value: f64, factor: f64) -> Option<i64> {
    let v = (value * factor).round();
    #[allow(clippy::cast_possible_truncation)]
    (v.is_finite() && v.abs() < MAX_SCALED).then(|| v as i64)
}

fn push_value(out: &mut String, delta: i64) {
    let mut v = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while v >= 0x20 {
        out.push(char::from(u8::try_from((0x20 | (v & 0x1f)) + 63).unwrap_or(b'?')));
        v >>= 5;
    }
    out.push(char::from(u8::try_from(v + 63).unwrap_or(b'?')));
}

fn scale(precision: u32) -> Result<f64, GeoError> {
    if precision > 10 {
        return Err(GeoError::InvalidPrecision(precision));
    }
    Ok(10_f64.powi(i32::try_from(precision).unwrap_or(10)))
}
