//! Geometry errors

/// Geometry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    /// Encoded polyline is malformed at the given byte offset
    #[error("invalid polyline at byte {position}")]
    InvalidPolyline {
        /// Byte offset of the first undecodable byte
        position: usize,
    },

    /// Precision outside the supported range
    #[error("unsupported polyline precision {0}")]
    InvalidPrecision(u32),

    /// Coordinate cannot be represented at the requested precision
    #[error("coordinate {index} is not encodable")]
    UnencodableCoordinate {
        /// Index of the offending coordinate
        index: usize,
    },

    /// Geometry has fewer points than the operation needs
    #[error("empty geometry")]
    EmptyGeometry,
}

impl GeoError {
    /// Error was caused by malformed input text
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidPolyline { .. } | Self::UnencodableCoordinate { .. }
        )
    }
}
