//! Error types for model construction

/// Model errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Coordinates could not be parsed or are out of range
    #[error("invalid location '{0}', expected 'lon,lat'")]
    InvalidLocation(String),

    /// Unknown season name
    #[error("invalid season '{0}'")]
    InvalidSeason(String),

    /// Request is missing a required part
    #[error("incomplete request: {0}")]
    IncompleteRequest(&'static str),
}
