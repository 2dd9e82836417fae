//! Human-readable durations and distances

/// Whole hours and remaining whole minutes of a duration in seconds
///
/// Negative and non-finite inputs count as zero.
#[must_use]
pub fn split_seconds(seconds: f64) -> (u64, u64) {
    if !seconds.is_finite() || seconds <= 0.0 {
        return (0, 0);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let secs = seconds.floor() as u64;
    (secs / 3600, (secs % 3600) / 60)
}

/// `"{m} min"` below one hour, `"{h} hr {m} min"` otherwise
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    match split_seconds(seconds) {
        (0, minutes) => format!("{minutes} min"),
        (hours, minutes) => format!("{hours} hr {minutes} min"),
    }
}

/// Compact `"{h}:{m}"` form used next to charging stations
#[must_use]
pub fn format_station_duration(seconds: f64) -> String {
    let (hours, minutes) = split_seconds(seconds);
    format!("{hours}:{minutes}")
}

/// Meters as kilometers with `decimals` fraction digits, e.g. `"652 km"`
#[must_use]
pub fn format_distance_km(meters: f64, decimals: usize) -> String {
    format!("{:.*} km", decimals, meters / 1000.0)
}

/// kWh with two fraction digits, `"Unknown"` when missing
#[must_use]
pub fn format_consumption(kwh: Option<f64>) -> String {
    kwh.map_or_else(|| "Unknown".to_string(), |v| format!("{v:.2} kWh"))
}
