//! Plain-text and JSON rendering

use evroute_core::{ResourceHandle, ResourceStatus, StatusUpdate};
use evroute_geo::{isoline_polygons, leg_waypoints, route_length_m, route_line, WaypointKind};
use evroute_model::{
    alternative_deltas, format_consumption, format_distance_km, format_duration,
    format_station_duration, journey_legs, Isoline, JourneyLeg, RouteUpdate, Station, Vehicle,
};
use geo::{Area, Polygon};
use serde_json::{json, Value};
use std::fmt::Write as _;
use tracing::warn;

fn named(name: Option<&str>) -> &str {
    name.unwrap_or("unnamed")
}

fn seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "unknown".to_string(), format_duration)
}

fn meters(value: Option<f64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |m| format_distance_km(m, 1))
}

pub(crate) fn route_text(update: &RouteUpdate) -> String {
    let route = &update.route;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} -> {}",
        named(route.origin_name()),
        named(route.destination_name())
    );
    let _ = writeln!(out, "  duration:     {}", seconds(route.duration));
    let _ = writeln!(out, "  distance:     {}", meters(route.distance));
    let _ = writeln!(out, "  stops:        {}", route.charges.unwrap_or(0));
    let _ = writeln!(out, "  charge time:  {}", seconds(route.charge_time));
    let _ = writeln!(out, "  consumption:  {}", format_consumption(route.consumption));

    let mut crossings = Vec::new();
    if route.has_tolls() {
        crossings.push("tolls");
    }
    if route.has_ferries() {
        crossings.push("ferries");
    }
    if !crossings.is_empty() {
        let _ = writeln!(out, "  uses:         {}", crossings.join(", "));
    }

    match route_line(route) {
        Ok(Some(line)) => {
            let _ = writeln!(
                out,
                "  polyline:     {} over {} points",
                format_distance_km(route_length_m(&line), 1),
                line.0.len()
            );
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "route polyline could not be decoded"),
    }

    let legs = journey_legs(route);
    if !legs.is_empty() {
        let _ = writeln!(out, "\nJourney:");
        for leg in &legs {
            let _ = writeln!(out, "  {}", journey_line(leg));
        }
    }

    let waypoints = leg_waypoints(route);
    if !waypoints.is_empty() {
        let _ = writeln!(out, "\nWaypoints:");
        for wp in &waypoints {
            let role = match wp.kind {
                WaypointKind::Origin => "origin",
                WaypointKind::Stop => "stop",
                WaypointKind::Destination => "destination",
            };
            let _ = writeln!(
                out,
                "  {role:<12}{:.5},{:.5}  {}",
                wp.point.x(),
                wp.point.y(),
                named(wp.name.as_deref())
            );
        }
    }

    let deltas = alternative_deltas(route, &update.alternatives);
    if !deltas.is_empty() {
        let _ = writeln!(out, "\nAlternatives:");
        for (i, delta) in deltas.iter().enumerate() {
            let _ = writeln!(out, "  #{}  +{}", i + 1, format_duration(*delta));
        }
    }
    out
}

fn journey_line(leg: &JourneyLeg) -> String {
    match leg {
        JourneyLeg::Road(s) | JourneyLeg::Ferry(s) => {
            let kind = if matches!(leg, JourneyLeg::Ferry(_)) {
                "ferry"
            } else {
                "drive"
            };
            let toll = if s.tolls { "  (toll)" } else { "" };
            format!(
                "{kind:<8}{:>10}  {}{toll}",
                format_distance_km(s.distance, 1),
                format_duration(s.duration)
            )
        }
        JourneyLeg::Stop(stop) => {
            let mut line = format!("{:<8}{}", "stop", named(stop.name.as_deref()));
            if let Some(charge) = stop.charge_time {
                let _ = write!(line, "  charge {}", format_station_duration(charge));
            }
            if let (Some(arrive), Some(depart)) = (stop.range_at_arrival, stop.range_at_departure) {
                let _ = write!(line, "  {arrive:.0}% -> {depart:.0}%");
            }
            if let Some(plugs) = stop.plugs_available {
                let _ = write!(line, "  {plugs} plugs free");
            }
            line
        }
    }
}

pub(crate) fn isoline_text(isoline: &Isoline) -> String {
    let mut out = String::new();
    let origin = isoline.origin.as_ref().and_then(|o| o.name());
    let _ = writeln!(out, "Reachable from {}", named(origin));
    if let Some(season) = &isoline.season {
        let _ = writeln!(out, "  season:   {season}");
    }
    let bands = isoline_polygons(isoline);
    let _ = writeln!(out, "  bands:    {}", bands.len());
    for band in &bands {
        let index = band
            .index
            .map_or_else(|| "?".to_string(), |i| i.to_string());
        let _ = writeln!(
            out,
            "  #{index:<4}{:>6} vertices  {:>10.1} km2",
            band.polygon.exterior().0.len(),
            unsigned_area_km2(&band.polygon)
        );
    }
    out
}

pub(crate) fn status_text(handle: &ResourceHandle, update: &StatusUpdate<RouteUpdate>) -> String {
    let mut out = format!("{handle}: {}\n", update.status);
    if let Some(result) = &update.resource {
        out.push_str(&route_text(result));
    }
    out
}

pub(crate) fn status_json(handle: &ResourceHandle, update: &StatusUpdate<RouteUpdate>) -> Value {
    json!({
        "id": handle.as_str(),
        "status": update.status.as_str(),
        "result": update.resource,
    })
}

pub(crate) fn vehicle_line(vehicle: &Vehicle) -> String {
    let plugs: Vec<&str> = vehicle
        .connectors
        .iter()
        .filter_map(|c| c.standard.as_deref())
        .collect();
    if plugs.is_empty() {
        format!("{:<26}{}", vehicle.id, vehicle.display_name())
    } else {
        format!(
            "{:<26}{}  [{}]",
            vehicle.id,
            vehicle.display_name(),
            plugs.join(", ")
        )
    }
}

pub(crate) fn station_line(station: &Station) -> String {
    let mut line = format!("{:<26}", station.id);
    if let Some((lon, lat)) = station.lon_lat() {
        let _ = write!(line, "{lon:.5},{lat:.5}  ");
    }
    if let Some(kw) = station.power {
        let _ = write!(line, "{kw:>5.0} kW  ");
    }
    if let Some(speed) = &station.speed {
        let _ = write!(line, "{speed:<8}");
    }
    if let Some(status) = &station.status {
        let _ = write!(line, "{status:<10}");
    }
    line.push_str(named(station.address.as_deref()));
    line
}

pub(crate) fn absent_text(kind: &str, handle: &ResourceHandle, status: &ResourceStatus) -> String {
    format!("could not compute {kind} {handle} ({status})")
}

const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Polygon area in square kilometers
///
/// Equirectangular projection around the ring's mean latitude, close
/// enough for bands a few hundred kilometers across.
fn unsigned_area_km2(polygon: &Polygon<f64>) -> f64 {
    let ring = &polygon.exterior().0;
    if ring.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean_lat = ring.iter().map(|c| c.y).sum::<f64>() / ring.len() as f64;
    let km_per_degree = EARTH_RADIUS_KM.to_radians();
    polygon.unsigned_area() * km_per_degree * km_per_degree * mean_lat.to_radians().cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use evroute_model::{PointGeometry, VehicleConnector, VehicleNaming};
    use evroute_test_utils::{sample_isoline, sample_route_update};

    #[test]
    fn route_summary_lists_journey_and_alternatives() {
        let text = route_text(&sample_route_update());
        assert!(text.starts_with("Hanover, Germany -> Aalborg, Denmark\n"), "{text}");
        assert!(text.contains("duration:     6 hr 0 min"), "{text}");
        assert!(text.contains("distance:     512.0 km"), "{text}");
        assert!(text.contains("consumption:  86.40 kWh"), "{text}");
        assert!(text.contains("uses:         tolls, ferries"), "{text}");
        assert!(text.contains("stop    Ionity Hamburg  charge 0:30"), "{text}");
        assert!(text.contains("ferry"), "{text}");
        assert!(text.contains("(toll)"), "{text}");
        assert!(text.contains("destination"), "{text}");
        assert!(text.contains("#1  +20 min"), "{text}");
    }

    #[test]
    fn isoline_summary_orders_bands() {
        let text = isoline_text(&sample_isoline());
        assert!(text.contains("Reachable from Frankfurt, Germany"), "{text}");
        assert!(text.contains("bands:    2"), "{text}");
        let inner = text.find("#0").unwrap();
        let outer = text.find("#1").unwrap();
        assert!(inner < outer, "{text}");
    }

    #[test]
    fn band_area_is_plausible() {
        let bands = isoline_polygons(&sample_isoline());
        // 0.5 x 0.5 degrees around 50N is roughly 55 km by 36 km
        let area = unsigned_area_km2(&bands[0].polygon);
        assert!((1_800.0..2_200.0).contains(&area), "{area}");
    }

    #[test]
    fn absent_notice() {
        let handle = ResourceHandle::new("r9").unwrap();
        assert_eq!(
            absent_text("route", &handle, &ResourceStatus::NotFound),
            "could not compute route r9 (not_found)"
        );
    }

    #[test]
    fn status_json_carries_result() {
        let handle = ResourceHandle::new("r1").unwrap();
        let value = status_json(&handle, &StatusUpdate::done(sample_route_update()));
        assert_eq!(value["id"], "r1");
        assert_eq!(value["status"], "done");
        assert_eq!(value["result"]["route"]["distance"], 512_000.0);
        let pending = status_json(&handle, &StatusUpdate::<RouteUpdate>::pending());
        assert!(pending["result"].is_null());
    }

    #[test]
    fn catalogue_lines() {
        let vehicle = Vehicle {
            id: "5d161be5c9eef46132d9d20a".into(),
            naming: VehicleNaming {
                make: Some("Nissan".into()),
                model: Some("Leaf".into()),
                chargetrip_version: None,
            },
            connectors: vec![VehicleConnector {
                standard: Some("CHADEMO".into()),
            }],
        };
        assert_eq!(
            vehicle_line(&vehicle),
            "5d161be5c9eef46132d9d20a  Nissan Leaf  [CHADEMO]"
        );

        let station = Station {
            id: "s1".into(),
            location: Some(PointGeometry {
                kind: Some("Point".into()),
                coordinates: vec![10.2, 56.1],
            }),
            power: Some(150.0),
            speed: Some("turbo".into()),
            status: Some("free".into()),
            ..Station::default()
        };
        let line = station_line(&station);
        assert!(line.starts_with("s1"), "{line}");
        assert!(line.contains("10.20000,56.10000"), "{line}");
        assert!(line.contains("150 kW"), "{line}");
        assert!(line.ends_with("unnamed"), "{line}");
    }
}
