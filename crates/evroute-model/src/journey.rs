//! Journey overview
//!
//! Flattens a route into the sequence a driver experiences: driving
//! segments, ferry crossings and stops. Consecutive non-ferry steps of a
//! leg merge into one driving segment; consecutive ferry steps merge into
//! one crossing.

use crate::location::PointFeature;
use crate::resource::{Leg, Route};
use serde::Serialize;

/// Driving or ferry segment
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Segment {
    /// Meters
    pub distance: f64,
    /// Seconds
    pub duration: f64,
    /// At least one step used a toll road
    pub tolls: bool,
    /// Set on the first segment of a leg
    pub origin: Option<PointFeature>,
    /// Set on the last segment of a leg
    pub destination: Option<PointFeature>,
    /// Battery at the start of the leg, first segment only
    pub range_start_percentage: Option<f64>,
    /// Battery at the end of the leg, last segment only
    pub range_end_percentage: Option<f64>,
}

/// What kind of stop ends a non-final leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    /// Charging station
    Station,
    /// Via point or anything else the API reports
    Via,
}

/// Stop between two legs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    /// Station or via point
    pub kind: StopKind,
    /// Display name
    pub name: Option<String>,
    /// Where the stop is
    pub location: Option<PointFeature>,
    /// Charging time, in seconds
    pub charge_time: Option<f64>,
    /// Free plugs
    pub plugs_available: Option<u32>,
    /// Battery on arrival
    pub range_at_arrival: Option<f64>,
    /// Battery on departure, taken from the following leg
    pub range_at_departure: Option<f64>,
}

/// One entry of the journey overview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JourneyLeg {
    /// Driving segment
    Road(Segment),
    /// Ferry crossing
    Ferry(Segment),
    /// Stop at the end of a non-final leg
    Stop(Stop),
}

impl JourneyLeg {
    /// Segment data for road and ferry entries
    #[must_use]
    pub fn segment(&self) -> Option<&Segment> {
        match self {
            Self::Road(s) | Self::Ferry(s) => Some(s),
            Self::Stop(_) => None,
        }
    }

    fn segment_mut(&mut self) -> Option<&mut Segment> {
        match self {
            Self::Road(s) | Self::Ferry(s) => Some(s),
            Self::Stop(_) => None,
        }
    }

    fn is_ferry(&self) -> bool {
        matches!(self, Self::Ferry(_))
    }
}

/// Split every leg of `route` into road/ferry segments and stops
#[must_use]
pub fn journey_legs(route: &Route) -> Vec<JourneyLeg> {
    let mut out = Vec::new();
    for (i, leg) in route.legs.iter().enumerate() {
        let mut segments = leg_segments(leg);

        if let Some(first) = segments.first_mut().and_then(JourneyLeg::segment_mut) {
            first.origin.clone_from(&leg.origin);
            first.range_start_percentage = leg.range_start_percentage;
        }
        if let Some(last) = segments.last_mut().and_then(JourneyLeg::segment_mut) {
            last.destination.clone_from(&leg.destination);
            last.range_end_percentage = leg.range_end_percentage;
        }
        out.append(&mut segments);

        if !leg.is_final() {
            let next = route.legs.get(i + 1);
            out.push(JourneyLeg::Stop(Stop {
                kind: if leg.kind.as_deref() == Some("station") {
                    StopKind::Station
                } else {
                    StopKind::Via
                },
                name: leg.name.clone(),
                location: leg.destination.clone(),
                charge_time: leg.charge_time,
                plugs_available: leg.plugs_available,
                range_at_arrival: leg.range_end_percentage,
                range_at_departure: next.and_then(|n| n.range_start_percentage),
            }));
        }
    }
    out
}

fn leg_segments(leg: &Leg) -> Vec<JourneyLeg> {
    if leg.steps.is_empty() {
        return vec![JourneyLeg::Road(Segment {
            distance: leg.distance.unwrap_or_default(),
            duration: leg.duration.unwrap_or_default(),
            ..Segment::default()
        })];
    }

    let mut segments: Vec<JourneyLeg> = Vec::new();
    for step in &leg.steps {
        let open_new = match segments.last() {
            None => true,
            Some(last) => last.is_ferry() != step.is_ferry(),
        };
        if open_new {
            segments.push(if step.is_ferry() {
                JourneyLeg::Ferry(Segment::default())
            } else {
                JourneyLeg::Road(Segment::default())
            });
        }
        if let Some(current) = segments.last_mut().and_then(JourneyLeg::segment_mut) {
            current.distance += step.distance;
            current.duration += step.duration;
            current.tolls |= step.is_toll();
        }
    }
    segments
}

/// Extra duration of each alternative over the fastest route, in seconds
#[must_use]
pub fn alternative_deltas(fastest: &Route, alternatives: &[Route]) -> Vec<f64> {
    let base = fastest.duration.unwrap_or_default();
    alternatives
        .iter()
        .map(|alt| alt.duration.unwrap_or_default() - base)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Step;
    use pretty_assertions::assert_eq;

    fn step(kind: &str, distance: f64, duration: f64) -> Step {
        Step {
            kind: Some(kind.to_string()),
            distance,
            duration,
            polyline: None,
        }
    }

    fn leg(kind: &str, steps: Vec<Step>, start: f64, end: f64) -> Leg {
        Leg {
            kind: Some(kind.to_string()),
            name: Some(format!("{kind} stop")),
            range_start_percentage: Some(start),
            range_end_percentage: Some(end),
            charge_time: Some(1_200.0),
            plugs_available: Some(3),
            steps,
            ..Leg::default()
        }
    }

    #[test]
    fn ferry_splits_road_segments() {
        let route = Route {
            legs: vec![
                leg(
                    "station",
                    vec![
                        step("road", 1_000.0, 60.0),
                        step("toll", 2_000.0, 90.0),
                        step("ferry", 5_000.0, 1_800.0),
                        step("ferry", 1_000.0, 300.0),
                        step("road", 500.0, 30.0),
                    ],
                    90.0,
                    20.0,
                ),
                leg("final", vec![step("road", 4_000.0, 200.0)], 80.0, 55.0),
            ],
            ..Route::default()
        };

        let journey = journey_legs(&route);
        assert_eq!(journey.len(), 5);

        let JourneyLeg::Road(first) = &journey[0] else {
            panic!("expected road, got {:?}", journey[0]);
        };
        assert_eq!(first.distance, 3_000.0);
        assert!(first.tolls);
        assert_eq!(first.range_start_percentage, Some(90.0));

        let JourneyLeg::Ferry(ferry) = &journey[1] else {
            panic!("expected ferry, got {:?}", journey[1]);
        };
        assert_eq!(ferry.distance, 6_000.0);
        assert_eq!(ferry.duration, 2_100.0);

        let JourneyLeg::Road(after) = &journey[2] else {
            panic!("expected road, got {:?}", journey[2]);
        };
        assert!(!after.tolls);
        assert_eq!(after.range_end_percentage, Some(20.0));

        let JourneyLeg::Stop(stop) = &journey[3] else {
            panic!("expected stop, got {:?}", journey[3]);
        };
        assert_eq!(stop.kind, StopKind::Station);
        assert_eq!(stop.range_at_arrival, Some(20.0));
        assert_eq!(stop.range_at_departure, Some(80.0));

        assert!(matches!(journey[4], JourneyLeg::Road(_)));
    }

    #[test]
    fn leg_without_steps_is_one_road_segment() {
        let mut final_leg = leg("final", Vec::new(), 50.0, 10.0);
        final_leg.distance = Some(12_000.0);
        final_leg.duration = Some(600.0);
        let route = Route {
            legs: vec![final_leg],
            ..Route::default()
        };

        let journey = journey_legs(&route);
        assert_eq!(journey.len(), 1);
        let seg = journey[0].segment().unwrap();
        assert_eq!(seg.distance, 12_000.0);
        assert_eq!(seg.duration, 600.0);
    }

    #[test]
    fn leading_ferry_step() {
        let route = Route {
            legs: vec![leg(
                "final",
                vec![step("ferry", 3_000.0, 900.0), step("road", 100.0, 10.0)],
                70.0,
                60.0,
            )],
            ..Route::default()
        };
        let journey = journey_legs(&route);
        assert!(matches!(journey[0], JourneyLeg::Ferry(_)));
        assert!(matches!(journey[1], JourneyLeg::Road(_)));
    }

    #[test]
    fn deltas_against_fastest() {
        let with_duration = |d| Route {
            duration: Some(d),
            ..Route::default()
        };
        let deltas = alternative_deltas(
            &with_duration(3_600.0),
            &[with_duration(4_200.0), with_duration(7_200.0)],
        );
        assert_eq!(deltas, vec![600.0, 3_600.0]);
    }
}
