//! # Precision / Residual Analysis
//!
//! Closes the loop: azimuths and distances are recomputed from the final
//! station back to each known point and compared with what was observed.
//!
//! The report is diagnostic only. A result is always returned with its
//! precision block; deciding whether the numbers are good enough is left to
//! the caller.

use serde::{Deserialize, Serialize};

use super::{PerPointEstimate, ResectionVariant, Sighting, StationCoordinates};
use crate::geometry::{angular_difference, included_angle, AzimuthReference};
use crate::settings::ResectionSettings;
use crate::units::{round_to, Arcseconds, Degrees};

/// Azimuth and horizontal distance from the final station to a known point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackSight {
    pub point_id: String,
    /// In the request's azimuth reference
    pub azimuth: f64,
    pub distance: f64,
}

/// Measured versus recomputed horizontal distance to one known point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceCheck {
    pub point_id: String,
    pub measured: f64,
    pub recomputed: f64,
    /// `|measured - recomputed|`
    pub residual: f64,
}

/// Disagreement between the observed and recomputed included angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleCheck {
    /// Decimal degrees, [0, 180]
    pub degrees: f64,
    pub arcseconds: f64,
}

impl AngleCheck {
    fn from_degrees(degrees: f64) -> Self {
        AngleCheck {
            degrees,
            arcseconds: Arcseconds::from(Degrees(degrees)).value(),
        }
    }
}

/// Variant-specific precision block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PrecisionReport {
    /// Two points, distance to the first only
    SingleDistance {
        horizontal_residual: f64,
        angle_check: AngleCheck,
    },
    /// Two points with both distances
    DualDistance {
        /// Spread in easting between the two candidates
        delta_e: f64,
        /// Spread in northing between the two candidates
        delta_n: f64,
        distances: Vec<DistanceCheck>,
        angle_check: AngleCheck,
    },
    /// Three points with all distances
    ThreePoint {
        max_delta_e: f64,
        max_delta_n: f64,
        max_delta_h: f64,
        distances: Vec<DistanceCheck>,
        angle_check: AngleCheck,
    },
}

impl PrecisionReport {
    pub fn angle_check(&self) -> AngleCheck {
        match self {
            PrecisionReport::SingleDistance { angle_check, .. }
            | PrecisionReport::DualDistance { angle_check, .. }
            | PrecisionReport::ThreePoint { angle_check, .. } => *angle_check,
        }
    }

    /// Largest distance residual in the block
    pub fn max_distance_residual(&self) -> f64 {
        match self {
            PrecisionReport::SingleDistance { horizontal_residual, .. } => *horizontal_residual,
            PrecisionReport::DualDistance { distances, .. }
            | PrecisionReport::ThreePoint { distances, .. } => {
                distances.iter().map(|d| d.residual).fold(0.0, f64::max)
            }
        }
    }

    /// Copy rounded for display
    pub fn rounded(&self, settings: &ResectionSettings) -> Self {
        let c = settings.coordinate_decimals;
        match self {
            PrecisionReport::SingleDistance { horizontal_residual, angle_check } => {
                PrecisionReport::SingleDistance {
                    horizontal_residual: round_to(*horizontal_residual, c),
                    angle_check: round_angle(angle_check, settings),
                }
            }
            PrecisionReport::DualDistance { delta_e, delta_n, distances, angle_check } => {
                PrecisionReport::DualDistance {
                    delta_e: round_to(*delta_e, c),
                    delta_n: round_to(*delta_n, c),
                    distances: round_distances(distances, c),
                    angle_check: round_angle(angle_check, settings),
                }
            }
            PrecisionReport::ThreePoint {
                max_delta_e,
                max_delta_n,
                max_delta_h,
                distances,
                angle_check,
            } => PrecisionReport::ThreePoint {
                max_delta_e: round_to(*max_delta_e, c),
                max_delta_n: round_to(*max_delta_n, c),
                max_delta_h: round_to(*max_delta_h, c),
                distances: round_distances(distances, c),
                angle_check: round_angle(angle_check, settings),
            },
        }
    }
}

fn round_angle(check: &AngleCheck, settings: &ResectionSettings) -> AngleCheck {
    AngleCheck {
        degrees: round_to(check.degrees, settings.orientation_decimals),
        arcseconds: round_to(check.arcseconds, 1),
    }
}

fn round_distances(checks: &[DistanceCheck], decimals: u32) -> Vec<DistanceCheck> {
    checks
        .iter()
        .map(|d| DistanceCheck {
            point_id: d.point_id.clone(),
            measured: round_to(d.measured, decimals),
            recomputed: round_to(d.recomputed, decimals),
            residual: round_to(d.residual, decimals),
        })
        .collect()
}

/// Azimuth and distance from the final station to every observed point.
pub fn back_sights(
    sightings: &[Sighting<'_>],
    station: &StationCoordinates,
    reference: AzimuthReference,
) -> Vec<BackSight> {
    let origin = station.grid();
    sightings
        .iter()
        .map(|s| BackSight {
            point_id: s.point.id.clone(),
            azimuth: reference.azimuth(origin, s.point.grid()),
            distance: origin.distance_to(s.point.grid()),
        })
        .collect()
}

/// Build the precision block for the variant.
///
/// `back_sights` must be in the same order as `sightings`.
pub fn analyze(
    variant: ResectionVariant,
    sightings: &[Sighting<'_>],
    estimates: &[PerPointEstimate],
    back_sights: &[BackSight],
    station: &StationCoordinates,
) -> PrecisionReport {
    let angle_check = AngleCheck::from_degrees(included_angle_misclosure(sightings, back_sights));

    let distances: Vec<DistanceCheck> = sightings
        .iter()
        .zip(back_sights)
        .filter_map(|(s, back)| {
            s.reduced.map(|r| DistanceCheck {
                point_id: s.point.id.clone(),
                measured: r.horizontal,
                recomputed: back.distance,
                residual: (r.horizontal - back.distance).abs(),
            })
        })
        .collect();

    let report = match variant {
        ResectionVariant::TwoPointOneDistance => PrecisionReport::SingleDistance {
            horizontal_residual: distances.first().map(|d| d.residual).unwrap_or(0.0),
            angle_check,
        },
        ResectionVariant::TwoPointTwoDistance => {
            let (delta_e, delta_n) = match estimates {
                [first, second, ..] => (
                    (first.easting - second.easting).abs(),
                    (first.northing - second.northing).abs(),
                ),
                _ => (0.0, 0.0),
            };
            PrecisionReport::DualDistance {
                delta_e,
                delta_n,
                distances,
                angle_check,
            }
        }
        ResectionVariant::ThreePoint => PrecisionReport::ThreePoint {
            max_delta_e: max_deviation(estimates, |e| e.easting, station.easting),
            max_delta_n: max_deviation(estimates, |e| e.northing, station.northing),
            max_delta_h: max_deviation(estimates, |e| e.elevation, station.elevation),
            distances,
            angle_check,
        },
    };

    tracing::debug!(
        angle_check_sec = angle_check.arcseconds,
        max_distance_residual = report.max_distance_residual(),
        "precision analysed"
    );
    report
}

fn max_deviation(
    estimates: &[PerPointEstimate],
    component: impl Fn(&PerPointEstimate) -> f64,
    target: f64,
) -> f64 {
    estimates
        .iter()
        .map(|e| (component(e) - target).abs())
        .fold(0.0, f64::max)
}

/// |observed included angle - included angle between the back azimuths|, in [0, 180].
fn included_angle_misclosure(sightings: &[Sighting<'_>], back_sights: &[BackSight]) -> f64 {
    match (sightings, back_sights) {
        ([s1, s2, ..], [b1, b2, ..]) => {
            let observed = included_angle(s1.bearing, s2.bearing);
            let recomputed = included_angle(b1.azimuth, b2.azimuth);
            angular_difference(observed, recomputed)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::resection::{KnownPoint, ReducedDistance};

    fn estimate(id: &str, e: f64, n: f64, h: f64) -> PerPointEstimate {
        PerPointEstimate {
            point_id: id.to_string(),
            easting: e,
            northing: n,
            elevation: h,
            horizontal_distance: 100.0,
            height_difference: 0.0,
            corrected_azimuth: 0.0,
            weight: 0.01,
        }
    }

    #[test]
    fn test_three_point_max_deltas() {
        let a = KnownPoint::new("A", 0.0, 100.0, 0.0);
        let b = KnownPoint::new("B", 100.0, 0.0, 0.0);
        let c = KnownPoint::new("C", -100.0, 0.0, 0.0);
        let reduced = Some(ReducedDistance { horizontal: 100.0, vertical: 0.0 });
        let sightings = vec![
            Sighting { index: 0, point: &a, bearing: 0.0, target_height: 0.0, reduced },
            Sighting { index: 1, point: &b, bearing: 90.0, target_height: 0.0, reduced },
            Sighting { index: 2, point: &c, bearing: 270.0, target_height: 0.0, reduced },
        ];
        let station = StationCoordinates { easting: 0.0, northing: 0.0, elevation: 10.0 };
        let estimates = vec![
            estimate("A", 0.01, 0.0, 10.0),
            estimate("B", -0.02, 0.005, 10.004),
            estimate("C", 0.01, -0.005, 9.996),
        ];
        let backs = back_sights(&sightings, &station, AzimuthReference::North);
        let report = analyze(ResectionVariant::ThreePoint, &sightings, &estimates, &backs, &station);

        match &report {
            PrecisionReport::ThreePoint { max_delta_e, max_delta_n, max_delta_h, distances, .. } => {
                assert!((max_delta_e - 0.02).abs() < 1e-12);
                assert!((max_delta_n - 0.005).abs() < 1e-12);
                assert!((max_delta_h - 0.004).abs() < 1e-9);
                assert_eq!(distances.len(), 3);
                assert!(distances.iter().all(|d| d.residual < 1e-9));
            }
            other => panic!("unexpected report {:?}", other),
        }
        assert!(report.angle_check().degrees < 1e-9);
    }

    #[test]
    fn test_angle_check_detects_misclosure() {
        let a = KnownPoint::new("A", 0.0, 100.0, 0.0);
        let b = KnownPoint::new("B", 100.0, 0.0, 0.0);
        let reduced = Some(ReducedDistance { horizontal: 100.0, vertical: 0.0 });
        // True included angle is 90°, observed 90° 00' 36"
        let sightings = vec![
            Sighting { index: 0, point: &a, bearing: 0.0, target_height: 0.0, reduced },
            Sighting { index: 1, point: &b, bearing: 90.01, target_height: 0.0, reduced: None },
        ];
        let station = StationCoordinates { easting: 0.0, northing: 0.0, elevation: 0.0 };
        let backs = back_sights(&sightings, &station, AzimuthReference::North);
        let report = analyze(
            ResectionVariant::TwoPointOneDistance,
            &sightings,
            &[estimate("A", 0.0, 0.0, 0.0)],
            &backs,
            &station,
        );
        let check = report.angle_check();
        assert!((check.degrees - 0.01).abs() < 1e-9);
        assert!((check.arcseconds - 36.0).abs() < 1e-6);
        assert!(matches!(report, PrecisionReport::SingleDistance { .. }));
    }

    #[test]
    fn test_angle_check_wraps_near_north() {
        let a = KnownPoint::new("A", -1.0, 100.0, 0.0);
        let b = KnownPoint::new("B", 1.0, 100.0, 0.0);
        let sightings = vec![
            Sighting { index: 0, point: &a, bearing: 359.0, target_height: 0.0, reduced: None },
            Sighting { index: 1, point: &b, bearing: 1.0, target_height: 0.0, reduced: None },
        ];
        let station = StationCoordinates { easting: 0.0, northing: 0.0, elevation: 0.0 };
        let backs = back_sights(&sightings, &station, AzimuthReference::North);
        let misclosure = included_angle_misclosure(&sightings, &backs);
        // Observed 2°, recomputed 1.1458°
        assert!(misclosure < 1.0);
    }

    #[test]
    fn test_rounded_report() {
        let report = PrecisionReport::DualDistance {
            delta_e: 0.001_234_5,
            delta_n: 0.000_4,
            distances: vec![DistanceCheck {
                point_id: "A".to_string(),
                measured: 111.803_398,
                recomputed: 111.803_1,
                residual: 0.000_298,
            }],
            angle_check: AngleCheck::from_degrees(0.000_123),
        };
        let rounded = report.rounded(&ResectionSettings::default());
        match rounded {
            PrecisionReport::DualDistance { delta_e, delta_n, distances, angle_check } => {
                assert_eq!(delta_e, 0.001);
                assert_eq!(delta_n, 0.0);
                assert_eq!(distances[0].measured, 111.803);
                assert_eq!(angle_check.degrees, 0.0001);
                assert_eq!(angle_check.arcseconds, 0.4);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_report_json_tag() {
        let report = PrecisionReport::SingleDistance {
            horizontal_residual: 0.0,
            angle_check: AngleCheck::from_degrees(0.0),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"SingleDistance\""));
    }
}
