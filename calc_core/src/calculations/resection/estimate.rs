//! # Station Position Estimator
//!
//! Each distance observation is back-projected from its known point along the
//! corrected azimuth to give a candidate station. Candidates are then folded
//! into one station, weighted by the inverse of their horizontal distance so
//! that short, more reliable sights count for more.

use serde::{Deserialize, Serialize};

use super::{elevation, Sighting, StationCoordinates};
use crate::errors::{CalcError, CalcResult};
use crate::geometry::AzimuthReference;
use crate::units::Degrees;

/// Horizontal distances at or below this (meters) are treated as zero
pub const MIN_HORIZONTAL_DISTANCE: f64 = 1e-9;

/// A slope distance split into its horizontal and vertical components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReducedDistance {
    /// `S * sin(Z)`
    pub horizontal: f64,
    /// `S * cos(Z)`, positive when the target is above the trunnion axis
    pub vertical: f64,
}

/// Candidate station from a single observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerPointEstimate {
    pub point_id: String,
    pub easting: f64,
    pub northing: f64,
    pub elevation: f64,
    pub horizontal_distance: f64,
    pub height_difference: f64,
    /// Reading plus orientation, in the request's azimuth reference
    pub corrected_azimuth: f64,
    /// `1 / horizontal_distance`
    pub weight: f64,
}

/// Reduce a slope distance with its zenith angle (decimal degrees).
///
/// # Errors
///
/// * `CalcError::DegenerateGeometry` - slope distance not positive, or a zenith
///   angle (0°, 180°, or past it) that leaves no horizontal component
pub fn reduce_slope(field: &str, slope_distance: f64, zenith_deg: f64) -> CalcResult<ReducedDistance> {
    if slope_distance.is_nan() || slope_distance <= 0.0 {
        return Err(CalcError::degenerate_geometry(format!(
            "{} must be positive, got {}",
            field, slope_distance
        )));
    }

    let zenith = Degrees(zenith_deg);
    let horizontal = slope_distance * zenith.sin();
    if horizontal.is_nan() || horizontal <= MIN_HORIZONTAL_DISTANCE {
        return Err(CalcError::degenerate_geometry(format!(
            "{}: zenith angle {}° leaves no horizontal distance",
            field, zenith_deg
        )));
    }

    Ok(ReducedDistance {
        horizontal,
        vertical: slope_distance * zenith.cos(),
    })
}

/// Reading plus orientation, wrapped to [0, 360).
pub fn corrected_azimuth(bearing: f64, orientation: f64) -> f64 {
    Degrees(bearing + orientation).normalized().value()
}

/// Back-project one sighting into a candidate station.
pub fn estimate(
    sighting: &Sighting<'_>,
    orientation: f64,
    reference: AzimuthReference,
    instrument_height: f64,
) -> CalcResult<PerPointEstimate> {
    let reduced = sighting.reduced.ok_or_else(|| {
        CalcError::missing_field(format!("observations[{}].slope_distance", sighting.index))
    })?;

    let corrected = corrected_azimuth(sighting.bearing, orientation);
    let station_to_point = reference.to_north(corrected);
    let hd = reduced.horizontal;
    let point = sighting.point;

    let est = PerPointEstimate {
        point_id: point.id.clone(),
        easting: point.easting - hd * Degrees(station_to_point).sin(),
        northing: point.northing - hd * Degrees(station_to_point).cos(),
        elevation: elevation::resolve(
            point.elevation,
            reduced.vertical,
            sighting.target_height,
            instrument_height,
        ),
        horizontal_distance: hd,
        height_difference: reduced.vertical,
        corrected_azimuth: corrected,
        weight: 1.0 / hd,
    };
    tracing::debug!(
        point = %est.point_id,
        easting = est.easting,
        northing = est.northing,
        elevation = est.elevation,
        weight = est.weight,
        "candidate station"
    );
    Ok(est)
}

/// Inverse-distance weighted mean of the candidates.
///
/// # Errors
///
/// * `CalcError::DegenerateGeometry` - no candidates, or a total weight that is
///   not a positive finite number
pub fn aggregate(estimates: &[PerPointEstimate]) -> CalcResult<StationCoordinates> {
    let (sum_w, sum_e, sum_n, sum_h) = estimates.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(w, e, n, h), est| {
            (
                w + est.weight,
                e + est.easting * est.weight,
                n + est.northing * est.weight,
                h + est.elevation * est.weight,
            )
        },
    );

    if !(sum_w.is_finite() && sum_w > 0.0) {
        return Err(CalcError::degenerate_geometry(format!(
            "Total weight {} of {} candidate(s) cannot be averaged",
            sum_w,
            estimates.len()
        )));
    }

    Ok(StationCoordinates {
        easting: sum_e / sum_w,
        northing: sum_n / sum_w,
        elevation: sum_h / sum_w,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::resection::KnownPoint;

    fn candidate(id: &str, e: f64, n: f64, h: f64, hd: f64) -> PerPointEstimate {
        PerPointEstimate {
            point_id: id.to_string(),
            easting: e,
            northing: n,
            elevation: h,
            horizontal_distance: hd,
            height_difference: 0.0,
            corrected_azimuth: 0.0,
            weight: 1.0 / hd,
        }
    }

    #[test]
    fn test_reduce_level_sight() {
        let r = reduce_slope("s", 100.0, 90.0).unwrap();
        assert!((r.horizontal - 100.0).abs() < 1e-9);
        assert!(r.vertical.abs() < 1e-9);
    }

    #[test]
    fn test_reduce_inclined_sight() {
        let r = reduce_slope("s", 100.0, 60.0).unwrap();
        assert!((r.horizontal - 86.602_540_378).abs() < 1e-6);
        assert!((r.vertical - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_reduce_rejects_degenerate() {
        assert!(matches!(reduce_slope("s", 0.0, 90.0), Err(CalcError::DegenerateGeometry { .. })));
        assert!(matches!(reduce_slope("s", -5.0, 90.0), Err(CalcError::DegenerateGeometry { .. })));
        assert!(matches!(reduce_slope("s", 100.0, 0.0), Err(CalcError::DegenerateGeometry { .. })));
        assert!(matches!(reduce_slope("s", 100.0, 180.0), Err(CalcError::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_reduce_never_passes_nan() {
        assert!(reduce_slope("s", 100.0, f64::NAN).is_err());
        assert!(reduce_slope("s", f64::NAN, 90.0).is_err());
        assert!(reduce_slope("s", 100.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_back_projection() {
        let point = KnownPoint::new("A", 1000.0, 1000.0, 50.0);
        let sighting = Sighting {
            index: 0,
            point: &point,
            bearing: 0.0,
            target_height: 1.5,
            reduced: Some(ReducedDistance { horizontal: 100.0, vertical: 0.0 }),
        };
        // Reading 0 + orientation 90: the point lies due east of the station
        let est = estimate(&sighting, 90.0, AzimuthReference::North, 1.5).unwrap();
        assert!((est.easting - 900.0).abs() < 1e-9);
        assert!((est.northing - 1000.0).abs() < 1e-9);
        assert!((est.elevation - 50.0).abs() < 1e-12);
        assert!((est.weight - 0.01).abs() < 1e-15);

        // The same corrected azimuth read from south points the other way
        let south = estimate(&sighting, 90.0, AzimuthReference::South, 1.5).unwrap();
        assert!((south.easting - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_monotonicity() {
        let near = candidate("A", 0.0, 0.0, 0.0, 25.0);
        let far = candidate("B", 0.0, 0.0, 0.0, 400.0);
        assert!(near.weight > far.weight);
    }

    #[test]
    fn test_aggregate_weights_nearer_candidate() {
        let near = candidate("A", 10.0, 0.0, 100.0, 10.0);
        let far = candidate("B", 40.0, 30.0, 103.0, 30.0);
        let station = aggregate(&[near, far]).unwrap();
        // weights 0.1 and 1/30 -> 3:1
        assert!((station.easting - 17.5).abs() < 1e-9);
        assert!((station.northing - 7.5).abs() < 1e-9);
        assert!((station.elevation - 100.75).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(matches!(aggregate(&[]), Err(CalcError::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_corrected_azimuth_wraps() {
        assert!((corrected_azimuth(350.0, 20.0) - 10.0).abs() < 1e-12);
    }
}
