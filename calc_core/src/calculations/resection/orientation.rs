//! # Orientation Solver
//!
//! Finds the single correction that turns raw horizontal circle readings into
//! azimuths. It is solved once, from the first observation, and the same value
//! is then added to every other reading.
//!
//! The true azimuth of the first sight needs a station, so a station guess is
//! solved first from the triangle station / first point / second point:
//!
//! - the baseline between the two known points is known,
//! - the included angle at the station is the difference of the two readings,
//! - the first horizontal distance is measured.
//!
//! With both distances measured the angle at the first point comes from the
//! law of cosines. With only the first distance it comes from the law of sines,
//! taking the acute solution at the second point. Which side of the baseline
//! the station is on follows from the sense of the included angle.

use serde::{Deserialize, Serialize};

use super::{ResectionVariant, Sighting};
use crate::errors::{CalcError, CalcResult};
use crate::geometry::{azimuth, included_angle, AzimuthReference, GridPoint};
use crate::units::{Degrees, Radians};

/// Included angles closer than this to 0° or 180° leave the side of the baseline undefined
const MIN_SIN_INCLUDED: f64 = 1e-9;

/// Shortest baseline between the first two known points, in meters
const MIN_BASELINE: f64 = 1e-6;

/// Orientation correction together with the geometry it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationSolution {
    /// Correction added to circle readings, decimal degrees in [0, 360)
    pub orientation: f64,
    /// Station position used to get the true azimuth of the first sight
    pub station_guess: GridPoint,
    /// Azimuth (in the request's reference) from the first to the second known point
    pub baseline_azimuth: f64,
    /// Distance between the first two known points
    pub baseline_distance: f64,
    /// Clockwise angle at the station from the first to the second reading
    pub included_angle: f64,
    /// Interior triangle angle at the first known point
    pub angle_at_first: f64,
    /// True azimuth from the station guess to the first known point
    pub reference_azimuth: f64,
}

/// Solve the orientation from the first observation.
///
/// # Errors
///
/// * `CalcError::DegenerateGeometry` - coincident reference points, readings
///   that put the station on the baseline line, or a first distance that
///   cannot close the triangle
pub fn solve(
    variant: ResectionVariant,
    sightings: &[Sighting<'_>],
    reference: AzimuthReference,
) -> CalcResult<OrientationSolution> {
    let (first, second) = match sightings {
        [first, second, ..] => (first, second),
        _ => {
            return Err(CalcError::Internal {
                message: "orientation needs two sightings".to_string(),
            })
        }
    };

    let a = first.point.grid();
    let b = second.point.grid();
    let baseline_distance = a.distance_to(b);
    if baseline_distance < MIN_BASELINE {
        return Err(CalcError::degenerate_geometry(format!(
            "Known points '{}' and '{}' coincide in plan",
            first.point.id, second.point.id
        )));
    }

    let gamma = included_angle(first.bearing, second.bearing);
    if Degrees(gamma).sin().abs() < MIN_SIN_INCLUDED {
        return Err(CalcError::degenerate_geometry(format!(
            "Readings to '{}' and '{}' are collinear with the station",
            first.point.id, second.point.id
        )));
    }

    let d_first = first
        .reduced
        .map(|r| r.horizontal)
        .ok_or_else(|| {
            CalcError::missing_field(format!("observations[{}].slope_distance", first.index))
        })?;

    let second_distance = match variant {
        ResectionVariant::TwoPointOneDistance => None,
        _ => second.reduced.map(|r| r.horizontal),
    };

    let angle_at_first = match second_distance {
        Some(d_second) => angle_by_cosines(d_first, d_second, baseline_distance),
        None => angle_by_sines(d_first, baseline_distance, gamma)?,
    };

    let baseline_north = azimuth(a, b);
    // Station to the right of A->B when the second reading is clockwise of the first
    let first_to_station = if gamma < 180.0 {
        baseline_north + angle_at_first
    } else {
        baseline_north - angle_at_first
    };
    let station_guess = a.offset(first_to_station, d_first);

    let reference_azimuth = reference.express(first_to_station + 180.0);
    let orientation = Degrees(reference_azimuth - first.bearing).normalized().value();

    Ok(OrientationSolution {
        orientation,
        station_guess,
        baseline_azimuth: reference.express(baseline_north),
        baseline_distance,
        included_angle: gamma,
        angle_at_first,
        reference_azimuth,
    })
}

/// Angle at the first point from all three sides.
fn angle_by_cosines(d_first: f64, d_second: f64, baseline: f64) -> f64 {
    let cos_a = (d_first * d_first + baseline * baseline - d_second * d_second)
        / (2.0 * d_first * baseline);
    // Measured distances on a thin triangle can overshoot slightly
    Degrees::from(Radians(cos_a.clamp(-1.0, 1.0).acos())).value()
}

/// Angle at the first point from the included angle and the first distance.
fn angle_by_sines(d_first: f64, baseline: f64, gamma: f64) -> CalcResult<f64> {
    let interior = if gamma > 180.0 { 360.0 - gamma } else { gamma };
    let sin_second = (d_first * Degrees(interior).sin() / baseline).clamp(-1.0, 1.0);
    let angle_at_second = Degrees::from(Radians(sin_second.asin())).value();
    let angle_at_first = 180.0 - interior - angle_at_second;
    if angle_at_first <= 0.0 {
        return Err(CalcError::degenerate_geometry(format!(
            "Distance {:.3} m and included angle {:.4}° do not close a triangle on a {:.3} m baseline",
            d_first, interior, baseline
        )));
    }
    Ok(angle_at_first)
}
