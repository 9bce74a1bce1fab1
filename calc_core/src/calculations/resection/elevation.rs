//! # Elevation Resolver
//!
//! Trigonometric heighting from the station to a known point:
//!
//! ```text
//! H_station = H_point - S * cos(Z) + target_height - instrument_height
//! ```
//!
//! where `S * cos(Z)` is the rise of the line of sight from the trunnion axis
//! to the target. Candidate elevations are combined with the same inverse
//! distance weights as the plan coordinates.

/// Station elevation implied by one observation.
pub fn resolve(
    known_elevation: f64,
    height_difference: f64,
    target_height: f64,
    instrument_height: f64,
) -> f64 {
    known_elevation - height_difference + target_height - instrument_height
}
