//! # Plane Geometry
//!
//! Grid coordinates and the azimuth calculator.
//!
//! Azimuths are horizontal directions measured clockwise. The usual reference
//! is grid north; some field procedures count from south instead. The choice
//! is carried as an [`AzimuthReference`] and applied to a whole computation,
//! never mixed within one.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::geometry::{azimuth, AzimuthReference, GridPoint};
//!
//! let a = GridPoint::new(1000.0, 1000.0);
//! let b = GridPoint::new(1100.0, 1000.0);
//!
//! assert!((azimuth(a, b) - 90.0).abs() < 1e-12);
//! assert!((AzimuthReference::South.azimuth(a, b) - 270.0).abs() < 1e-12);
//! assert!((a.distance_to(b) - 100.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::units::{Degrees, Radians};

/// A plane grid position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Easting (E)
    pub easting: f64,
    /// Northing (N)
    pub northing: f64,
}

impl GridPoint {
    pub fn new(easting: f64, northing: f64) -> Self {
        GridPoint { easting, northing }
    }

    /// Horizontal distance to another point
    pub fn distance_to(self, other: GridPoint) -> f64 {
        (other.easting - self.easting).hypot(other.northing - self.northing)
    }

    /// North-referenced azimuth to another point, in [0, 360)
    pub fn azimuth_to(self, other: GridPoint) -> f64 {
        azimuth(self, other)
    }

    /// The point reached by travelling `distance` along north-referenced `azimuth_deg`
    pub fn offset(self, azimuth_deg: f64, distance: f64) -> GridPoint {
        let az = Degrees(azimuth_deg);
        GridPoint {
            easting: self.easting + distance * az.sin(),
            northing: self.northing + distance * az.cos(),
        }
    }
}

/// North-referenced, clockwise azimuth from `from` to `to`, in [0, 360).
///
/// Coincident points have no direction; this returns 0 for them and callers
/// that care must check the distance first.
pub fn azimuth(from: GridPoint, to: GridPoint) -> f64 {
    let de = to.easting - from.easting;
    let dn = to.northing - from.northing;
    let mut az = Degrees::from(Radians(de.atan2(dn))).value();
    if az < 0.0 {
        az += 360.0;
    }
    // atan2 of a tiny negative angle can land on exactly 360 after the shift
    if az >= 360.0 {
        az -= 360.0;
    }
    az
}

/// Which direction counts as zero azimuth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AzimuthReference {
    /// Clockwise from grid north
    #[default]
    North,
    /// Clockwise from grid south
    South,
}

impl AzimuthReference {
    /// Azimuth from `from` to `to` in this reference, in [0, 360)
    pub fn azimuth(self, from: GridPoint, to: GridPoint) -> f64 {
        self.express(azimuth(from, to))
    }

    /// Convert a north-referenced azimuth into this reference
    pub fn express(self, azimuth_deg: f64) -> f64 {
        match self {
            AzimuthReference::North => Degrees(azimuth_deg).normalized().value(),
            AzimuthReference::South => Degrees(azimuth_deg + 180.0).normalized().value(),
        }
    }

    /// Convert an azimuth in this reference back to north-referenced
    pub fn to_north(self, azimuth_deg: f64) -> f64 {
        // The 180° shift is its own inverse
        self.express(azimuth_deg)
    }
}

/// Clockwise angle swept from direction `first` to direction `second`, in [0, 360).
pub fn included_angle(first_deg: f64, second_deg: f64) -> f64 {
    Degrees(second_deg - first_deg).normalized().value()
}

/// Smallest absolute difference between two directions, in [0, 180].
pub fn angular_difference(a_deg: f64, b_deg: f64) -> f64 {
    let diff = Degrees(a_deg - b_deg).normalized().value();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_azimuths() {
        let o = GridPoint::new(0.0, 0.0);
        assert!((azimuth(o, GridPoint::new(0.0, 10.0)) - 0.0).abs() < 1e-12);
        assert!((azimuth(o, GridPoint::new(10.0, 0.0)) - 90.0).abs() < 1e-12);
        assert!((azimuth(o, GridPoint::new(0.0, -10.0)) - 180.0).abs() < 1e-12);
        assert!((azimuth(o, GridPoint::new(-10.0, 0.0)) - 270.0).abs() < 1e-12);
    }

    #[test]
    fn test_azimuth_reciprocity() {
        let pairs = [
            (GridPoint::new(1000.0, 1000.0), GridPoint::new(1100.0, 1000.0)),
            (GridPoint::new(1050.0, 900.0), GridPoint::new(1000.0, 1000.0)),
            (GridPoint::new(-3.5, 12.25), GridPoint::new(7.0, -40.0)),
            (GridPoint::new(5.0, 5.0), GridPoint::new(5.0, 5.000001)),
        ];
        for (a, b) in pairs {
            let forward = azimuth(a, b);
            let back = azimuth(b, a);
            assert!((0.0..360.0).contains(&forward));
            assert!(angular_difference(back, forward + 180.0) < 1e-9);
        }
    }

    #[test]
    fn test_south_reference() {
        let a = GridPoint::new(0.0, 0.0);
        let b = GridPoint::new(0.0, 10.0);
        assert!((AzimuthReference::South.azimuth(a, b) - 180.0).abs() < 1e-12);
        assert!((AzimuthReference::South.to_north(180.0) - 0.0).abs() < 1e-12);
        assert!((AzimuthReference::North.azimuth(a, b) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_offset_inverts_azimuth_and_distance() {
        let a = GridPoint::new(1050.0, 900.0);
        let b = GridPoint::new(1000.0, 1000.0);
        let reached = a.offset(a.azimuth_to(b), a.distance_to(b));
        assert!((reached.easting - b.easting).abs() < 1e-9);
        assert!((reached.northing - b.northing).abs() < 1e-9);
    }

    #[test]
    fn test_included_and_difference() {
        assert!((included_angle(350.0, 10.0) - 20.0).abs() < 1e-12);
        assert!((included_angle(10.0, 350.0) - 340.0).abs() < 1e-12);
        assert!((angular_difference(359.0, 1.0) - 2.0).abs() < 1e-12);
        assert!((angular_difference(0.0, 180.0) - 180.0).abs() < 1e-12);
    }
}
