//! # Unit Types
//!
//! Type-safe wrappers for surveying units. These provide compile-time
//! safety against unit confusion while remaining lightweight (just f64 wrappers).
//!
//! ## Design Philosophy
//!
//! Request and result structs keep plain `f64` fields so the JSON stays flat.
//! The wrappers are used inside the engine wherever an angle crosses between
//! degrees and radians, which is where unit slips actually happen.
//!
//! ## Units
//!
//! Lengths are always meters and stay as bare `f64`. Angles come in three
//! flavours: decimal degrees, radians, arcseconds.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{Arcseconds, Degrees, Radians};
//!
//! let right_angle = Degrees(90.0);
//! let rad: Radians = right_angle.into();
//! assert!((rad.0 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
//!
//! let one_second: Arcseconds = Degrees(1.0 / 3600.0).into();
//! assert!((one_second.0 - 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Angle Units
// ============================================================================

/// Angle in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

/// Angle in arcseconds (1/3600 degree)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arcseconds(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(rad: Radians) -> Self {
        Degrees(rad.0.to_degrees())
    }
}

impl From<Degrees> for Arcseconds {
    fn from(deg: Degrees) -> Self {
        Arcseconds(deg.0 * 3600.0)
    }
}

impl From<Arcseconds> for Degrees {
    fn from(sec: Arcseconds) -> Self {
        Degrees(sec.0 / 3600.0)
    }
}

impl Degrees {
    /// Sine of the angle
    pub fn sin(self) -> f64 {
        Radians::from(self).0.sin()
    }

    /// Cosine of the angle
    pub fn cos(self) -> f64 {
        Radians::from(self).0.cos()
    }

    /// Wrap into the half-open range [0, 360)
    pub fn normalized(self) -> Self {
        let wrapped = self.0.rem_euclid(360.0);
        // rem_euclid can return exactly 360.0 for tiny negative inputs
        if wrapped >= 360.0 {
            Degrees(0.0)
        } else {
            Degrees(wrapped)
        }
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Degrees);
impl_arithmetic!(Radians);
impl_arithmetic!(Arcseconds);

/// Round a value to a fixed number of decimal places for display.
///
/// Values are returned unchanged when the scale factor or the scaled value
/// is not finite.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let Ok(exponent) = i32::try_from(decimals) else {
        return value;
    };
    let factor = 10f64.powi(exponent);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}
