//! # Resection Settings
//!
//! Per-request configuration. Settings travel with the request rather than
//! living in global state, so concurrent requests can use different choices.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "azimuth_reference": "North",
//!   "include_debug": false,
//!   "coordinate_decimals": 3,
//!   "orientation_decimals": 4
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::geometry::AzimuthReference;

/// Most decimal places an f64 coordinate can meaningfully be rounded to
pub const MAX_DISPLAY_DECIMALS: u32 = 15;

/// Options controlling one resection computation and its display output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResectionSettings {
    /// Zero direction for every azimuth in the computation
    pub azimuth_reference: AzimuthReference,

    /// Attach intermediate azimuths and distances to the result
    pub include_debug: bool,

    /// Decimal places kept for coordinates and residuals when rounding for display
    pub coordinate_decimals: u32,

    /// Decimal places kept for the orientation when rounding for display
    pub orientation_decimals: u32,
}

impl Default for ResectionSettings {
    fn default() -> Self {
        ResectionSettings {
            azimuth_reference: AzimuthReference::North,
            include_debug: false,
            coordinate_decimals: 3,
            orientation_decimals: 4,
        }
    }
}

impl ResectionSettings {
    /// Same settings with a different azimuth reference
    pub fn with_reference(mut self, reference: AzimuthReference) -> Self {
        self.azimuth_reference = reference;
        self
    }

    /// Same settings with the debug block switched on or off
    pub fn with_debug(mut self, include_debug: bool) -> Self {
        self.include_debug = include_debug;
        self
    }

    /// Check the display precision fields.
    ///
    /// # Errors
    ///
    /// * `CalcError::InvalidInput` - a decimals field above [`MAX_DISPLAY_DECIMALS`]
    pub fn validate(&self) -> CalcResult<()> {
        for (field, decimals) in [
            ("settings.coordinate_decimals", self.coordinate_decimals),
            ("settings.orientation_decimals", self.orientation_decimals),
        ] {
            if decimals > MAX_DISPLAY_DECIMALS {
                return Err(CalcError::invalid_input(
                    field,
                    decimals.to_string(),
                    format!("At most {} decimal places are supported", MAX_DISPLAY_DECIMALS),
                ));
            }
        }
        Ok(())
    }
}
