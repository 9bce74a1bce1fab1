//! # Angle Codec
//!
//! Conversion between decimal degrees and the packed sexagesimal `DDD.MMSS`
//! notation used by total stations and field books.
//!
//! In `DDD.MMSS` the integer part is whole degrees, the first two fractional
//! digits are minutes and the next two are seconds. Anything after the fourth
//! fractional digit is read as decimal seconds, so `"123.45301"` is
//! 123° 45' 30.1". Short fractions are right-padded: `"90.3"` is 90° 30' 00".
//!
//! ## Example
//!
//! ```rust
//! use calc_core::angle::{decode, encode};
//!
//! let deg = decode("045.3000").unwrap();
//! assert!((deg - 45.5).abs() < 1e-12);
//!
//! assert_eq!(encode(45.5), "045.3000");
//! // Seconds that round up to 60 carry into minutes and degrees
//! assert_eq!(encode(44.999_999_9), "045.0000");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_finite, CalcError, CalcResult};
use crate::units::Degrees;

/// An angle split into whole degrees, minutes and rounded seconds.
///
/// Produced by [`Dms::from_degrees`], which always carries a rounded 60"
/// into the minutes and a 60' into the degrees, so `minutes` and `seconds`
/// are both guaranteed to be below 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dms {
    pub negative: bool,
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Dms {
    /// Split a decimal-degree value, rounding to the nearest whole second.
    pub fn from_degrees(value: f64) -> Self {
        let magnitude = value.abs();
        let mut degrees = magnitude.floor();
        let fraction = magnitude - degrees;
        let total_minutes = fraction * 60.0;
        let mut minutes = total_minutes.floor();
        let mut seconds = ((total_minutes - minutes) * 60.0).round();

        if seconds >= 60.0 {
            seconds = 0.0;
            minutes += 1.0;
        }
        if minutes >= 60.0 {
            minutes = 0.0;
            degrees += 1.0;
        }

        let negative = value < 0.0 && (degrees + minutes + seconds) > 0.0;
        Dms {
            negative,
            degrees: degrees as u32,
            minutes: minutes as u32,
            seconds: seconds as u32,
        }
    }

    /// Back to signed decimal degrees.
    pub fn to_degrees(self) -> f64 {
        let magnitude =
            self.degrees as f64 + self.minutes as f64 / 60.0 + self.seconds as f64 / 3600.0;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        write!(
            f,
            "{}{:03}.{:02}{:02}",
            sign, self.degrees, self.minutes, self.seconds
        )
    }
}

/// Decode a `DDD.MMSS` string into decimal degrees.
///
/// Errors are reported against a generic `angle` field; use
/// [`decode_field`] to name the offending input.
pub fn decode(text: &str) -> CalcResult<f64> {
    decode_field("angle", text)
}

/// Decode a `DDD.MMSS` string, reporting errors against `field`.
///
/// # Errors
///
/// * `CalcError::Numeric` - empty input, anything other than an optional
///   sign, digits and a single decimal point, or a degree count too large to
///   be represented
/// * `CalcError::Format` - minutes or seconds of 60 or more
pub fn decode_field(field: &str, text: &str) -> CalcResult<f64> {
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(CalcError::numeric(field, text));
    }

    let degrees: f64 = if int_part.is_empty() {
        0.0
    } else {
        int_part
            .parse()
            .map_err(|_| CalcError::numeric(field, text))?
    };
    if !degrees.is_finite() {
        return Err(CalcError::numeric(field, text));
    }

    let mut padded = frac_part.to_string();
    while padded.len() < 4 {
        padded.push('0');
    }

    // All ASCII digits from here on, so byte slicing is safe
    let minutes: f64 = padded[0..2]
        .parse()
        .map_err(|_| CalcError::numeric(field, text))?;
    let seconds_text = if padded.len() > 4 {
        format!("{}.{}", &padded[2..4], &padded[4..])
    } else {
        padded[2..4].to_string()
    };
    let seconds: f64 = seconds_text
        .parse()
        .map_err(|_| CalcError::numeric(field, text))?;

    if minutes >= 60.0 {
        return Err(CalcError::format(field, text, "Minutes must be below 60"));
    }
    if seconds >= 60.0 {
        return Err(CalcError::format(field, text, "Seconds must be below 60"));
    }

    let magnitude = ensure_finite(field, degrees + minutes / 60.0 + seconds / 3600.0)?;
    tracing::trace!(field, text, degrees = magnitude, "decoded sexagesimal angle");

    Ok(if negative { -magnitude } else { magnitude })
}

/// Encode decimal degrees as `DDD.MMSS`, rounded to the nearest second.
pub fn encode(value: f64) -> String {
    Dms::from_degrees(value).to_string()
}

/// Encode a direction as `DDD.MMSS` in [000.0000, 360.0000).
///
/// The value is wrapped first, and a reading that rounds up to a full circle
/// is written as `000.0000`.
pub fn encode_azimuth(value: f64) -> String {
    let mut dms = Dms::from_degrees(normalize_degrees(value));
    if dms.degrees >= 360 {
        dms.degrees -= 360;
    }
    dms.to_string()
}

/// Encode decimal degrees as `DDD.MMSS` followed by `second_decimals` digits of
/// decimal seconds, the form [`decode`] reads back without loss.
///
/// `encode_with_precision(x, 0)` is the same as [`encode`].
pub fn encode_with_precision(value: f64, second_decimals: u32) -> String {
    if second_decimals == 0 {
        return encode(value);
    }

    let scale = 10u64.pow(second_decimals);
    let magnitude = value.abs();
    let mut degrees = magnitude.floor() as u64;
    let total_minutes = (magnitude - magnitude.floor()) * 60.0;
    let mut minutes = total_minutes.floor() as u64;
    let mut scaled_seconds = ((total_minutes - total_minutes.floor()) * 60.0 * scale as f64).round() as u64;

    if scaled_seconds >= 60 * scale {
        scaled_seconds = 0;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes = 0;
        degrees += 1;
    }

    let is_zero = degrees == 0 && minutes == 0 && scaled_seconds == 0;
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    format!(
        "{}{:03}.{:02}{:02}{:0width$}",
        sign,
        degrees,
        minutes,
        scaled_seconds / scale,
        scaled_seconds % scale,
        width = second_decimals as usize
    )
}

/// Wrap any angle into [0, 360).
pub fn normalize_degrees(value: f64) -> f64 {
    Degrees(value).normalized().value()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCSECOND: f64 = 1.0 / 3600.0;

    #[test]
    fn test_decode_basic() {
        assert!((decode("123.4530").unwrap() - (123.0 + 45.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-12);
        assert!((decode("0.0001").unwrap() - ARCSECOND).abs() < 1e-12);
        assert_eq!(decode("90").unwrap(), 90.0);
    }

    #[test]
    fn test_decode_pads_short_fraction() {
        // "90.3" is 90° 30', not 90° 03'
        assert!((decode("90.3").unwrap() - 90.5).abs() < 1e-12);
        assert!((decode("10.015").unwrap() - (10.0 + 1.0 / 60.0 + 50.0 / 3600.0)).abs() < 1e-12);
    }

    #[test]
    fn test_decode_fractional_seconds() {
        let deg = decode("123.45301").unwrap();
        let expected = 123.0 + 45.0 / 60.0 + 30.1 / 3600.0;
        assert!((deg - expected).abs() < 1e-12);
    }

    #[test]
    fn test_decode_signed() {
        assert!((decode("-12.3000").unwrap() + 12.5).abs() < 1e-12);
        assert!((decode("+12.3000").unwrap() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_decode_rejects_sixty() {
        let err = decode_field("bearing", "12.6000").unwrap_err();
        assert!(matches!(err, CalcError::Format { ref field, .. } if field == "bearing"));
        assert!(matches!(decode("12.0060"), Err(CalcError::Format { .. })));
        assert!(decode("12.5959").is_ok());
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        for bad in ["", "  ", "abc", "12.3a", "1.2.3", "-", ".", "1e3", "NaN"] {
            assert!(
                matches!(decode(bad), Err(CalcError::Numeric { .. })),
                "expected numeric error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_encode_azimuth_stays_below_full_circle() {
        assert_eq!(encode(359.999_99), "360.0000");
        assert_eq!(encode_azimuth(359.999_99), "000.0000");
        assert_eq!(encode_azimuth(-0.5), "359.3000");
        assert_eq!(encode_azimuth(37.25), "037.1500");
    }

    #[test]
    fn test_decode_rejects_overflowing_degrees() {
        let huge = "9".repeat(400);
        let err = decode_field("bearing", &huge).unwrap_err();
        assert!(matches!(err, CalcError::Numeric { ref field, .. } if field == "bearing"));
        assert!(matches!(decode(&format!("-{}.3000", huge)), Err(CalcError::Numeric { .. })));
        // Large but representable is still an angle
        assert!(decode(&"9".repeat(300)).unwrap().is_finite());
    }

    #[test]
    fn test_encode_basic() {
        assert_eq!(encode(0.0), "000.0000");
        assert_eq!(encode(123.758333333), "123.4530");
        assert_eq!(encode(359.5), "359.3000");
        assert_eq!(encode(-12.5), "-012.3000");
    }

    #[test]
    fn test_encode_carries_seconds_and_minutes() {
        // Must never produce "044.6060"
        assert_eq!(encode(44.999_999_99), "045.0000");
        // 10° 29' 59.8" rounds to 10° 30' 00"
        assert_eq!(encode(10.0 + 29.0 / 60.0 + 59.8 / 3600.0), "010.3000");
    }

    #[test]
    fn test_round_trip_within_one_second() {
        let mut d = 0.0;
        while d < 360.0 {
            let back = decode(&encode(d)).unwrap();
            assert!((back - d).abs() <= ARCSECOND, "round trip of {} gave {}", d, back);
            d += 7.123_456_7;
        }
    }

    #[test]
    fn test_dms_components() {
        let dms = Dms::from_degrees(45.508333333);
        assert_eq!(dms.degrees, 45);
        assert_eq!(dms.minutes, 30);
        assert_eq!(dms.seconds, 30);
        assert!((dms.to_degrees() - 45.508333333).abs() < ARCSECOND);
    }

    #[test]
    fn test_encode_with_precision() {
        assert_eq!(encode_with_precision(123.758333333, 0), "123.4530");
        assert_eq!(encode_with_precision(123.0 + 45.0 / 60.0 + 30.125 / 3600.0, 3), "123.4530125");
        assert_eq!(encode_with_precision(44.999_999_999_9, 2), "045.000000");

        let value = 287.123_456_789;
        let back = decode(&encode_with_precision(value, 6)).unwrap();
        assert!((back - value).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(-30.0) - 330.0).abs() < 1e-12);
        assert!((normalize_degrees(390.0) - 30.0).abs() < 1e-12);
    }
}
