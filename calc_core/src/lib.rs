//! # calc_core - Surveying Calculation Engine
//!
//! `calc_core` is the computational heart of Stakeout. Its centrepiece is the
//! free-station resection: from angle and distance observations to two or
//! three known control points it computes the instrument's coordinates, the
//! orientation correction for the horizontal circle, and closing diagnostics.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All request and result types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **No partial results**: Any validation or geometry failure aborts the request
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::angle::{decode, encode};
//! use calc_core::geometry::{azimuth, GridPoint};
//!
//! let az = azimuth(GridPoint::new(0.0, 0.0), GridPoint::new(10.0, 10.0));
//! assert_eq!(encode(az), "045.0000");
//! assert!((decode("045.0000").unwrap() - 45.0).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Calculation types (resection)
//! - [`angle`] - `DDD.MMSS` sexagesimal codec
//! - [`geometry`] - Grid points and azimuths
//! - [`settings`] - Per-request configuration
//! - [`units`] - Type-safe angle unit wrappers
//! - [`errors`] - Structured error types

pub mod angle;
pub mod calculations;
pub mod errors;
pub mod geometry;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::resection::{
    calculate_batch, KnownPoint, Observation, PrecisionReport, StationCoordinates,
};
pub use calculations::{ResectionInput, ResectionResult, ResectionVariant};
pub use errors::{CalcError, CalcResult};
pub use geometry::{AzimuthReference, GridPoint};
pub use settings::ResectionSettings;
