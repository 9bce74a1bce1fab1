//! # Surveying Calculations
//!
//! This module contains the surveying calculation types. Each calculation
//! follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(input) -> Result<*Result, CalcError>` - Pure calculation function
//!
//! Calculations hold no state between calls, so any number of them can run
//! at once on separate threads.
//!
//! ## Available Calculations
//!
//! - [`resection`] - Free-station resection from two or three known points

pub mod resection;

// Re-export commonly used types
pub use resection::{ResectionInput, ResectionResult, ResectionVariant};
