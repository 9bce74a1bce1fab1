//! # Free-Station Resection
//!
//! Computes the position of a total station set up over an unknown point from
//! observations to two or three known control points.
//!
//! ## Pipeline
//!
//! One synchronous pass, with every stage a pure function of the previous one:
//!
//! 1. Validate the request and decode the `DDD.MMSS` angles
//! 2. Reduce slope distances to horizontal distances and height differences
//! 3. Solve the orientation correction from the first observation
//! 4. Back-project each distance observation into a candidate station
//! 5. Fold the candidates into an inverse-distance weighted station
//! 6. Recompute azimuths/distances from that station and report residuals
//!
//! ## Variants
//!
//! | Variant | Observations | With distance |
//! |---------|--------------|---------------|
//! | `TwoPointOneDistance` | 2 | first only |
//! | `TwoPointTwoDistance` | 2 | both |
//! | `ThreePoint` | 3 | all three |
//!
//! All three run through the same routine; the variant only decides how many
//! observations feed the weighted station and which precision block is built.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::resection::{
//!     calculate, KnownPoint, Observation, ResectionInput, ResectionVariant,
//! };
//! use calc_core::ResectionSettings;
//!
//! let input = ResectionInput {
//!     label: "FS-1".to_string(),
//!     variant: ResectionVariant::TwoPointTwoDistance,
//!     instrument_height: 1.5,
//!     points: vec![
//!         KnownPoint::new("A", 1000.0, 1000.0, 50.0),
//!         KnownPoint::new("B", 1100.0, 1000.0, 50.0),
//!     ],
//!     observations: vec![
//!         Observation::new("A", "333.2606", "90.0000", 111.803, 1.5),
//!         Observation::new("B", "026.3354", "90.0000", 111.803, 1.5),
//!     ],
//!     settings: ResectionSettings::default(),
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert!((result.station.easting - 1050.0).abs() < 0.01);
//! assert!((result.station.northing - 900.0).abs() < 0.01);
//! ```

pub mod elevation;
pub mod estimate;
pub mod orientation;
pub mod precision;

use serde::{Deserialize, Serialize};

use crate::angle::{decode_field, encode_azimuth, normalize_degrees};
use crate::errors::{ensure_finite, CalcError, CalcResult};
use crate::geometry::{AzimuthReference, GridPoint};
use crate::settings::ResectionSettings;
use crate::units::round_to;

pub use estimate::{PerPointEstimate, ReducedDistance};
pub use orientation::OrientationSolution;
pub use precision::{AngleCheck, BackSight, DistanceCheck, PrecisionReport};

/// A control point with known coordinates, in meters.
///
/// ## JSON Example
///
/// ```json
/// { "id": "CP-101", "easting": 1000.0, "northing": 1000.0, "elevation": 52.314 }
/// ```
///
/// The short field names `E`, `N` and `H` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownPoint {
    /// Point identifier referenced by observations
    pub id: String,

    #[serde(alias = "E")]
    pub easting: f64,

    #[serde(alias = "N")]
    pub northing: f64,

    #[serde(alias = "H")]
    pub elevation: f64,
}

impl KnownPoint {
    pub fn new(id: impl Into<String>, easting: f64, northing: f64, elevation: f64) -> Self {
        KnownPoint {
            id: id.into(),
            easting,
            northing,
            elevation,
        }
    }

    /// Plan position of the point
    pub fn grid(&self) -> GridPoint {
        GridPoint::new(self.easting, self.northing)
    }
}

/// One pointing of the instrument at a known point.
///
/// Angles are `DDD.MMSS` strings exactly as read off the instrument.
/// `zenith_angle` and `slope_distance` may be omitted on observations that
/// the chosen variant uses for direction only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Id of the [`KnownPoint`] this observation targets
    pub point_ref: String,

    /// Raw horizontal circle reading (`DDD.MMSS`)
    pub bearing: String,

    /// Vertical angle from the zenith (`DDD.MMSS`, 90° = level)
    #[serde(default)]
    pub zenith_angle: Option<String>,

    /// Slope distance along the line of sight in meters
    #[serde(default)]
    pub slope_distance: Option<f64>,

    /// Height of the prism/target above the known point in meters
    #[serde(default)]
    pub target_height: f64,
}

impl Observation {
    /// Observation with a measured distance
    pub fn new(
        point_ref: impl Into<String>,
        bearing: impl Into<String>,
        zenith_angle: impl Into<String>,
        slope_distance: f64,
        target_height: f64,
    ) -> Self {
        Observation {
            point_ref: point_ref.into(),
            bearing: bearing.into(),
            zenith_angle: Some(zenith_angle.into()),
            slope_distance: Some(slope_distance),
            target_height,
        }
    }

    /// Direction-only observation
    pub fn direction(point_ref: impl Into<String>, bearing: impl Into<String>) -> Self {
        Observation {
            point_ref: point_ref.into(),
            bearing: bearing.into(),
            zenith_angle: None,
            slope_distance: None,
            target_height: 0.0,
        }
    }

    fn has_distance(&self) -> bool {
        self.slope_distance.is_some() && self.zenith_angle.is_some()
    }
}

/// Which resection layout the request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResectionVariant {
    /// Two known points, distance measured to the first only
    TwoPointOneDistance,
    /// Two known points, distances to both
    TwoPointTwoDistance,
    /// Three known points, distances to all
    ThreePoint,
}

impl ResectionVariant {
    /// Exact number of observations the variant expects
    pub fn observation_count(self) -> usize {
        match self {
            ResectionVariant::TwoPointOneDistance | ResectionVariant::TwoPointTwoDistance => 2,
            ResectionVariant::ThreePoint => 3,
        }
    }

    /// Number of leading observations that must carry a distance
    pub fn distance_count(self) -> usize {
        match self {
            ResectionVariant::TwoPointOneDistance => 1,
            ResectionVariant::TwoPointTwoDistance => 2,
            ResectionVariant::ThreePoint => 3,
        }
    }

    /// Propose a variant from the shape of the observations.
    pub fn infer(observations: &[Observation]) -> CalcResult<Self> {
        match observations.len() {
            2 if observations.iter().all(Observation::has_distance) => {
                Ok(ResectionVariant::TwoPointTwoDistance)
            }
            2 => Ok(ResectionVariant::TwoPointOneDistance),
            3 => Ok(ResectionVariant::ThreePoint),
            n => Err(CalcError::invalid_input(
                "observations",
                n.to_string(),
                "A resection needs exactly 2 or 3 observations",
            )),
        }
    }
}

/// Complete resection request.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "FS-1",
///   "variant": "TwoPointTwoDistance",
///   "instrument_height": 1.55,
///   "points": [
///     { "id": "A", "E": 1000.0, "N": 1000.0, "H": 50.0 },
///     { "id": "B", "E": 1100.0, "N": 1000.0, "H": 50.0 }
///   ],
///   "observations": [
///     { "point_ref": "A", "bearing": "333.2606", "zenith_angle": "90.0000",
///       "slope_distance": 111.803, "target_height": 1.6 },
///     { "point_ref": "B", "bearing": "026.3354", "zenith_angle": "90.0000",
///       "slope_distance": 111.803, "target_height": 1.6 }
///   ],
///   "settings": { "azimuth_reference": "North" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResectionInput {
    /// User label for this setup (e.g., "FS-1")
    #[serde(default)]
    pub label: String,

    pub variant: ResectionVariant,

    /// Height of the instrument's trunnion axis above the station mark
    pub instrument_height: f64,

    pub points: Vec<KnownPoint>,

    /// Ordered observations; the first one is the orientation reference
    pub observations: Vec<Observation>,

    #[serde(default)]
    pub settings: ResectionSettings,
}

/// A validated observation with its angles decoded and distance reduced.
#[derive(Debug, Clone)]
pub struct Sighting<'a> {
    pub index: usize,
    pub point: &'a KnownPoint,
    /// Decoded horizontal circle reading in decimal degrees
    pub bearing: f64,
    pub target_height: f64,
    /// Present only where the variant uses this observation's distance
    pub reduced: Option<ReducedDistance>,
}

impl ResectionInput {
    /// Validate the request and decode it into sightings.
    ///
    /// # Errors
    ///
    /// * `CalcError::InvalidInput` - wrong observation count, unknown or repeated point,
    ///   display decimals out of range
    /// * `CalcError::MissingField` - a distance observation without zenith/slope
    /// * `CalcError::Numeric` - a non-finite number or non-numeric angle
    /// * `CalcError::Format` - minutes/seconds of 60 or more
    /// * `CalcError::DegenerateGeometry` - slope distance or horizontal distance not positive
    pub fn prepare(&self) -> CalcResult<Vec<Sighting<'_>>> {
        self.settings.validate()?;
        ensure_finite("instrument_height", self.instrument_height)?;

        let expected = self.variant.observation_count();
        if self.observations.len() != expected {
            return Err(CalcError::invalid_input(
                "observations",
                self.observations.len().to_string(),
                format!("{:?} requires exactly {} observations", self.variant, expected),
            ));
        }

        for (i, point) in self.points.iter().enumerate() {
            ensure_finite(&format!("points[{}].easting", i), point.easting)?;
            ensure_finite(&format!("points[{}].northing", i), point.northing)?;
            ensure_finite(&format!("points[{}].elevation", i), point.elevation)?;
            if self.points[..i].iter().any(|p| p.id == point.id) {
                return Err(CalcError::invalid_input(
                    format!("points[{}].id", i),
                    point.id.clone(),
                    "Duplicate known point id",
                ));
            }
        }

        let mut sightings = Vec::with_capacity(expected);
        for (i, obs) in self.observations.iter().enumerate() {
            let point = self
                .points
                .iter()
                .find(|p| p.id == obs.point_ref)
                .ok_or_else(|| {
                    CalcError::invalid_input(
                        format!("observations[{}].point_ref", i),
                        obs.point_ref.clone(),
                        "No known point with this id",
                    )
                })?;
            if self.observations[..i].iter().any(|o| o.point_ref == obs.point_ref) {
                return Err(CalcError::invalid_input(
                    format!("observations[{}].point_ref", i),
                    obs.point_ref.clone(),
                    "Each known point may be observed only once",
                ));
            }

            let bearing = decode_field(&format!("observations[{}].bearing", i), &obs.bearing)?;
            let target_height =
                ensure_finite(&format!("observations[{}].target_height", i), obs.target_height)?;

            let reduced = if i < self.variant.distance_count() {
                Some(reduce_observation(i, obs)?)
            } else {
                None
            };

            sightings.push(Sighting {
                index: i,
                point,
                bearing,
                target_height,
                reduced,
            });
        }

        Ok(sightings)
    }
}

fn reduce_observation(i: usize, obs: &Observation) -> CalcResult<ReducedDistance> {
    let zenith_field = format!("observations[{}].zenith_angle", i);
    let slope_field = format!("observations[{}].slope_distance", i);

    let zenith_text = obs
        .zenith_angle
        .as_deref()
        .ok_or_else(|| CalcError::missing_field(zenith_field.clone()))?;
    let slope = obs
        .slope_distance
        .ok_or_else(|| CalcError::missing_field(slope_field.clone()))?;

    let zenith = decode_field(&zenith_field, zenith_text)?;
    let slope = ensure_finite(&slope_field, slope)?;
    estimate::reduce_slope(&slope_field, slope, zenith)
}

/// Final station coordinates in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationCoordinates {
    pub easting: f64,
    pub northing: f64,
    pub elevation: f64,
}

impl StationCoordinates {
    pub fn grid(&self) -> GridPoint {
        GridPoint::new(self.easting, self.northing)
    }
}

/// Intermediate values of one observation, for checking a computation by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationTrace {
    pub point_id: String,
    /// Decoded circle reading (decimal degrees)
    pub bearing: f64,
    /// Reading plus orientation, in the request's azimuth reference
    pub corrected_azimuth: f64,
    /// Candidate station from this observation, if it carried a distance
    pub estimate: Option<PerPointEstimate>,
    /// Azimuth and distance recomputed from the final station
    pub back_sight: BackSight,
}

/// Optional block of intermediate azimuths and distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugBlock {
    pub orientation: OrientationSolution,
    pub observations: Vec<ObservationTrace>,
}

/// Results from a resection.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "FS-1",
///   "variant": "TwoPointTwoDistance",
///   "station": { "easting": 1050.0, "northing": 900.0, "elevation": 50.0 },
///   "orientation": 12.5,
///   "orientation_dms": "012.3000",
///   "azimuth_reference": "North",
///   "precision": {
///     "kind": "DualDistance",
///     "delta_e": 0.0,
///     "delta_n": 0.0,
///     "distances": [],
///     "angle_check": { "degrees": 0.0, "arcseconds": 0.0 }
///   },
///   "debug": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResectionResult {
    pub label: String,
    pub variant: ResectionVariant,
    pub station: StationCoordinates,
    /// Orientation correction in decimal degrees, [0, 360)
    pub orientation: f64,
    /// Orientation correction as `DDD.MMSS`
    pub orientation_dms: String,
    pub azimuth_reference: AzimuthReference,
    pub precision: PrecisionReport,
    #[serde(default)]
    pub debug: Option<DebugBlock>,
}

impl ResectionResult {
    /// Copy rounded for display: coordinates and residuals to
    /// `coordinate_decimals`, orientation to `orientation_decimals`.
    ///
    /// The debug block is left at full precision.
    pub fn rounded(&self, settings: &ResectionSettings) -> Self {
        let c = settings.coordinate_decimals;
        ResectionResult {
            label: self.label.clone(),
            variant: self.variant,
            station: StationCoordinates {
                easting: round_to(self.station.easting, c),
                northing: round_to(self.station.northing, c),
                elevation: round_to(self.station.elevation, c),
            },
            orientation: normalize_degrees(round_to(self.orientation, settings.orientation_decimals)),
            orientation_dms: self.orientation_dms.clone(),
            azimuth_reference: self.azimuth_reference,
            precision: self.precision.rounded(settings),
            debug: self.debug.clone(),
        }
    }
}

/// Run a resection.
///
/// # Arguments
///
/// * `input` - Known points, observations, instrument height and settings
///
/// # Returns
///
/// * `Ok(ResectionResult)` - Station, orientation and precision block, at full precision
/// * `Err(CalcError)` - The first validation or geometry failure; nothing partial
pub fn calculate(input: &ResectionInput) -> CalcResult<ResectionResult> {
    let _span = tracing::debug_span!("resection", label = %input.label, variant = ?input.variant).entered();

    let sightings = input.prepare()?;
    let reference = input.settings.azimuth_reference;

    let solution = orientation::solve(input.variant, &sightings, reference)?;
    tracing::debug!(
        orientation = solution.orientation,
        guess_e = solution.station_guess.easting,
        guess_n = solution.station_guess.northing,
        "orientation solved"
    );

    let estimates = sightings
        .iter()
        .filter(|s| s.reduced.is_some())
        .map(|s| estimate::estimate(s, solution.orientation, reference, input.instrument_height))
        .collect::<CalcResult<Vec<_>>>()?;

    let station = estimate::aggregate(&estimates)?;
    tracing::debug!(
        easting = station.easting,
        northing = station.northing,
        elevation = station.elevation,
        candidates = estimates.len(),
        "weighted station"
    );

    let back_sights = precision::back_sights(&sightings, &station, reference);
    let precision = precision::analyze(input.variant, &sightings, &estimates, &back_sights, &station);

    let debug = input.settings.include_debug.then(|| DebugBlock {
        orientation: solution.clone(),
        observations: sightings
            .iter()
            .zip(&back_sights)
            .map(|(s, back)| ObservationTrace {
                point_id: s.point.id.clone(),
                bearing: s.bearing,
                corrected_azimuth: estimate::corrected_azimuth(s.bearing, solution.orientation),
                estimate: estimates.iter().find(|e| e.point_id == s.point.id).cloned(),
                back_sight: back.clone(),
            })
            .collect(),
    });

    Ok(ResectionResult {
        label: input.label.clone(),
        variant: input.variant,
        station,
        orientation: solution.orientation,
        orientation_dms: encode_azimuth(solution.orientation),
        azimuth_reference: reference,
        precision,
        debug,
    })
}

/// Run several independent resections; one result per request, in order.
pub fn calculate_batch(inputs: &[ResectionInput]) -> Vec<CalcResult<ResectionResult>> {
    inputs.iter().map(calculate).collect()
}
