//! # Stakeout CLI Application
//!
//! Terminal front end for the surveying calculation engine.
//!
//! ```bash
//! calc_cli resection --input setup.json
//! cat setups.json | calc_cli resection --south --debug
//! calc_cli decode 123.4530
//! calc_cli encode 123.758333
//! calc_cli demo
//! ```
//!
//! Results go to stdout as JSON; logs go to stderr (`RUST_LOG` or `--verbose`).

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use calc_core::angle::{decode, encode, encode_with_precision, normalize_degrees};
use calc_core::calculations::resection::calculate;
use calc_core::geometry::{azimuth, GridPoint};
use calc_core::{
    calculate_batch, AzimuthReference, CalcError, CalcResult, KnownPoint, Observation,
    PrecisionReport, ResectionInput, ResectionResult, ResectionSettings, ResectionVariant,
};

#[derive(Parser, Debug)]
#[command(
    name = "calc_cli",
    version,
    about = "Stakeout - surveying calculators (free-station resection)"
)]
struct Args {
    /// Log intermediate pipeline stages to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a station from a JSON request (object or array of objects)
    Resection {
        /// Request file; reads stdin when omitted
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Count azimuths from south for every request
        #[arg(long)]
        south: bool,

        /// Attach intermediate azimuths and distances
        #[arg(long)]
        debug: bool,

        /// Print full-precision values instead of display rounding
        #[arg(long)]
        raw: bool,
    },

    /// Convert a DDD.MMSS angle to decimal degrees
    Decode {
        angle: String,
    },

    /// Convert decimal degrees to DDD.MMSS
    Encode {
        #[arg(allow_negative_numbers = true)]
        degrees: f64,

        /// Decimal places of seconds to keep
        #[arg(long, default_value_t = 0)]
        seconds_decimals: u32,
    },

    /// Run a worked two-point example and print a report
    Demo,
}

/// A request file holds either one setup or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestFile {
    Many(Vec<ResectionInput>),
    One(Box<ResectionInput>),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let outcome = match args.command {
        Command::Resection { input, south, debug, raw } => run_resection(input, south, debug, raw),
        Command::Decode { angle } => decode(&angle).map(|deg| {
            println!("{:.8}", deg);
            ExitCode::SUCCESS
        }),
        Command::Encode { degrees, seconds_decimals } => {
            println!("{}", encode_with_precision(degrees, seconds_decimals));
            Ok(ExitCode::SUCCESS)
        }
        Command::Demo => run_demo().map(|()| ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_error(e: &CalcError) {
    eprintln!("Error: {}", e);
    if let Ok(json) = serde_json::to_string_pretty(e) {
        eprintln!();
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
}

fn read_requests(path: Option<PathBuf>) -> CalcResult<Vec<ResectionInput>> {
    let text = match path {
        Some(p) => fs::read_to_string(&p).map_err(|e| {
            CalcError::invalid_input("input", p.display().to_string(), e.to_string())
        })?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CalcError::invalid_input("input", "<stdin>", e.to_string()))?;
            buf
        }
    };

    Ok(match serde_json::from_str::<RequestFile>(&text)? {
        RequestFile::Many(list) => list,
        RequestFile::One(one) => vec![*one],
    })
}

/// Apply the command-line overrides to every request.
fn apply_flags(requests: &mut [ResectionInput], south: bool, debug: bool) {
    for req in requests {
        if south {
            req.settings = req.settings.with_reference(AzimuthReference::South);
        }
        if debug {
            req.settings = req.settings.with_debug(true);
        }
    }
}

/// Run a batch and render one JSON value per request, failures included.
///
/// Returns the rendered output and the number of failed requests.
fn render_batch(requests: &[ResectionInput], raw: bool) -> CalcResult<(serde_json::Value, usize)> {
    let results = calculate_batch(requests);
    let mut failures = 0;
    let mut output = Vec::with_capacity(results.len());
    for (req, result) in requests.iter().zip(results) {
        match result {
            Ok(r) => {
                let shown = if raw { r } else { r.rounded(&req.settings) };
                output.push(serde_json::to_value(shown)?);
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(label = %req.label, code = e.error_code(), "resection failed");
                output.push(serde_json::json!({
                    "label": req.label,
                    "error": e,
                    "message": e.to_string(),
                }));
            }
        }
    }

    let printed = if output.len() == 1 {
        output.remove(0)
    } else {
        serde_json::Value::Array(output)
    };
    Ok((printed, failures))
}

fn run_resection(path: Option<PathBuf>, south: bool, debug: bool, raw: bool) -> CalcResult<ExitCode> {
    let mut requests = read_requests(path)?;
    apply_flags(&mut requests, south, debug);
    tracing::info!(count = requests.len(), "running resections");

    let (printed, failures) = render_batch(&requests, raw)?;
    println!("{}", serde_json::to_string_pretty(&printed)?);

    if failures > 0 {
        tracing::warn!(failures, total = requests.len(), "batch finished with failures");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Build observations from a known true station so the demo closes exactly.
fn demo_input() -> ResectionInput {
    let station = GridPoint::new(1050.0, 900.0);
    let station_h = 50.0;
    let instrument_height = 1.5;
    let orientation = 15.0;

    let points = vec![
        KnownPoint::new("A", 1000.0, 1000.0, 50.0),
        KnownPoint::new("B", 1100.0, 1000.0, 50.0),
    ];
    let observations = points
        .iter()
        .map(|p| {
            let hd = station.distance_to(p.grid());
            let rise = p.elevation + 1.5 - (station_h + instrument_height);
            Observation::new(
                p.id.clone(),
                encode(normalize_degrees(azimuth(station, p.grid()) - orientation)),
                encode(hd.atan2(rise).to_degrees()),
                hd.hypot(rise),
                1.5,
            )
        })
        .collect();

    ResectionInput {
        label: "Demo".to_string(),
        variant: ResectionVariant::TwoPointTwoDistance,
        instrument_height,
        points,
        observations,
        settings: ResectionSettings::default().with_debug(true),
    }
}

fn run_demo() -> CalcResult<()> {
    println!("Stakeout CLI - Free-Station Resection");
    println!("=====================================");
    println!();

    let input = demo_input();
    println!("Known points:");
    for p in &input.points {
        println!("  {:<4} E={:>10.3}  N={:>10.3}  H={:>8.3}", p.id, p.easting, p.northing, p.elevation);
    }
    println!();
    println!("Observations (hi = {:.3} m):", input.instrument_height);
    for o in &input.observations {
        println!(
            "  -> {:<4} Hz={}  V={}  SD={:.3}  ht={:.3}",
            o.point_ref,
            o.bearing,
            o.zenith_angle.as_deref().unwrap_or("-"),
            o.slope_distance.unwrap_or(0.0),
            o.target_height
        );
    }
    println!();

    let result = calculate(&input)?;
    print_report(&result.rounded(&input.settings));

    println!();
    println!("JSON Output (for API use):");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn print_report(result: &ResectionResult) {
    println!("═══════════════════════════════════════");
    println!("  RESECTION RESULTS ({})", result.label);
    println!("═══════════════════════════════════════");
    println!();
    println!("Station:");
    println!("  E = {:.3} m", result.station.easting);
    println!("  N = {:.3} m", result.station.northing);
    println!("  H = {:.3} m", result.station.elevation);
    println!();
    println!(
        "Orientation: {:.4}° ({})",
        result.orientation, result.orientation_dms
    );
    println!();
    println!("Precision:");
    let check = result.precision.angle_check();
    println!("  Angle check: {:.1}\"", check.arcseconds);
    match &result.precision {
        PrecisionReport::SingleDistance { horizontal_residual, .. } => {
            println!("  Horizontal residual: {:.3} m", horizontal_residual);
        }
        PrecisionReport::DualDistance { delta_e, delta_n, distances, .. } => {
            println!("  dE = {:.3} m  dN = {:.3} m", delta_e, delta_n);
            for d in distances {
                println!("  {:<4} HD {:.3} vs {:.3} (res {:.3})", d.point_id, d.measured, d.recomputed, d.residual);
            }
        }
        PrecisionReport::ThreePoint { max_delta_e, max_delta_n, max_delta_h, distances, .. } => {
            println!(
                "  max dE = {:.3} m  max dN = {:.3} m  max dH = {:.3} m",
                max_delta_e, max_delta_n, max_delta_h
            );
            for d in distances {
                println!("  {:<4} HD {:.3} vs {:.3} (res {:.3})", d.point_id, d.measured, d.recomputed, d.residual);
            }
        }
    }
    println!("═══════════════════════════════════════");
}
