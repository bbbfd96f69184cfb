use std::path::PathBuf;

use anyhow::{bail, ensure, Result};
use clap::Parser;

use lenscal_pipeline::run_distortion_calibration;

/// Estimate lens distortion from checkerboard detections.
///
/// Corners are grouped into line hypotheses and the distortion parameters
/// are fitted from the collinearity constraint alone; board sizes, square
/// sizes and poses are not required.
#[derive(Debug, Parser)]
#[command(author, version, about = "Lens distortion calibration from checkerboards")]
struct Args {
    /// Input scene-data JSON file.
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Directory containing checkers_<viewId>.json detector files.
    #[arg(long)]
    checkerboards: PathBuf,

    /// Output scene-data JSON file.
    #[arg(short = 'o', long = "outSfMData")]
    out_sfm_data: PathBuf,

    /// Verbosity level (fatal, error, warning, info, debug, trace).
    #[arg(long = "verboseLevel", default_value = "info")]
    verbose_level: String,
}

fn log_spec(level: &str) -> Result<&'static str> {
    Ok(match level {
        "fatal" | "error" => "error",
        "warning" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        other => bail!("unknown verbosity level '{other}'"),
    })
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let _logger = flexi_logger::Logger::try_with_str(log_spec(&args.verbose_level)?)?.start()?;

    let summary =
        run_distortion_calibration(&args.input, &args.checkerboards, &args.out_sfm_data)?;
    log::info!(
        "Calibrated {} of {} pinhole intrinsics",
        summary.calibrated,
        summary.pinhole_intrinsics
    );
    ensure!(summary.succeeded(), "calibration produced no usable result");
    Ok(())
}
