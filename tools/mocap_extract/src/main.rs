use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use mocap_calib::ExtractorCfg;
use mocap_core::MocapError;
use mocap_dataset_reader::{
    motive_reader::MotiveReader, param_file::ParamFile, trajectory_file::TrajectoryFile,
};

/// Resamples a tracked body from a capture and writes its world-frame trajectory.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Rigid body to extract
    #[arg(short, long, default_value = "Tool")]
    body: String,

    /// Keep every n-th sample
    #[arg(short, long, default_value_t = 12)]
    rate: usize,

    /// Trajectory file to write (defaults to <csv stem>_<body>.json next to the capture)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parameter file produced by mocap_calibrate
    param: PathBuf,

    /// Motive CSV capture
    csv: PathBuf,
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn output_path(args: &Args) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        let stem = args
            .csv
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "trajectory".to_string());
        args.csv.with_file_name(format!("{stem}_{}.json", args.body))
    })
}

fn run(args: &Args, output: &Path) -> Result<usize> {
    let params = ParamFile::load(&args.param)
        .with_context(|| format!("reading parameters from {}", args.param.display()))?
        .ok_or_else(|| MocapError::io(&args.param, std::io::ErrorKind::NotFound.into()))?;
    let mocap_to_world = params.require_mocap_to_world()?;

    let extractor = ExtractorCfg::new(args.body.as_str(), args.rate).finalize(mocap_to_world)?;
    let capture = MotiveReader::new(&args.csv)
        .load_capture()
        .with_context(|| format!("loading capture {}", args.csv.display()))?;
    let trajectory = extractor.extract(&capture)?;

    TrajectoryFile::new(
        extractor.body_name(),
        Some(&args.csv),
        extractor.rate(),
        &trajectory,
    )
    .save(output)
    .with_context(|| format!("writing trajectory to {}", output.display()))?;
    Ok(trajectory.samples().len())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let output = output_path(&args);
    let count = run(&args, &output)?;
    log::info!("{count} samples written to {}", output.display());
    Ok(())
}
