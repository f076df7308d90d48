use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use mocap_calib::CalibrationCfg;
use mocap_dataset_reader::{motive_reader::MotiveReader, param_file::ParamFile};
use mocap_sensor::CalibrationParams;

/// Derives the mocap-to-world transform from a capture of a stationary marker body.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Rigid body mounted on the robot tool-center-point
    #[arg(short, long, default_value = "Robot")]
    body: String,

    /// Parameter file to read assumptions from and write results to
    /// (defaults to params.json next to the capture)
    #[arg(short, long)]
    param: Option<PathBuf>,

    /// Fail instead of assuming defaults for missing calibration inputs
    #[arg(long)]
    strict: bool,

    /// Motive CSV capture
    csv: PathBuf,
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn param_path(args: &Args) -> PathBuf {
    args.param
        .clone()
        .unwrap_or_else(|| args.csv.with_file_name("params.json"))
}

fn run(args: &Args, param_path: &Path) -> Result<CalibrationParams> {
    let previous = ParamFile::load(param_path)
        .with_context(|| format!("reading parameters from {}", param_path.display()))?
        .unwrap_or_else(|| {
            log::warn!("no parameter file at {}", param_path.display());
            ParamFile::default()
        });

    let calibrator = CalibrationCfg::new(args.body.as_str())
        .calibration_tcp(previous.calibration_tcp)
        .marker_frame_ypr(previous.marker_frame_ypr)
        .strict(args.strict)
        .finalize()?;

    let capture = MotiveReader::new(&args.csv)
        .load_capture()
        .with_context(|| format!("loading capture {}", args.csv.display()))?;
    let params = calibrator.calibrate(&capture)?;

    ParamFile::from(&params)
        .save(param_path)
        .with_context(|| format!("writing parameters to {}", param_path.display()))?;
    Ok(params)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let param_path = param_path(&args);
    let params = run(&args, &param_path)?;
    println!("mocap_to_world:{}", params.mocap_to_world);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mocap_core::geometry::yaw_pitch_roll;
    use mocap_sensor::TcpPose;
    use std::fmt::Write as _;

    fn write_capture(dir: &Path, frames: usize) -> PathBuf {
        let mut text = String::from(
            "Format Version,1.23,Take Name,calib,Rotation Type,Quaternion,Length Units,Millimeters\n\
             ,Type,Rigid Body,Rigid Body,Rigid Body,Rigid Body,Rigid Body,Rigid Body,Rigid Body\n\
             ,Name,Robot,Robot,Robot,Robot,Robot,Robot,Robot\n\
             ,ID,1,1,1,1,1,1,1\n\
             ,,Rotation,Rotation,Rotation,Rotation,Position,Position,Position\n\
             Frame,Time (Seconds),X,Y,Z,W,X,Y,Z\n",
        );
        for i in 0..frames {
            writeln!(text, "{i},{},0,0,0,1,0,0,0", i as f64 / 120.0).unwrap();
        }
        let path = dir.join("calib.csv");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn args(csv: PathBuf, strict: bool) -> Args {
        Args {
            verbose: false,
            body: "Robot".to_string(),
            param: None,
            strict,
            csv,
        }
    }

    #[test]
    fn test_defaults_then_reuse_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(write_capture(dir.path(), 24), false);
        let param_path = param_path(&args);
        assert_eq!(param_path, dir.path().join("params.json"));

        let params = run(&args, &param_path).unwrap();
        let expected =
            TcpPose::default().to_transform().unwrap() * yaw_pitch_roll(180.0, 0.0, 90.0);
        assert_relative_eq!(params.mocap_to_world, expected, epsilon = 1e-9);

        let stored = ParamFile::load(&param_path).unwrap().unwrap();
        assert_eq!(stored.calibration_tcp, Some(TcpPose::default()));

        // a second run reuses the stored inputs and keeps the old file
        let strict = Args { strict: true, ..args };
        let again = run(&strict, &param_path).unwrap();
        assert_relative_eq!(again.mocap_to_world, expected, epsilon = 1e-9);
        assert!(dir.path().join("params.json.bak").exists());
    }

    #[test]
    fn test_strict_without_parameters_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(write_capture(dir.path(), 3), true);
        assert!(run(&args, &param_path(&args)).is_err());
        assert!(!dir.path().join("params.json").exists());
    }

    #[test]
    fn test_missing_body_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            body: "Base".to_string(),
            ..args(write_capture(dir.path(), 3), false)
        };
        let err = run(&args, &param_path(&args)).unwrap_err();
        assert!(err.to_string().contains("Base"));
    }
}
