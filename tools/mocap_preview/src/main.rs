use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use mocap_core::{
    geometry::{rotation_of, translation_of},
    trajectory::{Trajectory, TrajectorySample},
    HomogeneousTransform, PointCoordinates, Real, MILLIMETERS_PER_METER,
};
use mocap_dataset_reader::trajectory_file::TrajectoryFile;

/// Replays an extracted trajectory in the rerun viewer.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Number of preceding samples drawn as a trail
    #[arg(long, default_value_t = 60)]
    trail: usize,

    /// Length of the drawn pose axes in millimetres
    #[arg(long, default_value_t = 100.0)]
    axis_length: Real,

    /// Print the pose at this time (seconds) instead of opening the viewer
    #[arg(long)]
    at: Option<Real>,

    /// Write the recording to an .rrd file instead of spawning the viewer
    #[arg(long)]
    save: Option<PathBuf>,

    /// Trajectory file produced by mocap_extract
    trajectory: PathBuf,
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

// the viewer works in metres, trajectories are in millimetres
fn to_meters(point: &PointCoordinates) -> [f32; 3] {
    let p = point / MILLIMETERS_PER_METER;
    [p.x as f32, p.y as f32, p.z as f32]
}

/// Origins and vectors of the x, y, z axis arrows of a pose, in metres.
fn axis_arrows(
    transform: &HomogeneousTransform,
    axis_length: Real,
) -> ([[f32; 3]; 3], [[f32; 3]; 3]) {
    let origin = to_meters(&translation_of(transform));
    let rotation = rotation_of(transform);
    let vectors = [0, 1, 2].map(|axis| to_meters(&(rotation.column(axis) * axis_length)));
    ([origin; 3], vectors)
}

fn trail_points(window: &[TrajectorySample]) -> Vec<[f32; 3]> {
    window
        .iter()
        .map(|s| to_meters(&translation_of(&s.transform)))
        .collect()
}

fn load_trajectory(path: &Path) -> Result<(String, Trajectory)> {
    let file = TrajectoryFile::load(path)
        .with_context(|| format!("reading trajectory {}", path.display()))?;
    let trajectory = file.to_trajectory(path)?;
    log::info!(
        "'{}': {} samples over {:.2} s",
        file.body,
        trajectory.samples().len(),
        trajectory.duration()
    );
    Ok((file.body, trajectory))
}

struct TrajectoryPreview<'a> {
    rec: &'a rerun::RecordingStream,
    entity: String,
    trail: usize,
    axis_length: Real,
}

impl TrajectoryPreview<'_> {
    fn log_world(&self) -> Result<()> {
        self.rec
            .log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Z_UP)?;
        Ok(())
    }

    /// Logs the pose at `time` and the trail leading up to it.
    fn log_at(&self, trajectory: &Trajectory, time: Real) -> Result<()> {
        let Some(window) = trajectory.window(time, self.trail) else {
            return Ok(());
        };
        let Some(current) = window.last() else {
            return Ok(());
        };
        self.rec.set_time_seconds("time", current.time);

        let (origins, vectors) = axis_arrows(&current.transform, self.axis_length);
        self.rec.log(
            format!("world/{}/pose", self.entity),
            &rerun::Arrows3D::from_vectors(vectors)
                .with_origins(origins)
                .with_colors([
                    rerun::Color::from_rgb(230, 40, 40),
                    rerun::Color::from_rgb(40, 200, 40),
                    rerun::Color::from_rgb(40, 80, 230),
                ]),
        )?;
        self.rec.log(
            format!("world/{}/trail", self.entity),
            &rerun::LineStrips3D::new([trail_points(window)])
                .with_colors([rerun::Color::from_rgb(180, 180, 180)])
                .with_radii([0.002f32]),
        )?;
        Ok(())
    }
}

fn print_pose(trajectory: &Trajectory, time: Real) {
    match trajectory.lookup(time) {
        Some(index) => {
            let sample = &trajectory.samples()[index];
            println!("sample {index} at {:.4} s:{}", sample.time, sample.transform);
        }
        None => println!("trajectory is empty"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let (body, trajectory) = load_trajectory(&args.trajectory)?;
    if let Some(time) = args.at {
        print_pose(&trajectory, time);
        return Ok(());
    }

    let builder = rerun::RecordingStreamBuilder::new("mocap_preview");
    let rec = match &args.save {
        Some(path) => builder.save(path)?,
        None => builder.spawn()?,
    };

    let preview = TrajectoryPreview {
        rec: &rec,
        entity: body,
        trail: args.trail,
        axis_length: args.axis_length,
    };
    preview.log_world()?;
    for sample in trajectory.samples() {
        preview.log_at(&trajectory, sample.time)?;
    }
    rec.flush_blocking();
    Ok(())
}
