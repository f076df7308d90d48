use std::path::Path;

use mocap_core::{
    trajectory::{Trajectory, TrajectorySample},
    MocapError, Real, Result,
};
use serde::{Deserialize, Serialize};

use crate::{
    atomic_write::write_atomically,
    param_file::{matrix_to_rows, rows_to_matrix, MatrixRows},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFileSample {
    pub time: Real,
    pub transform: MatrixRows,
}

/// World-frame trajectory of one body, as written by the extractor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFile {
    pub body: String,
    #[serde(default)]
    pub source: Option<String>,
    pub rate: usize,
    pub samples: Vec<TrajectoryFileSample>,
}

impl TrajectoryFile {
    pub fn new(body: &str, source: Option<&Path>, rate: usize, trajectory: &Trajectory) -> Self {
        TrajectoryFile {
            body: body.to_string(),
            source: source.map(|p| p.display().to_string()),
            rate,
            samples: trajectory
                .samples()
                .iter()
                .map(|s| TrajectoryFileSample {
                    time: s.time,
                    transform: matrix_to_rows(&s.transform),
                })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<TrajectoryFile> {
        let data = std::fs::read_to_string(path).map_err(|e| MocapError::io(path, e))?;
        serde_json::from_str(&data)
            .map_err(|e| MocapError::malformed(path, format!("invalid trajectory JSON: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomically(path, |writer| {
            serde_json::to_writer(&mut *writer, self)?;
            writer.write_all(b"\n")
        })?;
        log::info!(
            "wrote {} samples of '{}' to {}",
            self.samples.len(),
            self.body,
            path.display()
        );
        Ok(())
    }

    /// Validates ordering. `path` only labels errors.
    pub fn to_trajectory(&self, path: &Path) -> Result<Trajectory> {
        let mut trajectory = Trajectory::with_capacity(self.samples.len());
        for sample in &self.samples {
            trajectory
                .push(TrajectorySample::new(
                    sample.time,
                    rows_to_matrix(&sample.transform),
                ))
                .map_err(|e| MocapError::malformed(path, e.to_string()))?;
        }
        Ok(trajectory)
    }
}
