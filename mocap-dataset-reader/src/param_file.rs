use std::{
    path::{Path, PathBuf},
};

use mocap_core::{geometry, HomogeneousTransform, MocapError, Real, Result};
use mocap_sensor::{CalibrationParams, TcpPose};
use serde::{Deserialize, Serialize};

use crate::atomic_write::{backup_existing, write_atomically};

/// Tolerance for accepting a stored `mocap_to_world` as a rigid transform.
const RIGID_TOLERANCE: Real = 1e-4;

pub type MatrixRows = [[Real; 4]; 4];

pub fn matrix_to_rows(matrix: &HomogeneousTransform) -> MatrixRows {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = matrix[(r, c)];
        }
    }
    rows
}

pub fn rows_to_matrix(rows: &MatrixRows) -> HomogeneousTransform {
    HomogeneousTransform::from_fn(|r, c| rows[r][c])
}

/// On-disk layout of the calibration parameter file. Every key is optional
/// when reading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mocap_to_world: Option<MatrixRows>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_tcp: Option<TcpPose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_frame_ypr: Option<[Real; 3]>,
}

impl From<&CalibrationParams> for ParamFile {
    fn from(params: &CalibrationParams) -> Self {
        ParamFile {
            mocap_to_world: Some(matrix_to_rows(&params.mocap_to_world)),
            calibration_tcp: Some(params.calibration_tcp),
            marker_frame_ypr: Some(params.marker_frame_ypr),
        }
    }
}

impl ParamFile {
    /// Reads `path`, returning `None` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<ParamFile>> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MocapError::io(path, e)),
        };
        let file: ParamFile = serde_json::from_str(&data)
            .map_err(|e| MocapError::malformed(path, format!("invalid parameter JSON: {e}")))?;

        if let Some(rows) = &file.mocap_to_world {
            if !geometry::is_rigid_transform(&rows_to_matrix(rows), RIGID_TOLERANCE) {
                return Err(MocapError::malformed(
                    path,
                    "mocap_to_world is not a rigid transform",
                ));
            }
        }
        log::debug!("loaded parameters from {}: {file:?}", path.display());
        Ok(Some(file))
    }

    pub fn mocap_to_world(&self) -> Option<HomogeneousTransform> {
        self.mocap_to_world.as_ref().map(rows_to_matrix)
    }

    pub fn require_mocap_to_world(&self) -> Result<HomogeneousTransform> {
        self.mocap_to_world()
            .ok_or_else(|| MocapError::MissingParameter("mocap_to_world".to_string()))
    }

    /// Renames any existing file at `path`, then writes this one atomically.
    /// Returns the backup location, if a previous file was moved.
    pub fn save(&self, path: &Path) -> Result<Option<PathBuf>> {
        let backup = backup_existing(path)?;
        write_atomically(path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, self)?;
            writer.write_all(b"\n")
        })?;
        log::info!("wrote parameters to {}", path.display());
        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mocap_core::geometry::{pos_quat_to_transform, yaw_pitch_roll};
    use sophus::nalgebra::Vector3;

    fn params() -> CalibrationParams {
        let tcp = TcpPose::default();
        CalibrationParams {
            calibration_tcp: tcp,
            marker_frame_ypr: [180.0, 0.0, 90.0],
            mocap_to_world: pos_quat_to_transform(&Vector3::new(1.0, 2.0, 3.0), tcp.quat).unwrap()
                * yaw_pitch_roll(10.0, 20.0, 30.0),
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ParamFile::load(&dir.path().join("params.json")).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let params = params();

        assert!(ParamFile::from(&params).save(&path).unwrap().is_none());
        let loaded = ParamFile::load(&path).unwrap().unwrap();
        assert_eq!(loaded.require_mocap_to_world().unwrap(), params.mocap_to_world);
        assert_eq!(loaded.calibration_tcp, Some(params.calibration_tcp));
        assert_eq!(loaded.marker_frame_ypr, Some([180.0, 0.0, 90.0]));

        let backup = ParamFile::default().save(&path).unwrap().unwrap();
        assert!(backup.exists());
        assert_eq!(ParamFile::load(&backup).unwrap().unwrap(), loaded);
    }

    #[test]
    fn test_partial_file_keys_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"marker_frame_ypr": [0, 0, 0]}"#).unwrap();

        let loaded = ParamFile::load(&path).unwrap().unwrap();
        assert_eq!(loaded.marker_frame_ypr, Some([0.0, 0.0, 0.0]));
        assert!(loaded.calibration_tcp.is_none());
        assert!(matches!(
            loaded.require_mocap_to_world(),
            Err(MocapError::MissingParameter(name)) if name == "mocap_to_world"
        ));
    }

    #[test]
    fn test_rejects_invalid_json_and_non_rigid_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ParamFile::load(&path), Err(MocapError::MalformedFile { .. })));

        std::fs::write(
            &path,
            r#"{"mocap_to_world": [[2,0,0,0],[0,1,0,0],[0,0,1,0],[0,0,0,1]]}"#,
        )
        .unwrap();
        assert!(matches!(ParamFile::load(&path), Err(MocapError::MalformedFile { .. })));
    }

    #[test]
    fn test_rows_are_row_major() {
        let mut m = HomogeneousTransform::identity();
        m[(0, 3)] = 5.0;
        assert_eq!(matrix_to_rows(&m)[0][3], 5.0);
        assert_eq!(rows_to_matrix(&matrix_to_rows(&m)), m);
    }
}
