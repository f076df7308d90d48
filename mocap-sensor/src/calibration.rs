use std::f64::consts::FRAC_1_SQRT_2;

use mocap_core::{geometry, HomogeneousTransform, Real, Result};
use serde::{Deserialize, Serialize};
use sophus::nalgebra::Vector3;

/// Assumed world-frame pose of the robot tool-center-point during calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TcpPose {
    // millimetres
    pub pos: [Real; 3],
    // [w, x, y, z]
    pub quat: [Real; 4],
}

impl Default for TcpPose {
    fn default() -> Self {
        TcpPose {
            pos: [1000.0, 1000.0, 2000.0],
            quat: [FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2],
        }
    }
}

impl TcpPose {
    pub fn to_transform(&self) -> Result<HomogeneousTransform> {
        geometry::pos_quat_to_transform(&Vector3::from(self.pos), self.quat)
    }
}

/// Yaw, pitch, roll in degrees between the marker mounting and the nominal
/// marker frame.
pub const DEFAULT_MARKER_FRAME_YPR: [Real; 3] = [180.0, 0.0, 90.0];

/// Everything a calibration run derives, together with the inputs it used.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationParams {
    pub calibration_tcp: TcpPose,
    pub marker_frame_ypr: [Real; 3],
    pub mocap_to_world: HomogeneousTransform,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_tcp_transform() {
        let t = TcpPose::default().to_transform().unwrap();
        assert_relative_eq!(
            t,
            geometry::compose_transform(
                &geometry::rotation_of(&geometry::yaw_pitch_roll(90.0, 0.0, 0.0)),
                &Vector3::new(1000.0, 1000.0, 2000.0),
            ),
            epsilon = 1e-12
        );
    }
}
