use mocap_core::{
    geometry::{invert_transform, pos_quat_to_transform, unit_quaternion, yaw_pitch_roll},
    Dataset, HomogeneousTransform, MocapError, Real, Result,
};
use mocap_sensor::{BodyTrack, CalibrationParams, Capture, TcpPose, DEFAULT_MARKER_FRAME_YPR};
use serde::Deserialize;
use sophus::nalgebra::Vector3;

/// Angular spread (degrees) past which a quaternion mean is reported as unreliable.
const MAXIMUM_STATIONARY_SPREAD_DEG: Real = 5.0;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    body_name: String,
    calibration_tcp: Option<TcpPose>,
    marker_frame_ypr: Option<[Real; 3]>,
    // fail instead of substituting defaults for missing inputs
    strict: bool,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            body_name: String::from("Robot"),
            calibration_tcp: None,
            marker_frame_ypr: None,
            strict: false,
        }
    }
}

impl CalibrationCfg {
    pub fn new(body_name: impl Into<String>) -> Self {
        Self {
            body_name: body_name.into(),
            ..Self::default()
        }
    }

    pub fn calibration_tcp(mut self, tcp: Option<TcpPose>) -> Self {
        self.calibration_tcp = tcp;
        self
    }

    pub fn marker_frame_ypr(mut self, ypr: Option<[Real; 3]>) -> Self {
        self.marker_frame_ypr = ypr;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn finalize(self) -> Result<Calibrator> {
        let calibration_tcp = match self.calibration_tcp {
            Some(tcp) => tcp,
            None if self.strict => {
                return Err(MocapError::MissingParameter("calibration_tcp".to_string()))
            }
            None => {
                let tcp = TcpPose::default();
                log::warn!("calibration_tcp not provided, assuming default {tcp:?}");
                tcp
            }
        };

        let marker_frame_ypr = match self.marker_frame_ypr {
            Some(ypr) => ypr,
            None if self.strict => {
                return Err(MocapError::MissingParameter("marker_frame_ypr".to_string()))
            }
            None => {
                log::warn!(
                    "marker_frame_ypr not provided, assuming default {DEFAULT_MARKER_FRAME_YPR:?}"
                );
                DEFAULT_MARKER_FRAME_YPR
            }
        };

        let robot_tcp = calibration_tcp.to_transform()?;
        let [yaw, pitch, roll] = marker_frame_ypr;
        let marker_frame_rotation = yaw_pitch_roll(yaw, pitch, roll);
        log::debug!("robot_tcp: {robot_tcp}");
        log::debug!("marker_frame_rotation: {marker_frame_rotation}");

        Ok(Calibrator {
            body_name: self.body_name,
            calibration_tcp,
            marker_frame_ypr,
            robot_marker_frame: robot_tcp * marker_frame_rotation,
        })
    }
}

pub struct Calibrator {
    body_name: String,
    calibration_tcp: TcpPose,
    marker_frame_ypr: [Real; 3],

    // world to physical marker frame
    robot_marker_frame: HomogeneousTransform,
}

impl Calibrator {
    pub fn body_name(&self) -> &str {
        &self.body_name
    }

    pub fn calibrate(&self, capture: &Capture) -> Result<CalibrationParams> {
        let track = capture.body(&self.body_name)?;
        let robot_mc = average_stationary_pose(track)?;
        log::info!(
            "averaged {} samples of '{}': {robot_mc}",
            track.len(),
            self.body_name
        );
        Ok(self.derive(&robot_mc))
    }

    /// Derives the parameters from the marker body's pose in mocap coordinates.
    pub fn derive(&self, robot_mc: &HomogeneousTransform) -> CalibrationParams {
        // physical marker frame to mocap coordinates
        let robot_mc_inv = invert_transform(robot_mc);
        let mocap_to_world = self.robot_marker_frame * robot_mc_inv;
        log::info!("mocap_to_world: {mocap_to_world}");

        CalibrationParams {
            calibration_tcp: self.calibration_tcp,
            marker_frame_ypr: self.marker_frame_ypr,
            mocap_to_world,
        }
    }
}

/// Mean pose of a body that did not move during the capture, in millimetres.
///
/// Quaternions are averaged component-wise and re-normalized. This is only a
/// valid rotation mean for small angular spread; samples are first flipped
/// into the hemisphere of the first sample so `q` and `-q` do not cancel.
pub fn average_stationary_pose(track: &BodyTrack) -> Result<HomogeneousTransform> {
    let samples = track.samples();
    let Some(reference) = samples.first() else {
        return Err(MocapError::EmptyTrack(track.name.clone()));
    };

    let mut position_sum = Vector3::zeros();
    let mut quaternion_sum = [0.0; 4];
    for sample in samples {
        position_sum += sample.position;
        let q = sample.orientation.quaternion();
        let sign = if q.dot(reference.orientation.quaternion()) < 0.0 {
            -1.0
        } else {
            1.0
        };
        for (sum, component) in quaternion_sum.iter_mut().zip([q.w, q.i, q.j, q.k]) {
            *sum += sign * component;
        }
    }

    let count = samples.len() as Real;
    let position = position_sum / count * track.millimeter_scale();
    let quaternion = quaternion_sum.map(|c| c / count);

    let mean = unit_quaternion(quaternion)?;
    let spread = samples
        .iter()
        .map(|s| s.orientation.angle_to(&mean).to_degrees())
        .fold(0.0, Real::max);
    if spread > MAXIMUM_STATIONARY_SPREAD_DEG {
        log::warn!(
            "'{}' rotated up to {spread:.2} deg while stationary, mean is unreliable",
            track.name
        );
    }

    pos_quat_to_transform(&position, quaternion)
}
