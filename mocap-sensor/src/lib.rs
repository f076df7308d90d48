pub mod calibration;
pub mod capture;
pub mod mocap_system;
pub mod rigid_body;

pub use calibration::{CalibrationParams, TcpPose, DEFAULT_MARKER_FRAME_YPR};
pub use capture::{Capture, CaptureMetadata};
pub use mocap_system::MocapSystem;
pub use rigid_body::{BodyTrack, FrameRecord, LengthUnit, RigidBodySample};
