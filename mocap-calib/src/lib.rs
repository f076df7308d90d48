pub mod calibration;
pub mod trajectory_extractor;

pub use calibration::{average_stationary_pose, CalibrationCfg, Calibrator};
pub use trajectory_extractor::{ExtractorCfg, TrajectoryExtractor};
