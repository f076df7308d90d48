use std::num::NonZeroUsize;

use mocap_core::{
    trajectory::{Trajectory, TrajectorySample},
    Dataset, HomogeneousTransform, MocapError, Result,
};
use mocap_sensor::{BodyTrack, Capture, MocapSystem};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractorCfg {
    body_name: String,
    // keep every rate-th sample
    rate: usize,
}

impl Default for ExtractorCfg {
    fn default() -> Self {
        Self {
            body_name: String::from("Tool"),
            rate: 12,
        }
    }
}

impl ExtractorCfg {
    pub fn new(body_name: impl Into<String>, rate: usize) -> Self {
        Self {
            body_name: body_name.into(),
            rate,
        }
    }

    pub fn finalize(self, mocap_to_world: HomogeneousTransform) -> Result<TrajectoryExtractor> {
        let rate = NonZeroUsize::new(self.rate).ok_or(MocapError::InvalidRate(self.rate))?;
        log::debug!("extracting '{}' every {rate} samples", self.body_name);
        Ok(TrajectoryExtractor {
            body_name: self.body_name,
            rate,
            system: MocapSystem::new(mocap_to_world),
        })
    }
}

pub struct TrajectoryExtractor {
    body_name: String,
    rate: NonZeroUsize,
    system: MocapSystem,
}

impl TrajectoryExtractor {
    pub fn body_name(&self) -> &str {
        &self.body_name
    }

    pub fn rate(&self) -> usize {
        self.rate.get()
    }

    pub fn extract(&self, capture: &Capture) -> Result<Trajectory> {
        self.extract_track(capture.body(&self.body_name)?)
    }

    /// Keeps every `rate`-th sample, original timestamps untouched, each pose
    /// mapped into world coordinates.
    pub fn extract_track(&self, track: &BodyTrack) -> Result<Trajectory> {
        let scale = track.millimeter_scale();
        let mut trajectory = Trajectory::with_capacity(track.len().div_ceil(self.rate.get()));
        for sample in track.iter().step_by(self.rate.get()) {
            let transform = self.system.sample_to_world(&sample, scale);
            trajectory.push(TrajectorySample::new(sample.time, transform))?;
        }
        log::info!(
            "'{}': kept {} of {} samples",
            self.body_name,
            trajectory.len(),
            track.len()
        );
        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mocap_core::{
        geometry::{pos_quat_to_transform, translation_of},
        Real,
    };
    use mocap_sensor::{CaptureMetadata, LengthUnit, RigidBodySample};
    use sophus::nalgebra::{UnitQuaternion, Vector3};

    fn moving_track(n: usize, unit: LengthUnit) -> BodyTrack {
        let mut track = BodyTrack::new("Tool", unit);
        for i in 0..n {
            track
                .push(RigidBodySample {
                    time: i as Real / 120.0,
                    position: Vector3::new(i as Real, 0.0, 0.0),
                    orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, i as Real * 0.01),
                })
                .unwrap();
        }
        track
    }

    #[test]
    fn test_subsampling_preserves_source_timestamps() {
        let track = moving_track(120, LengthUnit::Millimeters);
        let extractor = ExtractorCfg::default()
            .finalize(HomogeneousTransform::identity())
            .unwrap();
        let trajectory = extractor.extract_track(&track).unwrap();

        assert_eq!(trajectory.len(), 10);
        for (k, sample) in trajectory.samples().iter().enumerate() {
            assert_eq!(sample.time, track.samples()[k * 12].time);
        }
    }

    #[test]
    fn test_output_length_rounds_up() {
        let extractor = ExtractorCfg::new("Tool", 12)
            .finalize(HomogeneousTransform::identity())
            .unwrap();
        for (n, expected) in [(0, 0), (1, 1), (12, 1), (13, 2), (121, 11)] {
            let trajectory = extractor
                .extract_track(&moving_track(n, LengthUnit::Millimeters))
                .unwrap();
            assert_eq!(trajectory.len(), expected, "input length {n}");
        }
    }

    #[test]
    fn test_samples_are_mapped_to_world() {
        let mocap_to_world =
            pos_quat_to_transform(&Vector3::new(10.0, 20.0, 30.0), [0.0, 0.0, 0.0, 1.0]).unwrap();
        let track = moving_track(30, LengthUnit::Meters);
        let trajectory = ExtractorCfg::new("Tool", 5)
            .finalize(mocap_to_world)
            .unwrap()
            .extract_track(&track)
            .unwrap();

        let sample = &trajectory.samples()[2];
        let source = &track.samples()[10];
        let expected = mocap_to_world * source.frame_record(1000.0).to_transform();
        assert_relative_eq!(sample.transform, expected, epsilon = 1e-9);
        // half turn about z flips x and y
        assert_relative_eq!(
            translation_of(&sample.transform),
            Vector3::new(10.0 - 10_000.0, 20.0, 30.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_rate_and_missing_body() {
        assert!(matches!(
            ExtractorCfg::new("Tool", 0).finalize(HomogeneousTransform::identity()),
            Err(MocapError::InvalidRate(0))
        ));

        let mut capture = Capture::new(CaptureMetadata::default());
        capture.insert(moving_track(3, LengthUnit::Millimeters));
        let extractor = ExtractorCfg::new("Wand", 1)
            .finalize(HomogeneousTransform::identity())
            .unwrap();
        assert!(matches!(extractor.extract(&capture), Err(MocapError::MissingBody { .. })));
        assert_eq!(extractor.body_name(), "Wand");
        assert_eq!(extractor.rate(), 1);
    }
}
