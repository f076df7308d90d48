use std::cmp::Ordering;

use mocap_core::{
    Dataset, HomogeneousTransform, MocapError, PointCoordinates, Real, Result,
    MILLIMETERS_PER_METER,
};
use serde::{Deserialize, Serialize};
use sophus::nalgebra::{Matrix3, UnitQuaternion};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    Millimeters,
    Meters,
}

impl LengthUnit {
    /// Factor converting a length in this unit to millimetres.
    pub fn millimeter_scale(self) -> Real {
        match self {
            LengthUnit::Millimeters => 1.0,
            LengthUnit::Meters => MILLIMETERS_PER_METER,
        }
    }
}

/// One recorded pose of a tracked rigid body, in mocap coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBodySample {
    pub time: Real,
    // in the capture's length unit
    pub position: PointCoordinates,
    pub orientation: UnitQuaternion<Real>,
}

impl RigidBodySample {
    pub fn frame_record(&self, millimeter_scale: Real) -> FrameRecord {
        let axes = self.orientation.to_rotation_matrix().into_inner();
        FrameRecord {
            time: self.time,
            origin: self.position * millimeter_scale,
            x_axis: axes.column(0).into_owned(),
            y_axis: axes.column(1).into_owned(),
            z_axis: axes.column(2).into_owned(),
        }
    }
}

/// Origin plus orthonormal axis vectors of a body frame, origin in millimetres.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    pub time: Real,
    pub origin: PointCoordinates,
    pub x_axis: PointCoordinates,
    pub y_axis: PointCoordinates,
    pub z_axis: PointCoordinates,
}

impl FrameRecord {
    pub fn to_transform(&self) -> HomogeneousTransform {
        let rotation = Matrix3::from_columns(&[self.x_axis, self.y_axis, self.z_axis]);
        mocap_core::geometry::compose_transform(&rotation, &self.origin)
    }
}

/// All tracked samples of one named rigid body, ordered by time.
#[derive(Clone, Debug)]
pub struct BodyTrack {
    pub name: String,
    pub unit: LengthUnit,
    samples: Vec<RigidBodySample>,
}

impl BodyTrack {
    pub fn new(name: impl Into<String>, unit: LengthUnit) -> Self {
        Self {
            name: name.into(),
            unit,
            samples: vec![],
        }
    }

    pub fn push(&mut self, sample: RigidBodySample) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if sample.time.partial_cmp(&last.time) != Some(Ordering::Greater) {
                return Err(MocapError::NonMonotonicTime {
                    previous: last.time,
                    next: sample.time,
                });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn samples(&self) -> &[RigidBodySample] {
        &self.samples
    }

    pub fn millimeter_scale(&self) -> Real {
        self.unit.millimeter_scale()
    }
}

impl Dataset<RigidBodySample> for BodyTrack {
    fn get(&self, index: usize) -> Option<RigidBodySample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mocap_core::geometry::{pos_quat_to_transform, quaternion_components};
    use sophus::nalgebra::Vector3;

    fn sample(time: Real) -> RigidBodySample {
        RigidBodySample {
            time,
            position: Vector3::new(0.1, 0.2, 0.3),
            orientation: mocap_core::geometry::unit_quaternion([0.9, 0.1, -0.3, 0.2]).unwrap(),
        }
    }

    #[test]
    fn test_frame_record_matches_pos_quat_transform() {
        let s = sample(0.0);
        let record = s.frame_record(LengthUnit::Meters.millimeter_scale());
        assert_relative_eq!(record.origin, Vector3::new(100.0, 200.0, 300.0), epsilon = 1e-9);

        let expected = pos_quat_to_transform(
            &(s.position * 1000.0),
            quaternion_components(&s.orientation),
        )
        .unwrap();
        assert_relative_eq!(record.to_transform(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_record_axes_are_orthonormal() {
        let record = sample(0.0).frame_record(1.0);
        assert_relative_eq!(record.x_axis.cross(&record.y_axis), record.z_axis, epsilon = 1e-12);
        assert_relative_eq!(record.x_axis.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_track_requires_increasing_time() {
        let mut track = BodyTrack::new("Tool", LengthUnit::Millimeters);
        track.push(sample(0.0)).unwrap();
        track.push(sample(0.5)).unwrap();
        assert!(track.push(sample(0.5)).is_err());
        assert_eq!(track.len(), 2);
        assert_eq!(track.iter().map(|s| s.time).collect::<Vec<_>>(), vec![0.0, 0.5]);
    }
}
