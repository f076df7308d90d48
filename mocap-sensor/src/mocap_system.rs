use mocap_core::{HomogeneousTransform, Real};

use crate::rigid_body::{FrameRecord, RigidBodySample};

#[derive(Clone, Debug)]
pub struct MocapSystem {
    // mocap to world transform (constant once calibrated)
    mocap_to_world: HomogeneousTransform,
}

impl MocapSystem {
    pub fn new(mocap_to_world: HomogeneousTransform) -> Self {
        Self { mocap_to_world }
    }

    pub fn frame_to_world(&self, record: &FrameRecord) -> HomogeneousTransform {
        self.mocap_to_world * record.to_transform()
    }

    pub fn sample_to_world(
        &self,
        sample: &RigidBodySample,
        millimeter_scale: Real,
    ) -> HomogeneousTransform {
        self.frame_to_world(&sample.frame_record(millimeter_scale))
    }
}
