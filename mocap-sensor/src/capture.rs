use std::collections::BTreeMap;

use mocap_core::{MocapError, Real, Result};

use crate::rigid_body::{BodyTrack, LengthUnit};

#[derive(Clone, Debug, Default)]
pub struct CaptureMetadata {
    pub take_name: Option<String>,
    pub export_frame_rate: Option<Real>,
    pub length_unit: LengthUnit,
    // every key/value pair of the metadata row, as exported
    pub raw: BTreeMap<String, String>,
}

/// A motion-capture recording: metadata plus the tracks of its rigid bodies.
#[derive(Clone, Debug, Default)]
pub struct Capture {
    pub metadata: CaptureMetadata,
    bodies: BTreeMap<String, BodyTrack>,
}

impl Capture {
    pub fn new(metadata: CaptureMetadata) -> Self {
        Self {
            metadata,
            bodies: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, track: BodyTrack) {
        self.bodies.insert(track.name.clone(), track);
    }

    pub fn body_names(&self) -> Vec<String> {
        self.bodies.keys().cloned().collect()
    }

    pub fn body(&self, name: &str) -> Result<&BodyTrack> {
        self.bodies.get(name).ok_or_else(|| MocapError::MissingBody {
            name: name.to_string(),
            available: self.body_names(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_body_lists_available() {
        let mut capture = Capture::new(CaptureMetadata::default());
        capture.insert(BodyTrack::new("Robot", LengthUnit::Millimeters));
        capture.insert(BodyTrack::new("Tool", LengthUnit::Millimeters));

        assert!(capture.body("Tool").is_ok());
        match capture.body("Wand").unwrap_err() {
            MocapError::MissingBody { name, available } => {
                assert_eq!(name, "Wand");
                assert_eq!(available, vec!["Robot".to_string(), "Tool".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
