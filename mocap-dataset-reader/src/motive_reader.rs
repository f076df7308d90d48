//! Reader for Motive-style CSV exports.
//!
//! ```text
//! Format Version,1.23,Take Name,take_01,...,Rotation Type,Quaternion,Length Units,Millimeters
//! (blank)
//! ,Type,Rigid Body,Rigid Body,Rigid Body,Rigid Body,Rigid Body,Rigid Body,Rigid Body,...
//! ,Name,Robot,Robot,Robot,Robot,Robot,Robot,Robot,...
//! ,ID,1,1,1,1,1,1,1,...
//! ,,Rotation,Rotation,Rotation,Rotation,Position,Position,Position,...
//! Frame,Time (Seconds),X,Y,Z,W,X,Y,Z,...
//! 0,0.000000,0.0,0.0,0.0,1.0,120.5,33.1,900.2,...
//! ```
//!
//! The `Type`, `Name` and `ID` labels are also accepted in the first column.
//! Rotations are stored scalar-last and converted to scalar-first here.

use std::{
    collections::BTreeMap,
    io::Read,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord};
use mocap_core::{
    geometry::{quaternion_axis_order_convert, unit_quaternion, QuaternionOrder},
    MocapError, Real, Result,
};
use mocap_sensor::{BodyTrack, Capture, CaptureMetadata, LengthUnit, RigidBodySample};
use sophus::nalgebra::Vector3;

const RIGID_BODY_TYPE: &str = "Rigid Body";

pub struct MotiveReader {
    capture_path: PathBuf,
}

impl MotiveReader {
    pub fn new(capture_path: impl AsRef<Path>) -> Self {
        MotiveReader {
            capture_path: capture_path.as_ref().to_path_buf(),
        }
    }

    pub fn load_capture(&self) -> Result<Capture> {
        let file = std::fs::File::open(&self.capture_path)
            .map_err(|e| MocapError::io(&self.capture_path, e))?;
        let capture = parse_capture(std::io::BufReader::new(file), &self.capture_path)?;
        log::info!(
            "loaded {} with rigid bodies {:?}",
            self.capture_path.display(),
            capture.body_names()
        );
        Ok(capture)
    }
}

#[derive(Debug, Default)]
struct BodyColumns {
    // x, y, z, w as exported
    rotation: [Option<usize>; 4],
    position: [Option<usize>; 3],
}

impl BodyColumns {
    fn complete(&self) -> Option<([usize; 4], [usize; 3])> {
        let [rx, ry, rz, rw] = self.rotation;
        let [px, py, pz] = self.position;
        Some(([rx?, ry?, rz?, rw?], [px?, py?, pz?]))
    }
}

#[derive(Default)]
struct HeaderRows {
    types: Option<StringRecord>,
    names: Option<StringRecord>,
    properties: Option<StringRecord>,
}

fn cell(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or("")
}

// Motive writes the label in the second column and leaves the first empty.
fn header_label(record: &StringRecord) -> &str {
    match cell(record, 0) {
        "" => cell(record, 1),
        label => label,
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn parse_metadata(record: &StringRecord, source: &Path) -> Result<CaptureMetadata> {
    let mut metadata = CaptureMetadata::default();
    let fields: Vec<&str> = record.iter().map(str::trim).collect();
    for pair in fields.chunks(2) {
        if let [key, value] = pair {
            metadata.raw.insert(key.to_string(), value.to_string());
        }
    }

    if let Some(rotation_type) = metadata.raw.get("Rotation Type") {
        if rotation_type != "Quaternion" {
            return Err(MocapError::malformed(
                source,
                format!("unsupported rotation type '{rotation_type}', expected Quaternion"),
            ));
        }
    }

    metadata.length_unit = match metadata.raw.get("Length Units").map(String::as_str) {
        None | Some("Millimeters") => LengthUnit::Millimeters,
        Some("Meters") => LengthUnit::Meters,
        Some(other) => {
            return Err(MocapError::malformed(
                source,
                format!("unsupported length unit '{other}'"),
            ))
        }
    };
    metadata.take_name = metadata.raw.get("Take Name").cloned();
    metadata.export_frame_rate = metadata
        .raw
        .get("Export Frame Rate")
        .and_then(|rate| rate.parse().ok());

    Ok(metadata)
}

fn map_body_columns(
    headers: &HeaderRows,
    axes: &StringRecord,
    source: &Path,
) -> Result<BTreeMap<String, [usize; 7]>> {
    let (Some(types), Some(names), Some(properties)) =
        (&headers.types, &headers.names, &headers.properties)
    else {
        return Err(MocapError::malformed(
            source,
            "missing Type, Name or property header row",
        ));
    };

    let mut columns: BTreeMap<String, BodyColumns> = BTreeMap::new();
    for index in 2..axes.len() {
        if cell(types, index) != RIGID_BODY_TYPE {
            continue;
        }
        let name = cell(names, index);
        let body = columns.entry(name.to_string()).or_default();
        match (cell(properties, index), cell(axes, index)) {
            ("Rotation", "X") => body.rotation[0] = Some(index),
            ("Rotation", "Y") => body.rotation[1] = Some(index),
            ("Rotation", "Z") => body.rotation[2] = Some(index),
            ("Rotation", "W") => body.rotation[3] = Some(index),
            ("Position", "X") => body.position[0] = Some(index),
            ("Position", "Y") => body.position[1] = Some(index),
            ("Position", "Z") => body.position[2] = Some(index),
            _ => {}
        }
    }

    columns
        .into_iter()
        .map(|(name, body)| match body.complete() {
            Some((rotation, position)) => Ok((
                name,
                [
                    rotation[0], rotation[1], rotation[2], rotation[3], position[0],
                    position[1], position[2],
                ],
            )),
            None => Err(MocapError::malformed(
                source,
                format!("rigid body '{name}' lacks quaternion rotation or position columns"),
            )),
        })
        .collect()
}

fn parse_number(value: &str, what: &str, line: u64, source: &Path) -> Result<Real> {
    value.parse::<Real>().map_err(|e| {
        MocapError::malformed(source, format!("line {line}: invalid {what} '{value}': {e}"))
    })
}

/// Parses a complete capture from any reader. `source` only labels errors.
pub fn parse_capture<R: Read>(reader: R, source: &Path) -> Result<Capture> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let mut next_record = || -> Result<Option<StringRecord>> {
        for record in records.by_ref() {
            let record = record.map_err(|e| MocapError::malformed(source, e.to_string()))?;
            if !is_blank(&record) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    };

    let first = next_record()?.ok_or_else(|| MocapError::malformed(source, "empty file"))?;
    let (metadata, mut pending) = if cell(&first, 0) == "Format Version" {
        (parse_metadata(&first, source)?, None)
    } else {
        log::warn!("{}: no metadata row, assuming millimetres", source.display());
        (CaptureMetadata::default(), Some(first))
    };

    let mut headers = HeaderRows::default();
    let axes = loop {
        let record = match pending.take() {
            Some(record) => record,
            None => next_record()?
                .ok_or_else(|| MocapError::malformed(source, "missing Frame header row"))?,
        };
        let kind = header_label(&record).to_string();
        match kind.as_str() {
            "Type" => headers.types = Some(record),
            "Name" => headers.names = Some(record),
            "ID" => {}
            "Frame" => break record,
            "" => headers.properties = Some(record),
            other => {
                return Err(MocapError::malformed(
                    source,
                    format!("unexpected header row '{other}'"),
                ))
            }
        }
    };

    let body_columns = map_body_columns(&headers, &axes, source)?;
    let unit = metadata.length_unit;
    let mut tracks: BTreeMap<&str, (BodyTrack, usize)> = body_columns
        .keys()
        .map(|name| (name.as_str(), (BodyTrack::new(name.clone(), unit), 0)))
        .collect();

    while let Some(record) = next_record()? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let time = parse_number(cell(&record, 1), "time", line, source)?;

        for (name, columns) in &body_columns {
            let Some((track, untracked)) = tracks.get_mut(name.as_str()) else {
                continue;
            };
            let cells: Vec<&str> = columns.iter().map(|c| cell(&record, *c)).collect();
            if cells.iter().any(|c| c.is_empty()) {
                *untracked += 1;
                continue;
            }

            let mut values = [0.0; 7];
            for (value, text) in values.iter_mut().zip(&cells) {
                *value = parse_number(text, "value", line, source)?;
            }
            let quaternion = quaternion_axis_order_convert(
                [values[0], values[1], values[2], values[3]],
                QuaternionOrder::ScalarLast,
                QuaternionOrder::ScalarFirst,
            );
            let orientation = unit_quaternion(quaternion).map_err(|e| {
                MocapError::malformed(source, format!("line {line}: body '{name}': {e}"))
            })?;

            track
                .push(RigidBodySample {
                    time,
                    position: Vector3::new(values[4], values[5], values[6]),
                    orientation,
                })
                .map_err(|e| {
                    MocapError::malformed(source, format!("line {line}: body '{name}': {e}"))
                })?;
        }
    }

    let mut capture = Capture::new(metadata);
    for (name, (track, untracked)) in tracks {
        if untracked > 0 {
            log::debug!("{name}: skipped {untracked} untracked frames");
        }
        log::debug!("{name}: {} samples", track.samples().len());
        capture.insert(track);
    }
    Ok(capture)
}
